use std::collections::BTreeMap;

use clap::Parser;
use formscope::cli::commands::{cmd_fill, parse_values, value_for};
use formscope::cli::config::{Cli, Commands, load_config, parse_config};
use formscope::config::EngineConfig;
use formscope::field::field_model::FieldValue;

use crate::common::page::{by_id, detect_all, field_for, fixture, fixture_path};

mod common;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_detect_minimal() {
    let cli = Cli::parse_from(["formscope", "detect", "--html", "page.html"]);
    assert_eq!(cli.verbose, 0);
    assert!(cli.config.is_none());
    match cli.command {
        Commands::Detect {
            html,
            container,
            test_mode,
            format,
        } => {
            assert_eq!(html, "page.html");
            assert!(container.is_none());
            assert!(!test_mode);
            assert_eq!(format, "console");
        }
        _ => panic!("Expected Detect command"),
    }
}

#[test]
fn cli_parse_detect_all_args() {
    let cli = Cli::parse_from([
        "formscope",
        "detect",
        "--html",
        "page.html",
        "--container",
        "#checkout",
        "--test-mode",
        "--format",
        "json",
        "--config",
        "site.yaml",
    ]);
    assert_eq!(cli.config.as_deref(), Some("site.yaml"));
    match cli.command {
        Commands::Detect {
            container,
            test_mode,
            format,
            ..
        } => {
            assert_eq!(container.as_deref(), Some("#checkout"));
            assert!(test_mode);
            assert_eq!(format, "json");
        }
        _ => panic!("Expected Detect command"),
    }
}

#[test]
fn cli_parse_fill_with_output() {
    let cli = Cli::parse_from([
        "formscope",
        "-vv",
        "fill",
        "--html",
        "page.html",
        "--values",
        "values.yaml",
        "--trace",
        "trace.jsonl",
        "-o",
        "filled.html",
    ]);
    assert_eq!(cli.verbose, 2);
    match cli.command {
        Commands::Fill {
            html,
            values,
            trace,
            output,
        } => {
            assert_eq!(html, "page.html");
            assert_eq!(values, "values.yaml");
            assert_eq!(trace.as_deref(), Some("trace.jsonl"));
            assert_eq!(output.as_deref(), Some("filled.html"));
        }
        _ => panic!("Expected Fill command"),
    }
}

#[test]
fn cli_fill_requires_values() {
    let result = Cli::try_parse_from(["formscope", "fill", "--html", "page.html"]);
    assert!(result.is_err());
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
fn load_config_missing_file_returns_defaults() {
    let config = load_config(Some("/nonexistent/formscope.yaml"));
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn load_config_malformed_file_returns_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("formscope.yaml");
    std::fs::write(&path, "injection: [not, a, map").unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn load_config_partial_file_overrides_only_named_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("formscope.yaml");
    std::fs::write(
        &path,
        "injection:\n  verify_timeout_ms: 500\ndiscovery:\n  extra_selectors:\n    - \".picker\"\n",
    )
    .unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.injection.verify_timeout_ms, 500);
    assert_eq!(config.injection.verify_interval_ms, 20);
    assert_eq!(config.discovery.extra_selectors, vec![".picker".to_string()]);
    assert_eq!(config.discovery.fallback_min_results, 3);
    assert!(config.grouping.proximity_grouping);
}

#[test]
fn parse_config_empty_is_default() {
    assert_eq!(parse_config("  \n").unwrap(), EngineConfig::default());
    assert!(parse_config("container: 7").is_err());
}

// ============================================================================
// Values File Tests
// ============================================================================

#[test]
fn values_parse_into_typed_entries() {
    let values = parse_values(
        "first_name: Ada\nnewsletter: true\nterms: [tos, privacy]\nseats: 42\n",
    )
    .unwrap();
    assert_eq!(values["first_name"], FieldValue::text("Ada"));
    assert_eq!(values["newsletter"], FieldValue::Bool(true));
    assert_eq!(
        values["terms"],
        FieldValue::List(vec!["tos".to_string(), "privacy".to_string()])
    );
    assert_eq!(values["seats"], FieldValue::Number(42.0));
}

#[test]
fn values_accept_json() {
    let values = parse_values(r#"{"email": "ada@lovelace.org", "gender": "female"}"#).unwrap();
    assert_eq!(values.len(), 2);
    assert!(parse_values("").unwrap().is_empty());
}

#[test]
fn value_lookup_by_id_name_group_and_label() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let first = field_for(&fields, by_id(&doc, "first"));
    let gender = field_for(&fields, by_id(&doc, "male"));
    let email = field_for(&fields, by_id(&doc, "email"));
    let phone = field_for(&fields, by_id(&doc, "phone"));

    let mut values = BTreeMap::new();
    values.insert("FIRST NAME".to_string(), FieldValue::text("Ada"));
    values.insert("gender".to_string(), FieldValue::text("female"));
    values.insert(email.id.clone(), FieldValue::text("by-id@example.com"));
    values.insert("Email".to_string(), FieldValue::text("by-label@example.com"));

    assert_eq!(value_for(first, &values), Some(&FieldValue::text("Ada")));
    assert_eq!(value_for(gender, &values), Some(&FieldValue::text("female")));
    assert_eq!(value_for(email, &values), Some(&FieldValue::text("by-id@example.com")));
    assert_eq!(value_for(phone, &values), None);
}

// ============================================================================
// fill end to end
// ============================================================================

#[tokio::test]
async fn fill_writes_values_output_and_trace() {
    let dir = tempfile::tempdir().unwrap();
    let values_path = dir.path().join("values.yaml");
    let output_path = dir.path().join("filled.html");
    let trace_path = dir.path().join("trace.jsonl");
    std::fs::write(
        &values_path,
        "First name: Ada\nemail: ada@lovelace.org\ncountry: Canada\ngender: female\nterms: [privacy]\nnewsletter: true\n",
    )
    .unwrap();

    let mut config = EngineConfig::default();
    config.injection.dropdown_open_delay_ms = 5;
    config.injection.verify_timeout_ms = 60;
    config.injection.verify_interval_ms = 5;

    let html = fixture_path("signup.html");
    let all_applied = cmd_fill(
        html.to_str().unwrap(),
        values_path.to_str().unwrap(),
        trace_path.to_str(),
        output_path.to_str(),
        config,
    )
    .await
    .unwrap();
    assert!(all_applied);

    let filled = std::fs::read_to_string(&output_path).unwrap();
    assert!(filled.contains(r#"value="Ada""#));
    assert!(filled.contains(r#"value="ada@lovelace.org""#));
    assert!(filled.contains(r#"<option value="ca" selected>Canada</option>"#));
    assert!(filled.contains("data-formscope-id="));

    let trace = std::fs::read_to_string(&trace_path).unwrap();
    let lines: Vec<serde_json::Value> = trace
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert!(!lines.is_empty());
    let successes = lines.iter().filter(|l| l["state"] == "Success").count();
    assert_eq!(successes, 6);
}

#[tokio::test]
async fn fill_with_missing_page_is_an_error() {
    let result = cmd_fill(
        "/nonexistent/page.html",
        "/nonexistent/values.yaml",
        None,
        None,
        EngineConfig::default(),
    )
    .await;
    assert!(result.is_err());
}
