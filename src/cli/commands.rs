use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::dom::dom_model::Document;
use crate::dom::html::{parse_html, serialize_children};
use crate::field::field_model::{Field, FieldValue};
use crate::inject::{ApplyOptions, InjectionReport, apply_field};
use crate::report::console::{format_field_table, format_injection_reports};
use crate::trace::logger::TraceLogger;
use crate::{DetectOptions, detect};

// ============================================================================
// detect subcommand
// ============================================================================

pub fn cmd_detect(
    html_path: &str,
    container: Option<&str>,
    test_mode: bool,
    format: &str,
    config: EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = load_page(html_path)?;
    let container = match container {
        Some(selector) => {
            let found = doc.query_selector(doc.root(), selector)?;
            if found.is_none() {
                return Err(format!("no element matches container selector '{}'", selector).into());
            }
            found
        }
        None => None,
    };

    let options = DetectOptions {
        test_mode,
        skip_processed: false,
        config,
    };
    let fields = detect(&mut doc, container, &options);

    let output = match format {
        "json" => serde_json::to_string_pretty(&fields)?,
        _ => format_field_table(&fields),
    };
    println!("{}", output);
    Ok(())
}

// ============================================================================
// fill subcommand
// ============================================================================

/// Detect, apply every matching value, print the reports. Returns whether all succeeded.
pub async fn cmd_fill(
    html_path: &str,
    values_path: &str,
    trace: Option<&str>,
    output: Option<&str>,
    config: EngineConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut doc = load_page(html_path)?;
    let values = load_values(values_path)?;

    let detect_options = DetectOptions {
        config: config.clone(),
        ..DetectOptions::default()
    };
    let fields = detect(&mut doc, None, &detect_options);

    let apply_options = ApplyOptions {
        config,
        trace: trace.map(|path| Arc::new(TraceLogger::new(path))),
        ..ApplyOptions::default()
    };

    let mut reports: Vec<InjectionReport> = Vec::new();
    for field in &fields {
        let Some(value) = value_for(field, &values) else {
            debug!(field = %field.id, label = %field.label, "no value requested");
            continue;
        };
        reports.push(apply_field(&mut doc, field, value, &apply_options).await);
    }
    info!(fields = fields.len(), applied = reports.len(), "fill finished");

    print!("{}", format_injection_reports(&reports));

    if let Some(path) = output {
        std::fs::write(path, serialize_children(&doc, doc.root()))?;
    }

    Ok(reports.iter().all(|r| r.succeeded()))
}

// ============================================================================
// Helpers
// ============================================================================

pub fn load_page(path: &str) -> Result<Document, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    Ok(parse_html(&source))
}

/// YAML or JSON object of key to value (JSON parses as YAML).
pub fn parse_values(content: &str) -> Result<BTreeMap<String, FieldValue>, Box<dyn std::error::Error>> {
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_yaml::from_str(content)?)
}

pub fn load_values(path: &str) -> Result<BTreeMap<String, FieldValue>, Box<dyn std::error::Error>> {
    parse_values(&std::fs::read_to_string(path)?)
}

/// Value keyed by the field's id, name, group name or label. Names and labels
/// compare case-insensitively.
pub fn value_for<'a>(field: &Field, values: &'a BTreeMap<String, FieldValue>) -> Option<&'a FieldValue> {
    if let Some(v) = values.get(&field.id) {
        return Some(v);
    }
    let keys = [field.name(), field.group_name.as_deref(), Some(field.label.as_str())];
    keys.into_iter()
        .flatten()
        .filter(|k| !k.is_empty())
        .find_map(|k| {
            values
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(k))
                .map(|(_, v)| v)
        })
}
