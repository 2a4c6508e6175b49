use formscope::dom::html::parse_html;
use formscope::field::field_model::FieldValue;
use formscope::inject::{FrameworkHint, InjectionState};
use formscope::{InjectionStatus, apply_with};

use crate::common::page::{by_id, detect_all, fast_options, field_for};
use crate::common::widgets::{make_controlled, make_stubborn};

mod common;

// ============================================================================
// Native inputs
// ============================================================================

#[tokio::test]
async fn plain_input_takes_a_direct_write() {
    let mut doc = parse_html(r#"<form><label for="n">Name</label><input id="n" name="name"></form>"#);
    let fields = detect_all(&mut doc);
    let input = by_id(&doc, "n");
    let field = field_for(&fields, input);

    let report = apply_with(&mut doc, input, field, &FieldValue::text("Ada Lovelace"), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(report.framework, FrameworkHint::Native);
    assert_eq!(report.attempted_strategies(), vec!["direct-write"]);
    assert_eq!(doc.value(input), "Ada Lovelace");
    assert_eq!(doc.events_for(input, "input"), 1);
    assert_eq!(doc.events_for(input, "change"), 1);
    assert_eq!(
        report.states,
        vec![
            InjectionState::Idle,
            InjectionState::Normalizing,
            InjectionState::StrategySelection,
            InjectionState::Attempt(2),
            InjectionState::Success,
        ]
    );
}

#[tokio::test]
async fn email_value_gets_a_domain() {
    let mut doc = parse_html(r#"<form><input id="e" type="email" name="email"></form>"#);
    let fields = detect_all(&mut doc);
    let input = by_id(&doc, "e");

    let report = apply_with(&mut doc, input, field_for(&fields, input), &"bob".into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(report.normalized_value, "bob@example.com");
    assert!(doc.value(input).contains('@'));
}

#[tokio::test]
async fn url_value_gets_a_scheme() {
    let mut doc = parse_html(r#"<form><input id="u" type="url" name="site"></form>"#);
    let fields = detect_all(&mut doc);
    let input = by_id(&doc, "u");

    let report = apply_with(&mut doc, input, field_for(&fields, input), &"example.com".into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(doc.value(input), "https://example.com");
}

#[tokio::test]
async fn number_is_clamped_to_bounds() {
    let mut doc = parse_html(r#"<form><input id="q" type="number" name="qty" min="1" max="10"></form>"#);
    let fields = detect_all(&mut doc);
    let input = by_id(&doc, "q");

    let report = apply_with(&mut doc, input, field_for(&fields, input), &FieldValue::Number(42.0), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(doc.value(input), "10");
}

#[tokio::test]
async fn maxlength_truncates_before_writing() {
    let mut doc = parse_html(r#"<form><input id="c" name="code" maxlength="4"></form>"#);
    let fields = detect_all(&mut doc);
    let input = by_id(&doc, "c");

    let report = apply_with(&mut doc, input, field_for(&fields, input), &"ABCDEFG".into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(doc.value(input), "ABCD");
}

#[tokio::test]
async fn content_editable_gets_text_content() {
    let mut doc = parse_html(r#"<form><div id="bio" contenteditable="true" aria-label="Bio"></div></form>"#);
    let fields = detect_all(&mut doc);
    let bio = by_id(&doc, "bio");

    let report = apply_with(&mut doc, bio, field_for(&fields, bio), &"Hello  world".into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(report.attempted_strategies(), vec!["contenteditable-write"]);
    assert_eq!(doc.normalized_text(bio), "Hello world");
}

// ============================================================================
// Fallback cascade
// ============================================================================

#[tokio::test]
async fn reverted_write_falls_through_to_exec_command() {
    let mut doc = parse_html(r#"<form><input id="s" name="city"></form>"#);
    let fields = detect_all(&mut doc);
    let input = by_id(&doc, "s");
    make_stubborn(&mut doc, input);

    let report = apply_with(&mut doc, input, field_for(&fields, input), &"Lisbon".into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(report.attempted_strategies(), vec!["direct-write", "exec-command"]);
    assert!(!report.attempts[0].verified);
    assert!(report.attempts[1].verified);
    assert_eq!(
        report.states,
        vec![
            InjectionState::Idle,
            InjectionState::Normalizing,
            InjectionState::StrategySelection,
            InjectionState::Attempt(2),
            InjectionState::Attempt(3),
            InjectionState::Success,
        ]
    );
    assert_eq!(doc.value(input), "Lisbon");
}

#[tokio::test]
async fn every_strategy_runs_at_most_once_before_giving_up() {
    let mut doc = parse_html(r#"<form><input id="x" name="locked"></form>"#);
    let fields = detect_all(&mut doc);
    let input = by_id(&doc, "x");
    // Anything written is wiped on the following event
    doc.listen(input, "input", |doc, event| doc.set_value(event.target, ""));
    doc.listen(input, "change", |doc, event| doc.set_value(event.target, ""));

    let report = apply_with(&mut doc, input, field_for(&fields, input), &"value".into(), &fast_options()).await;

    assert!(!report.succeeded());
    assert_eq!(report.status, InjectionStatus::ExhaustedStrategies);
    assert_eq!(
        report.attempted_strategies(),
        vec!["direct-write", "exec-command", "blur-refocus"]
    );
    assert_eq!(report.state(), InjectionState::ExhaustedStrategies);
}

// ============================================================================
// Framework-controlled inputs
// ============================================================================

#[tokio::test]
async fn controlled_input_is_typed_into() {
    let mut doc = parse_html(r#"<form><label for="f">First name</label><input id="f" name="first"></form>"#);
    let input = by_id(&doc, "f");
    let state = make_controlled(&mut doc, input);
    let fields = detect_all(&mut doc);

    let report = apply_with(&mut doc, input, field_for(&fields, input), &"Grace".into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(report.framework, FrameworkHint::React);
    assert_eq!(report.attempted_strategies(), vec!["controlled-typing"]);
    assert_eq!(doc.value(input), "Grace");
    assert_eq!(*state.borrow(), "Grace");
    assert_eq!(doc.events_for(input, "keydown"), 5);
    assert_eq!(doc.events_for(input, "keyup"), 5);
    assert_eq!(doc.events_for(input, "compositionend"), 1);
}

#[tokio::test]
async fn controlled_input_metadata_names_the_framework() {
    let mut doc = parse_html(r#"<form><input id="f" name="first"></form>"#);
    let input = by_id(&doc, "f");
    make_controlled(&mut doc, input);
    let fields = detect_all(&mut doc);
    let meta = field_for(&fields, input).metadata.as_ref().unwrap();
    assert_eq!(meta.framework.as_deref(), Some("react"));
}

// ============================================================================
// Missing targets
// ============================================================================

#[tokio::test]
async fn non_element_target_reports_missing() {
    let mut doc = parse_html(r#"<form><input id="i" name="i"></form>"#);
    let fields = detect_all(&mut doc);
    let field = field_for(&fields, by_id(&doc, "i")).clone();
    let root = doc.root();

    let report = apply_with(&mut doc, root, &field, &"x".into(), &fast_options()).await;

    assert_eq!(report.status, InjectionStatus::ElementMissing);
    assert!(report.attempts.is_empty());
    assert_eq!(report.state(), InjectionState::ExhaustedStrategies);
}
