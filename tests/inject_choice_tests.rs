use formscope::dom::html::parse_html;
use formscope::field::field_model::FieldValue;
use formscope::inject::select::match_option;
use formscope::{InjectionStatus, apply_field, apply_with};

use crate::common::page::{by_id, detect_all, fast_options, field_for, fixture};
use crate::common::widgets::wire_combobox;

mod common;

// ============================================================================
// Native <select>
// ============================================================================

#[tokio::test]
async fn native_select_matches_option_text() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let country = by_id(&doc, "country");

    let report = apply_with(&mut doc, country, field_for(&fields, country), &"Canada".into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(report.attempted_strategies(), vec!["native-select"]);
    assert_eq!(doc.value(country), "ca");
    assert_eq!(doc.events_for(country, "change"), 1);
}

#[tokio::test]
async fn unmatched_value_picks_first_real_option() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let country = by_id(&doc, "country");

    let report = apply_with(&mut doc, country, field_for(&fields, country), &"Atlantis".into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(doc.value(country), "us");
}

#[tokio::test]
async fn multi_select_selects_every_requested_option() {
    let mut doc = parse_html(
        r#"<form><select id="langs" name="langs" multiple>
             <option value="en" selected>English</option>
             <option value="fr">French</option>
             <option value="de">German</option>
           </select></form>"#,
    );
    let fields = detect_all(&mut doc);
    let select = by_id(&doc, "langs");
    let wanted = FieldValue::List(vec!["fr".to_string(), "German".to_string()]);

    let report = apply_with(&mut doc, select, field_for(&fields, select), &wanted, &fast_options()).await;

    assert!(report.succeeded());
    let chosen: Vec<String> = doc
        .selected_options(select)
        .into_iter()
        .map(|o| doc.option_value(o))
        .collect();
    assert_eq!(chosen, vec!["fr", "de"]);
    assert_eq!(report.normalized_value, "fr, German");
}

// ============================================================================
// ARIA and library dropdowns
// ============================================================================

const COMBOBOX: &str = r#"
<form>
  <span id="lang-label">Language</span>
  <div id="lang" role="combobox" aria-labelledby="lang-label" aria-controls="lang-list" tabindex="0">Choose one</div>
  <ul id="lang-list" role="listbox" style="display:none">
    <li role="option" data-value="en">English</li>
    <li role="option" data-value="fr">French</li>
  </ul>
</form>"#;

#[tokio::test]
async fn aria_combobox_is_opened_and_option_clicked() {
    let mut doc = parse_html(COMBOBOX);
    let combobox = by_id(&doc, "lang");
    let listbox = by_id(&doc, "lang-list");
    wire_combobox(&mut doc, combobox, listbox);
    let fields = detect_all(&mut doc);
    let field = field_for(&fields, combobox);
    assert_eq!(field.label, "Language");
    assert_eq!(field.options.as_ref().map(Vec::len), Some(2));

    let report = apply_with(&mut doc, combobox, field, &"French".into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(report.attempted_strategies(), vec!["aria"]);
    assert_eq!(doc.normalized_text(combobox), "French");
    let french = doc.element_children(listbox)[1];
    assert_eq!(doc.attr(french, "aria-selected"), Some("true"));
}

#[tokio::test]
async fn combobox_without_options_exhausts_strategies() {
    let mut doc = parse_html(
        r#"<form><div id="empty" role="combobox" aria-label="Empty" tabindex="0">Pick</div></form>"#,
    );
    let combobox = by_id(&doc, "empty");
    let fields = detect_all(&mut doc);

    let report = apply_with(&mut doc, combobox, field_for(&fields, combobox), &"Anything".into(), &fast_options()).await;

    assert_eq!(report.status, InjectionStatus::ExhaustedStrategies);
    assert_eq!(report.attempted_strategies(), vec!["aria"]);
    assert!(report.attempts[0].outcome.starts_with("failed"));
}

#[test]
fn option_matching_prefers_data_value_then_text() {
    let doc = parse_html(
        r#"<ul>
             <li id="ph" role="option">Select one</li>
             <li id="off" role="option" aria-disabled="true" data-value="x">Blocked</li>
             <li id="a" role="option" data-value="north">Northern region</li>
             <li id="b" role="option" data-value="south">South</li>
           </ul>"#,
    );
    let options: Vec<_> = ["ph", "off", "a", "b"].iter().map(|id| by_id(&doc, id)).collect();

    assert_eq!(match_option(&doc, &options, "south"), Some(by_id(&doc, "b")));
    assert_eq!(match_option(&doc, &options, "SOUTH"), Some(by_id(&doc, "b")));
    assert_eq!(match_option(&doc, &options, "northern"), Some(by_id(&doc, "a")));
    assert_eq!(match_option(&doc, &options, "x"), Some(by_id(&doc, "a")));
    assert_eq!(match_option(&doc, &options, "zzz"), Some(by_id(&doc, "a")));
}

// ============================================================================
// Radios and checkboxes
// ============================================================================

#[tokio::test]
async fn choosing_female_unchecks_male() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let male = by_id(&doc, "male");
    let female = by_id(&doc, "female");
    let gender = field_for(&fields, female).clone();

    let report = apply_field(&mut doc, &gender, &"Female".into(), &fast_options()).await;

    assert!(report.succeeded());
    assert!(doc.checked(female));
    assert!(!doc.checked(male));
    assert_eq!(report.attempted_strategies(), vec!["native-click"]);
    assert_eq!(report.attempts[0].element, female);
}

#[tokio::test]
async fn redetected_radio_group_reports_the_applied_option() {
    let mut doc = parse_html(
        r#"<form>
             <label for="nick">Nickname</label><input id="nick" name="nickname">
             <fieldset>
               <legend>Gender</legend>
               <label><input id="m" type="radio" name="gender" value="Male" checked> Male</label>
               <label><input id="f" type="radio" name="gender" value="Female"> Female</label>
             </fieldset>
           </form>"#,
    );
    let fields = detect_all(&mut doc);
    let gender = field_for(&fields, by_id(&doc, "f")).clone();
    assert_eq!(gender.value, FieldValue::text("Male"));

    let report = apply_field(&mut doc, &gender, &"Female".into(), &fast_options()).await;
    assert!(report.succeeded());

    let fields = detect_all(&mut doc);
    let regrouped = field_for(&fields, by_id(&doc, "f"));
    let options = regrouped.options.as_ref().unwrap();
    assert_eq!(options.len(), 2);
    let selected: Vec<&str> = options.iter().filter(|o| o.selected).map(|o| o.value.as_str()).collect();
    assert_eq!(selected, vec!["Female"]);
    assert_eq!(regrouped.value, FieldValue::text("Female"));
}

#[tokio::test]
async fn radio_value_matches_by_submitted_value() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let female = by_id(&doc, "female");
    let gender = field_for(&fields, female).clone();

    apply_field(&mut doc, &gender, &"female".into(), &fast_options()).await;
    let report = apply_field(&mut doc, &gender, &"male".into(), &fast_options()).await;

    assert!(report.succeeded());
    assert!(doc.checked(by_id(&doc, "male")));
    assert!(!doc.checked(female));
}

#[tokio::test]
async fn unknown_radio_value_fails_with_note() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let gender = field_for(&fields, by_id(&doc, "female")).clone();

    let report = apply_field(&mut doc, &gender, &"other".into(), &fast_options()).await;

    assert!(!report.succeeded());
    assert!(report.notes.iter().any(|n| n.contains("other")));
    assert!(doc.checked(by_id(&doc, "male")));
}

#[tokio::test]
async fn checkbox_group_sets_each_member() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let tos = by_id(&doc, "tos");
    let privacy = by_id(&doc, "privacy");
    let terms = field_for(&fields, tos).clone();

    let report = apply_field(&mut doc, &terms, &FieldValue::List(vec!["privacy".to_string()]), &fast_options()).await;
    assert!(report.succeeded());
    assert!(doc.checked(privacy));
    assert!(!doc.checked(tos));

    let report = apply_field(&mut doc, &terms, &FieldValue::Bool(true), &fast_options()).await;
    assert!(report.succeeded());
    assert!(doc.checked(privacy));
    assert!(doc.checked(tos));

    let report = apply_field(&mut doc, &terms, &FieldValue::Bool(false), &fast_options()).await;
    assert!(report.succeeded());
    assert!(!doc.checked(privacy));
    assert!(!doc.checked(tos));
}

#[tokio::test]
async fn single_checkbox_reads_truthy_words() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let newsletter = by_id(&doc, "newsletter");
    let field = field_for(&fields, newsletter).clone();

    let report = apply_field(&mut doc, &field, &"Yes".into(), &fast_options()).await;
    assert!(report.succeeded());
    assert_eq!(report.normalized_value, "true");
    assert!(doc.checked(newsletter));

    let report = apply_field(&mut doc, &field, &"off".into(), &fast_options()).await;
    assert!(report.succeeded());
    assert!(!doc.checked(newsletter));
}

#[tokio::test]
async fn aria_switch_falls_back_to_aria_state() {
    let mut doc = parse_html(
        r#"<form><div id="dark" role="switch" aria-checked="false" tabindex="0">Dark mode</div></form>"#,
    );
    let switch = by_id(&doc, "dark");
    let fields = detect_all(&mut doc);

    let report = apply_with(&mut doc, switch, field_for(&fields, switch), &FieldValue::Bool(true), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(report.attempted_strategies(), vec!["native-click", "aria-state"]);
    assert_eq!(doc.attr(switch, "aria-checked"), Some("true"));
    assert_eq!(doc.events_for(switch, "change"), 1);
}

#[tokio::test]
async fn already_checked_box_needs_no_click() {
    let mut doc = parse_html(r#"<form><input id="c" type="checkbox" name="c" checked></form>"#);
    let checkbox = by_id(&doc, "c");
    let fields = detect_all(&mut doc);

    let report = apply_with(&mut doc, checkbox, field_for(&fields, checkbox), &"on".into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(doc.events_for(checkbox, "click"), 0);
    assert!(doc.checked(checkbox));
}

// ============================================================================
// Re-acquisition
// ============================================================================

#[tokio::test]
async fn removed_element_reports_missing() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let first = by_id(&doc, "first");
    let field = field_for(&fields, first).clone();
    let form = by_id(&doc, "signup");
    doc.remove_children(form);

    let report = apply_field(&mut doc, &field, &"Ada".into(), &fast_options()).await;

    assert_eq!(report.status, InjectionStatus::ElementMissing);
    assert!(report.attempts.is_empty());
}
