use std::collections::HashSet;

use formscope::config::EngineConfig;
use formscope::container::scorer::{resolve_container, score_container};
use formscope::discovery::discover_fields;
use formscope::dom::html::parse_html;
use formscope::field::field_model::{FieldType, FieldValue, GroupType};
use formscope::field::markers::{ATTR_DETECTED, ATTR_ID, ATTR_TYPE, is_processed};
use formscope::field::session::DetectionSession;
use formscope::{DetectOptions, detect};

use crate::common::page::{by_id, detect_all, field_for, field_labelled, fixture};

mod common;

// ============================================================================
// Whole-page detection
// ============================================================================

#[test]
fn signup_form_yields_one_field_per_control_or_group() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);

    // 4 text-like, 1 select, gender group, terms group, newsletter, resume
    assert_eq!(fields.len(), 9);

    let ids: HashSet<&str> = fields.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids.len(), fields.len());
    assert!(fields.iter().all(|f| f.id.starts_with("ff-")));

    assert_eq!(field_labelled(&fields, "First name").field_type, FieldType::Text);
    assert_eq!(field_labelled(&fields, "Email").field_type, FieldType::Email);
    assert_eq!(field_labelled(&fields, "Phone").field_type, FieldType::Tel);
    assert_eq!(field_labelled(&fields, "Website").field_type, FieldType::Url);
    assert_eq!(field_labelled(&fields, "Resume").field_type, FieldType::File);
}

#[test]
fn classifier_order_is_text_select_checkable_file() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let types: Vec<FieldType> = fields.iter().map(|f| f.field_type).collect();
    assert_eq!(
        types,
        vec![
            FieldType::Text,
            FieldType::Email,
            FieldType::Tel,
            FieldType::Url,
            FieldType::Select,
            FieldType::Radio,
            FieldType::Checkbox,
            FieldType::Checkbox,
            FieldType::File,
        ]
    );
}

#[test]
fn navigation_links_are_never_fields() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    assert!(fields.iter().all(|f| doc.tag(f.element) != "a"));
}

#[test]
fn select_options_and_current_value() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let country = field_labelled(&fields, "Country");
    let options = country.options.as_ref().unwrap();
    let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, vec!["", "us", "ca"]);
    assert_eq!(options[1].text, "United States");
}

#[test]
fn required_and_name_land_in_metadata() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let email = field_labelled(&fields, "Email");
    let meta = email.metadata.as_ref().unwrap();
    assert_eq!(meta.required, Some(true));
    assert_eq!(email.name(), Some("email"));
}

#[test]
fn n_inputs_get_n_distinct_ids() {
    let mut doc = parse_html(
        r#"<form>
             <input name="a"><input name="b"><input name="c" type="email">
             <input name="d" type="tel"><textarea name="e"></textarea>
           </form>"#,
    );
    let fields = detect_all(&mut doc);
    assert_eq!(fields.len(), 5);
    let ids: HashSet<String> = fields.iter().map(|f| f.id.clone()).collect();
    assert_eq!(ids.len(), 5);
}

#[test]
fn repeated_detection_never_reuses_an_id() {
    let mut doc = parse_html(r#"<form><input name="user"><input name="pass" type="password"></form>"#);
    let mut seen = HashSet::new();
    for _ in 0..1000 {
        for field in detect_all(&mut doc) {
            assert!(seen.insert(field.id.clone()), "id {} issued twice", field.id);
        }
    }
    assert_eq!(seen.len(), 2000);
}

#[test]
fn session_skips_ids_already_on_the_page() {
    let mut doc = parse_html(r#"<form><input id="i" name="x"></form>"#);
    let mut session = DetectionSession::new();
    let taken = format!("ff-{}-1", session.nonce());
    let input = by_id(&doc, "i");
    doc.set_attr(input, ATTR_ID, &taken);

    session.reserve_existing(&doc);
    let issued = session.issue_id();
    assert_ne!(issued, taken);
    assert_eq!(issued, format!("ff-{}-2", session.nonce()));
}

// ============================================================================
// Markers
// ============================================================================

#[test]
fn markers_are_written_on_every_member() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);

    let first = by_id(&doc, "first");
    let first_field = field_for(&fields, first);
    assert_eq!(doc.attr(first, ATTR_ID), Some(first_field.id.as_str()));
    assert_eq!(doc.attr(first, ATTR_DETECTED), Some("true"));
    assert_eq!(doc.attr(first, ATTR_TYPE), Some("text"));

    let male = by_id(&doc, "male");
    let female = by_id(&doc, "female");
    let gender = field_for(&fields, male);
    assert_eq!(doc.attr(male, ATTR_ID), Some(gender.id.as_str()));
    assert_eq!(doc.attr(female, ATTR_ID), Some(gender.id.as_str()));
    assert!(is_processed(&doc, female));
}

#[test]
fn detection_does_not_change_values() {
    let mut doc = fixture("signup.html");
    detect_all(&mut doc);
    assert!(doc.checked(by_id(&doc, "male")));
    assert!(!doc.checked(by_id(&doc, "female")));
    assert_eq!(doc.value(by_id(&doc, "first")), "");
    assert!(doc.event_log().is_empty());
}

#[test]
fn skip_processed_leaves_out_marked_elements() {
    let mut doc = parse_html(r#"<form id="f"><input name="a"><input name="b"></form>"#);
    let first_pass = detect_all(&mut doc);
    assert_eq!(first_pass.len(), 2);

    let options = DetectOptions {
        skip_processed: true,
        ..DetectOptions::default()
    };
    assert!(detect(&mut doc, None, &options).is_empty());

    let form = by_id(&doc, "f");
    let late = doc.append_element(form, "input", &[("name", "late")]);
    let second_pass = detect(&mut doc, None, &options);
    assert_eq!(second_pass.len(), 1);
    assert_eq!(second_pass[0].element, late);
}

#[test]
fn test_mode_attaches_sample_values() {
    let mut doc = fixture("signup.html");
    let options = DetectOptions {
        test_mode: true,
        ..DetectOptions::default()
    };
    let fields = detect(&mut doc, None, &options);
    assert!(fields.iter().all(|f| f.test_value.is_some()));

    let email = field_labelled(&fields, "Email");
    assert_eq!(email.test_value, Some(FieldValue::text("user@example.com")));
    let country = field_labelled(&fields, "Country");
    assert_eq!(country.test_value, Some(FieldValue::text("us")));

    let without = detect_all(&mut doc);
    assert!(without.iter().all(|f| f.test_value.is_none()));
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn open_shadow_fields_found_closed_ones_skipped() {
    let mut doc = fixture("shadow.html");
    let fields = detect_all(&mut doc);
    let inner = by_id(&doc, "inner");
    let outer = by_id(&doc, "outer");
    let sealed = by_id(&doc, "sealed-inner");

    assert_eq!(fields.len(), 2);
    assert_eq!(field_for(&fields, inner).label, "Display name");
    assert_eq!(field_for(&fields, outer).label, "City");
    assert!(fields.iter().all(|f| f.element != sealed));
    assert!(field_for(&fields, inner).xpath.contains("#shadow-root"));
}

#[test]
fn hidden_disabled_and_readonly_controls_are_filtered() {
    let doc = parse_html(
        r#"<form>
             <input id="ok" name="ok">
             <input id="off" name="off" disabled>
             <input id="ro" name="ro" readonly>
             <input id="gone" name="gone" style="display:none">
             <input id="aria" name="aria" aria-hidden="true">
             <input id="secret" type="hidden" name="csrf">
           </form>"#,
    );
    let found = discover_fields(&doc, doc.root(), &EngineConfig::default().discovery);
    assert_eq!(found, vec![by_id(&doc, "ok")]);
}

#[test]
fn zero_size_checkables_are_kept() {
    let doc = parse_html(
        r#"<form><input id="c" type="checkbox" name="c" style="width:0;height:0"><input id="t" name="t" style="width:0"></form>"#,
    );
    let found = discover_fields(&doc, doc.root(), &EngineConfig::default().discovery);
    assert_eq!(found, vec![by_id(&doc, "c")]);
}

#[test]
fn wrapper_around_native_control_is_not_a_second_field() {
    let doc = parse_html(
        r#"<form><div class="custom-select-wrapper" id="wrap"><select id="s" name="s"><option>A</option></select></div><input name="x"><input name="y"></form>"#,
    );
    let found = discover_fields(&doc, doc.root(), &EngineConfig::default().discovery);
    assert!(found.contains(&by_id(&doc, "s")));
    assert!(!found.contains(&by_id(&doc, "wrap")));
}

#[test]
fn fallback_scorer_finds_custom_inputs() {
    let doc = parse_html(
        r#"<div class="form-row"><my-text-input id="custom" name="nickname" placeholder="Nickname" tabindex="0">x</my-text-input></div>"#,
    );
    let found = discover_fields(&doc, doc.root(), &EngineConfig::default().discovery);
    assert_eq!(found, vec![by_id(&doc, "custom")]);
}

#[test]
fn extra_selectors_extend_the_whitelist() {
    let doc = parse_html(r#"<form><span id="odd" class="fancy-entry">Type here</span></form>"#);
    let mut config = EngineConfig::default();
    assert!(discover_fields(&doc, doc.root(), &config.discovery).is_empty());
    config.discovery.extra_selectors = vec![".fancy-entry".to_string()];
    assert_eq!(
        discover_fields(&doc, doc.root(), &config.discovery),
        vec![by_id(&doc, "odd")]
    );
}

#[test]
fn readonly_combobox_inside_library_select_keeps_the_widget() {
    let mut doc = parse_html(
        r#"<form>
             <label for="city">City</label><input id="city" name="city">
             <label for="plan-input">Plan</label>
             <div id="plan" class="ant-select ant-select-single">
               <div class="ant-select-selector">
                 <span class="ant-select-selection-search">
                   <input id="plan-input" role="combobox" readonly aria-expanded="false" class="ant-select-selection-search-input">
                 </span>
                 <span class="ant-select-selection-placeholder">Select a plan</span>
               </div>
             </div>
           </form>"#,
    );
    let fields = detect_all(&mut doc);
    let plan = by_id(&doc, "plan");

    assert_eq!(fields.len(), 2);
    let select = field_for(&fields, plan);
    assert_eq!(select.element, plan);
    assert_eq!(select.field_type, FieldType::Select);
    assert!(fields.iter().all(|f| f.element != by_id(&doc, "plan-input")));
}

#[test]
fn closed_shadow_root_on_the_container_is_not_entered() {
    let doc = parse_html(
        r#"<div id="sealed"><template shadowrootmode="closed"><input id="hidden-away" name="token"></template></div>
           <div id="shared"><template shadowrootmode="open"><input id="visible" name="nick"></template></div>"#,
    );
    let config = EngineConfig::default();
    assert!(discover_fields(&doc, by_id(&doc, "sealed"), &config.discovery).is_empty());
    assert_eq!(
        discover_fields(&doc, by_id(&doc, "shared"), &config.discovery),
        vec![by_id(&doc, "visible")]
    );
}

// ============================================================================
// Container scoring
// ============================================================================

#[test]
fn form_with_many_fields_outscores_navigation() {
    let doc = fixture("landing.html");
    let config = EngineConfig::default();
    let fields = discover_fields(&doc, doc.root(), &config.discovery);
    let form = by_id(&doc, "apply");
    let nav = by_id(&doc, "top");

    let form_score = score_container(&doc, form, &fields, &config.container);
    let nav_score = score_container(&doc, nav, &fields, &config.container);
    assert_eq!(form_score.field_count, 10);
    assert_eq!(nav_score.field_count, 0);
    assert!(form_score.score > nav_score.score);
    assert!(nav_score.score < 0);
}

#[test]
fn best_container_is_the_form() {
    let doc = fixture("landing.html");
    let config = EngineConfig::default();
    assert_eq!(resolve_container(&doc, None, &config), by_id(&doc, "apply"));
}

#[test]
fn single_field_container_expands_to_the_enclosing_form() {
    let doc = fixture("landing.html");
    let config = EngineConfig::default();
    let fields = discover_fields(&doc, doc.root(), &config.discovery);
    let section = by_id(&doc, "section");

    let resolved = resolve_container(&doc, Some(section), &config);
    assert_ne!(resolved, section);
    assert_eq!(
        score_container(&doc, resolved, &fields, &config.container).field_count,
        10
    );
}

#[test]
fn explicit_container_limits_detection() {
    let mut doc = parse_html(
        r#"<div id="left"><input name="a"><input name="b"></div>
           <div id="right"><form id="f"><input name="c"><input name="d"><input name="e"></form></div>"#,
    );
    let left = by_id(&doc, "left");
    let fields = detect(&mut doc, Some(left), &DetectOptions::default());
    assert_eq!(fields.len(), 2);
    assert!(fields.iter().all(|f| doc.composed_contains(left, f.element)));
}

#[test]
fn explicit_container_is_not_widened_into_sibling_regions() {
    let mut doc = parse_html(
        r#"<main>
             <div id="left"><input name="a"><input name="b"></div>
             <div id="right"><form id="f"><input name="c"><input name="d"><input name="e"></form></div>
           </main>"#,
    );
    let left = by_id(&doc, "left");
    assert_eq!(resolve_container(&doc, Some(left), &EngineConfig::default()), left);

    let fields = detect(&mut doc, Some(left), &DetectOptions::default());
    assert_eq!(fields.len(), 2);
    assert!(fields.iter().all(|f| doc.composed_contains(left, f.element)));
}

// ============================================================================
// Grouping
// ============================================================================

#[test]
fn named_radios_form_one_group_with_legend_label() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let gender = field_for(&fields, by_id(&doc, "female"));

    assert_eq!(gender.group_type, Some(GroupType::Radio));
    assert_eq!(gender.group_name.as_deref(), Some("gender"));
    assert_eq!(gender.label, "Gender");
    assert_eq!(gender.value, FieldValue::text("male"));

    let options = gender.options.as_ref().unwrap();
    let texts: Vec<&str> = options.iter().map(|o| o.text.as_str()).collect();
    assert_eq!(texts, vec!["Male", "Female"]);
}

#[test]
fn same_name_checkboxes_group_and_loners_stay_independent() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);

    let terms = field_for(&fields, by_id(&doc, "tos"));
    assert_eq!(terms.group_type, Some(GroupType::Checkbox));
    assert_eq!(terms.options.as_ref().map(Vec::len), Some(2));
    assert_eq!(terms.value, FieldValue::List(vec![]));

    let newsletter = field_for(&fields, by_id(&doc, "newsletter"));
    assert_ne!(newsletter.id, terms.id);
    assert_eq!(newsletter.field_type, FieldType::Checkbox);
    assert!(newsletter.group_type.is_none());
    assert_eq!(newsletter.label, "Send me news");
    assert_eq!(newsletter.value, FieldValue::Bool(false));
}

#[test]
fn unnamed_radios_cluster_by_radiogroup() {
    let mut doc = parse_html(
        r#"<form>
             <div role="radiogroup" aria-label="Plan">
               <label><input id="p1" type="radio" value="free"> Free</label>
               <label><input id="p2" type="radio" value="pro"> Pro</label>
             </div>
             <input name="email" type="email">
           </form>"#,
    );
    let fields = detect_all(&mut doc);
    let plan = field_for(&fields, by_id(&doc, "p1"));
    assert_eq!(plan.group_type, Some(GroupType::Radio));
    assert_eq!(plan.label, "Plan");
    assert!(plan.member_elements().contains(&by_id(&doc, "p2")));
}

#[test]
fn same_name_in_different_forms_are_separate_groups() {
    let mut doc = parse_html(
        r#"<div class="page">
             <form id="a"><input id="a1" type="radio" name="choice" value="1"><input id="a2" type="radio" name="choice" value="2"></form>
             <form id="b"><input id="b1" type="radio" name="choice" value="1"><input id="b2" type="radio" name="choice" value="2"></form>
           </div>"#,
    );
    let page = doc.element_children(doc.root())[0];
    let fields = detect(&mut doc, Some(page), &DetectOptions::default());
    let a = field_for(&fields, by_id(&doc, "a1"));
    let b = field_for(&fields, by_id(&doc, "b1"));
    assert_ne!(a.id, b.id);
    assert_eq!(a.options.as_ref().map(Vec::len), Some(2));
    assert_eq!(b.options.as_ref().map(Vec::len), Some(2));
}
