use formscope::dom::dom_model::NodeId;
use formscope::dom::html::parse_html;
use formscope::locate::label::{LabelSource, humanize, label_candidates, member_label, resolve_label};
use formscope::locate::locator::{relocate, resolve_xpath, unique_selectors, xpath_of};

use crate::common::page::{by_id, detect_all, field_for, fixture};

mod common;

// ============================================================================
// XPath
// ============================================================================

#[test]
fn xpath_resolves_back_to_the_same_element() {
    let doc = fixture("signup.html");
    for id in ["first", "country", "female", "newsletter", "resume"] {
        let node = by_id(&doc, id);
        let xpath = xpath_of(&doc, node);
        assert!(xpath.starts_with("/html[1]/body[1]/form[1]/"), "{xpath}");
        assert_eq!(resolve_xpath(&doc, &xpath), Some(node), "{id}");
    }
}

#[test]
fn xpath_crosses_shadow_boundaries() {
    let doc = fixture("shadow.html");
    let inner = by_id(&doc, "inner");
    let xpath = xpath_of(&doc, inner);
    assert!(xpath.contains("/x-field[1]/#shadow-root/"), "{xpath}");
    assert_eq!(resolve_xpath(&doc, &xpath), Some(inner));
}

#[test]
fn xpath_with_missing_steps_resolves_to_nothing() {
    let doc = fixture("signup.html");
    assert_eq!(resolve_xpath(&doc, "/html[1]/body[1]/form[2]/input[1]"), None);
    assert_eq!(resolve_xpath(&doc, "/html[1]/body[1]/form[1]/input[0]"), None);
}

// ============================================================================
// Unique selectors
// ============================================================================

#[test]
fn id_selector_comes_first() {
    let doc = fixture("signup.html");
    let email = by_id(&doc, "email");
    let selectors = unique_selectors(&doc, email);
    assert_eq!(selectors[0], "#email");
    assert!(selectors.contains(&r#"input[name="email"]"#.to_string()));
}

#[test]
fn every_selector_matches_exactly_its_element() {
    let doc = fixture("signup.html");
    for id in ["first", "male", "tos", "privacy", "resume"] {
        let node = by_id(&doc, id);
        let selectors = unique_selectors(&doc, node);
        assert!(!selectors.is_empty());
        for selector in selectors {
            let hits = doc.query_selector_all(doc.root(), &selector).unwrap();
            assert_eq!(hits, vec![node], "{selector}");
        }
    }
}

#[test]
fn shared_names_need_the_value_to_be_unique() {
    let doc = parse_html(
        r#"<form>
             <input type="checkbox" name="terms" value="tos">
             <input type="checkbox" name="terms" value="privacy">
           </form>"#,
    );
    let inputs = doc.query_selector_all(doc.root(), "input").unwrap();
    let selectors = unique_selectors(&doc, inputs[1]);
    assert_eq!(selectors[0], r#"input[name="terms"][value="privacy"]"#);
    assert!(!selectors.contains(&r#"input[name="terms"]"#.to_string()));
}

// ============================================================================
// Re-acquisition
// ============================================================================

#[test]
fn stale_handle_is_relocated_by_selector() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let email = by_id(&doc, "email");

    let mut field = field_for(&fields, email).clone();
    field.element = NodeId(9999);
    assert_eq!(relocate(&doc, &field), Some(email));
}

#[test]
fn handle_owned_by_another_field_is_not_trusted() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let email = by_id(&doc, "email");

    let mut field = field_for(&fields, email).clone();
    field.element = by_id(&doc, "first");
    assert_eq!(relocate(&doc, &field), Some(email));
}

#[test]
fn xpath_is_the_last_resort() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let phone = by_id(&doc, "phone");

    let mut field = field_for(&fields, phone).clone();
    field.element = NodeId(9999);
    field.unique_selectors.clear();
    assert_eq!(relocate(&doc, &field), Some(phone));

    field.xpath = "/html[1]/body[1]/form[1]/input[42]".to_string();
    assert_eq!(relocate(&doc, &field), None);
}

// ============================================================================
// Labels
// ============================================================================

#[test]
fn label_for_wins_and_is_cleaned() {
    let doc = parse_html(
        r#"<form><label for="x">Email address: *</label><input id="x" placeholder="you@site.com"></form>"#,
    );
    let input = by_id(&doc, "x");
    assert_eq!(resolve_label(&doc, input), "Email address");

    let sources: Vec<LabelSource> = label_candidates(&doc, input).iter().map(|c| c.source).collect();
    assert!(sources.contains(&LabelSource::Placeholder));
}

#[test]
fn enclosing_label_skips_control_text() {
    let doc = parse_html(r#"<form><label><input id="c" type="checkbox"> Remember me</label></form>"#);
    assert_eq!(resolve_label(&doc, by_id(&doc, "c")), "Remember me");
}

#[test]
fn attribute_sources_in_rank_order() {
    let doc = parse_html(
        r#"<form>
             <input id="a" aria-label="Search site" placeholder="Type here">
             <input id="b" placeholder="Your city" name="city_name">
           </form>"#,
    );
    assert_eq!(resolve_label(&doc, by_id(&doc, "a")), "Search site");
    assert_eq!(resolve_label(&doc, by_id(&doc, "b")), "Your city");
}

#[test]
fn bare_input_falls_back_to_humanized_name() {
    let doc = parse_html(r#"<form><input id="n" name="first_name"></form>"#);
    assert_eq!(resolve_label(&doc, by_id(&doc, "n")), "First name");
}

#[test]
fn shadow_label_is_found_inside_its_tree() {
    let doc = fixture("shadow.html");
    assert_eq!(resolve_label(&doc, by_id(&doc, "inner")), "Display name");
}

#[test]
fn group_members_do_not_inherit_the_legend() {
    let doc = fixture("signup.html");
    assert_eq!(member_label(&doc, by_id(&doc, "male")), "Male");
    assert_eq!(resolve_label(&doc, by_id(&doc, "female")), "Female");
}

#[test]
fn humanize_splits_words() {
    assert_eq!(humanize("first_name"), "First name");
    assert_eq!(humanize("firstName"), "First name");
    assert_eq!(humanize("first-name[0]"), "First name");
    assert_eq!(humanize("__"), "");
}
