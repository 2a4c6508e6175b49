use crate::config::DiscoveryConfig;
use crate::dom::dom_model::{Document, NodeId};

// ============================================================================
// Weighted fallback scorer: for pages with no recognizable controls
// ============================================================================

const INPUT_LIKE_TAGS: &[&str] = &["input", "select", "textarea"];
const NATIVE_CONTROLS: &[&str] = &["input", "select", "textarea"];
const NEVER_FIELDS: &[&str] = &[
    "html", "head", "body", "script", "style", "template", "meta", "link", "title", "br", "img",
    "svg", "path", "form", "fieldset", "legend", "label", "option", "optgroup", "a", "button",
];
const FORM_ATTRS: &[(&str, i32)] = &[
    ("name", 2),
    ("placeholder", 2),
    ("value", 1),
    ("required", 1),
    ("pattern", 1),
];
const ARIA_ATTRS: &[&str] = &["aria-label", "aria-labelledby", "aria-describedby", "aria-required"];
const HANDLER_ATTRS: &[&str] = &["onchange", "oninput", "onkeyup", "onkeydown", "onblur", "onfocus"];
const TEST_ID_ATTRS: &[&str] = &["data-testid", "data-test-id", "data-test", "data-cy", "data-qa"];
const CUSTOM_FIELD_WORDS: &[&str] = &["input", "field", "select", "textbox", "picker", "dropdown"];
const CONTAINER_WORDS: &[&str] = &["form", "field", "input", "control"];

/// Custom-element names like `x-input`, `input-x`, `my-date-picker`.
pub fn is_input_like_custom_element(tag: &str) -> bool {
    tag.contains('-')
        && tag
            .split('-')
            .any(|part| CUSTOM_FIELD_WORDS.contains(&part))
}

pub fn is_input_like(doc: &Document, node: NodeId) -> bool {
    let tag = doc.tag(node);
    INPUT_LIKE_TAGS.contains(&tag) || is_input_like_custom_element(tag)
}

/// Additive evidence that `node` is a field.
pub fn fallback_score(doc: &Document, node: NodeId) -> i32 {
    let Some(el) = doc.element(node) else {
        return i32::MIN;
    };
    if NEVER_FIELDS.contains(&el.tag.as_str()) {
        return i32::MIN;
    }

    let mut score = 0;

    if let Some(tabindex) = el.attr("tabindex").and_then(|t| t.trim().parse::<i32>().ok()) {
        if tabindex >= 0 {
            score += 2;
        }
    }

    for (attr, weight) in FORM_ATTRS {
        if el.has_attr(attr) {
            score += weight;
        }
    }

    score += ARIA_ATTRS.iter().filter(|a| el.has_attr(a)).count() as i32;
    score += HANDLER_ATTRS.iter().filter(|a| el.has_attr(a)).count() as i32;
    if TEST_ID_ATTRS.iter().any(|a| el.has_attr(a)) {
        score += 1;
    }

    if is_input_like_custom_element(&el.tag) {
        score += 3;
    }

    // Context: a label nearby, or a form-ish wrapper
    let near_label = doc
        .parent(node)
        .map(|p| doc.element_children(p))
        .unwrap_or_default()
        .into_iter()
        .any(|s| s != node && doc.tag(s) == "label");
    if near_label || doc.ancestors(node).iter().any(|a| doc.tag(*a) == "label") {
        score += 1;
    }
    let formish_wrapper = doc.ancestors(node).into_iter().take(3).any(|a| {
        let class = doc.class_attr(a).to_lowercase();
        CONTAINER_WORDS.iter().any(|w| class.contains(w))
    });
    if formish_wrapper {
        score += 1;
    }

    // Wrappers around real controls are not fields themselves
    if doc
        .composed_descendant_elements(node)
        .into_iter()
        .any(|d| NATIVE_CONTROLS.contains(&doc.tag(d)))
    {
        score -= 5;
    }

    score
}

pub fn qualifies(doc: &Document, node: NodeId, config: &DiscoveryConfig) -> bool {
    let score = fallback_score(doc, node);
    let threshold = if is_input_like(doc, node) {
        config.input_like_threshold
    } else {
        config.generic_threshold
    };
    score >= threshold
}
