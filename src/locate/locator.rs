use tracing::debug;

use crate::dom::dom_model::{Document, NodeId};
use crate::dom::selector::nth_of_type;
use crate::field::field_model::Field;
use crate::field::markers::ATTR_ID;

// ============================================================================
// XPath: ancestor-indexed, with a `#shadow-root` step at each boundary
// ============================================================================

pub const SHADOW_STEP: &str = "#shadow-root";

pub fn xpath_of(doc: &Document, node: NodeId) -> String {
    let mut steps = Vec::new();
    let mut current = Some(node);
    while let Some(n) = current {
        if doc.is_element(n) {
            steps.push(format!("{}[{}]", doc.tag(n), nth_of_type(doc, n)));
            current = doc.parent(n);
        } else if let Some(host) = doc.shadow_host(n) {
            steps.push(SHADOW_STEP.to_string());
            current = Some(host);
        } else {
            break;
        }
    }
    steps.reverse();
    format!("/{}", steps.join("/"))
}

pub fn resolve_xpath(doc: &Document, xpath: &str) -> Option<NodeId> {
    let mut current = doc.root();
    for step in xpath.split('/').filter(|s| !s.is_empty()) {
        if step == SHADOW_STEP {
            current = doc.shadow_root(current)?;
            continue;
        }
        let (tag, index) = parse_step(step)?;
        current = doc
            .children(current)
            .iter()
            .copied()
            .filter(|c| doc.tag(*c) == tag)
            .nth(index.checked_sub(1)?)?;
    }
    doc.is_element(current).then_some(current)
}

fn parse_step(step: &str) -> Option<(&str, usize)> {
    match step.split_once('[') {
        Some((tag, rest)) => Some((tag, rest.strip_suffix(']')?.parse().ok()?)),
        None => Some((step, 1)),
    }
}

/// Tree root (document or shadow root) named by an xpath's last shadow step.
fn xpath_scope(doc: &Document, xpath: &str) -> Option<NodeId> {
    match xpath.rfind(SHADOW_STEP) {
        Some(at) => {
            let host = resolve_xpath(doc, xpath[..at].trim_end_matches('/'))?;
            doc.shadow_root(host)
        }
        None => Some(doc.root()),
    }
}

// ============================================================================
// Unique CSS selectors
// ============================================================================

/// Selectors that match exactly `node` within its own tree, most specific first.
pub fn unique_selectors(doc: &Document, node: NodeId) -> Vec<String> {
    let scope = doc.tree_root(node);
    let tag = doc.tag(node).to_string();
    let mut candidates: Vec<String> = Vec::new();

    if let Some(id) = doc.attr(node, "id").filter(|id| !id.is_empty()) {
        if is_plain_ident(id) {
            candidates.push(format!("#{}", id));
        } else if let Some(quoted) = quote_value(id) {
            candidates.push(format!("{}[id={}]", tag, quoted));
        }
    }

    for attr in ["data-testid", "data-test-id", "data-cy", "data-qa"] {
        if let Some(quoted) = doc.attr(node, attr).and_then(quote_value) {
            candidates.push(format!("[{}={}]", attr, quoted));
        }
    }

    if let Some(name) = doc.attr(node, "name").and_then(quote_value) {
        candidates.push(format!("{}[name={}]", tag, name));
        if let Some(value) = doc.attr(node, "value").and_then(quote_value) {
            candidates.push(format!("{}[name={}][value={}]", tag, name, value));
        }
    }

    if let Some(label) = doc.attr(node, "aria-label").and_then(quote_value) {
        candidates.push(format!("{}[aria-label={}]", tag, label));
    }

    candidates.push(structural_path(doc, node));

    let mut verified = Vec::new();
    for candidate in candidates {
        match doc.query_selector_all(scope, &candidate) {
            Ok(hits) if hits.len() == 1 && hits[0] == node => {
                if !verified.contains(&candidate) {
                    verified.push(candidate);
                }
            }
            Ok(_) => {}
            Err(e) => debug!(selector = %candidate, error = %e, "locator candidate rejected"),
        }
    }
    verified
}

/// `tag:nth-of-type(n) > …` from the top of the node's own tree.
fn structural_path(doc: &Document, node: NodeId) -> String {
    let mut steps = vec![format!("{}:nth-of-type({})", doc.tag(node), nth_of_type(doc, node))];
    let mut current = doc.parent_element(node);
    while let Some(n) = current {
        steps.push(format!("{}:nth-of-type({})", doc.tag(n), nth_of_type(doc, n)));
        current = doc.parent_element(n);
    }
    steps.reverse();
    steps.join(" > ")
}

fn is_plain_ident(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn quote_value(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else if !value.contains('"') {
        Some(format!("\"{}\"", value))
    } else if !value.contains('\'') {
        Some(format!("'{}'", value))
    } else {
        None
    }
}

// ============================================================================
// Re-acquisition
// ============================================================================

/// Find a field's element again: node handle, then selectors, then xpath.
pub fn relocate(doc: &Document, field: &Field) -> Option<NodeId> {
    let handle = field.element;
    if doc.is_element(handle)
        && doc.composed_contains(doc.root(), handle)
        && doc.attr(handle, ATTR_ID).is_none_or(|id| id == field.id)
    {
        return Some(handle);
    }

    if let Some(scope) = xpath_scope(doc, &field.xpath) {
        for selector in &field.unique_selectors {
            if let Ok(hits) = doc.query_selector_all(scope, selector) {
                if let [only] = hits.as_slice() {
                    debug!(field = %field.id, selector = %selector, "relocated by selector");
                    return Some(*only);
                }
            }
        }
    }

    let found = resolve_xpath(doc, &field.xpath);
    if found.is_some() {
        debug!(field = %field.id, xpath = %field.xpath, "relocated by xpath");
    }
    found
}

/// Re-locate a group member from its recorded xpath, falling back to the handle.
pub fn relocate_member(doc: &Document, xpath: Option<&str>, handle: Option<NodeId>) -> Option<NodeId> {
    if let Some(node) = handle.filter(|n| doc.is_element(*n) && doc.composed_contains(doc.root(), *n)) {
        return Some(node);
    }
    xpath.and_then(|x| resolve_xpath(doc, x))
}
