use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::config::DiscoveryConfig;
use crate::discovery::scoring::qualifies;
use crate::discovery::selectors::{COMPILED_SELECTORS, MINIMAL_SELECTOR};
use crate::dom::dom_model::{Document, NodeId};
use crate::dom::selector::parse_selector;
use crate::error::{EngineError, Result};

// ============================================================================
// Field discovery
// ============================================================================

const NATIVE_CONTROLS: &[&str] = &["input", "select", "textarea"];
const CHECKABLE_ROLES: &[&str] = &["checkbox", "radio", "switch"];

/// Every element under `root` (shadow trees included) that functions as a
/// form field, de-duplicated, filtered, in composed document order.
pub fn discover_fields(doc: &Document, root: NodeId, config: &DiscoveryConfig) -> Vec<NodeId> {
    let found = match collect_candidates(doc, root, config) {
        Ok(found) => found,
        Err(e) => {
            warn!(error = %e, "discovery root unusable, falling back to minimal scan");
            minimal_scan(doc)
        }
    };

    // Filter before de-duplicating: a wrapper only yields to controls that survive
    let fillable: Vec<NodeId> = found
        .into_iter()
        .filter(|n| match skip_reason(doc, *n) {
            Some(reason) => {
                debug!(node = n.0, tag = doc.tag(*n), reason, "candidate filtered");
                false
            }
            None => true,
        })
        .collect();
    let mut kept = dedupe(doc, fillable);

    sort_composed(doc, &mut kept);
    debug!(count = kept.len(), "discovery complete");
    kept
}

fn validate_root(doc: &Document, root: NodeId) -> Result<()> {
    if doc.is_document(root) || doc.is_shadow_root(root) || doc.is_element(root) {
        Ok(())
    } else {
        Err(EngineError::InvalidRoot(root))
    }
}

fn collect_candidates(doc: &Document, root: NodeId, config: &DiscoveryConfig) -> Result<Vec<NodeId>> {
    validate_root(doc, root)?;

    let extra: Vec<_> = config
        .extra_selectors
        .iter()
        .filter_map(|raw| match parse_selector(raw) {
            Ok(list) => Some(list),
            Err(e) => {
                debug!(selector = %raw, error = %e, "extra selector skipped");
                None
            }
        })
        .collect();

    let mut found: Vec<NodeId> = Vec::new();
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut every_element: Vec<NodeId> = Vec::new();

    // Worklist of tree roots: the requested root, then every shadow root under it
    let mut worklist: VecDeque<NodeId> = VecDeque::new();
    worklist.push_back(root);
    if let Some(shadow) = doc.shadow_root(root) {
        if shadow_is_open(doc, shadow) {
            worklist.push_back(shadow);
        } else {
            debug!(host = root.0, "closed shadow root not entered");
        }
    }

    while let Some(scope) = worklist.pop_front() {
        let descendants = doc.descendant_elements(scope);

        for (raw, selector) in COMPILED_SELECTORS.iter() {
            let hits = doc.select_all(scope, selector);
            if !hits.is_empty() {
                debug!(selector = raw, hits = hits.len(), "whitelist match");
            }
            for hit in hits {
                if seen.insert(hit) {
                    found.push(hit);
                }
            }
        }
        for selector in &extra {
            for hit in doc.select_all(scope, selector) {
                if seen.insert(hit) {
                    found.push(hit);
                }
            }
        }

        for node in &descendants {
            if let Some(shadow) = doc.shadow_root(*node) {
                if shadow_is_open(doc, shadow) {
                    worklist.push_back(shadow);
                } else {
                    debug!(host = node.0, "closed shadow root not entered");
                }
            }
        }
        every_element.extend(descendants);
    }

    if found.len() < config.fallback_min_results {
        let before = found.len();
        for node in every_element {
            if !seen.contains(&node) && qualifies(doc, node, config) {
                seen.insert(node);
                found.push(node);
            }
        }
        debug!(added = found.len() - before, "fallback scorer ran");
    }

    Ok(found)
}

fn shadow_is_open(doc: &Document, shadow: NodeId) -> bool {
    matches!(
        doc.node(shadow).map(|n| &n.kind),
        Some(crate::dom::dom_model::NodeKind::ShadowRoot { open: true, .. })
    )
}

fn minimal_scan(doc: &Document) -> Vec<NodeId> {
    doc.query_selector_all(doc.root(), MINIMAL_SELECTOR)
        .unwrap_or_default()
        .into_iter()
        .filter(|n| {
            !matches!(
                doc.input_type(*n).as_deref(),
                Some("hidden" | "submit" | "button" | "reset" | "image")
            )
        })
        .collect()
}

// ============================================================================
// De-duplication
// ============================================================================

fn is_native_or_aria(doc: &Document, node: NodeId) -> bool {
    NATIVE_CONTROLS.contains(&doc.tag(node)) || doc.role(node).is_some()
}

/// Drop wrappers that contain a native or ARIA control which is itself a
/// candidate, and listboxes owned by a candidate combobox.
fn dedupe(doc: &Document, found: Vec<NodeId>) -> Vec<NodeId> {
    let set: HashSet<NodeId> = found.iter().copied().collect();

    let owned_popups: HashSet<NodeId> = found
        .iter()
        .flat_map(|n| {
            ["aria-controls", "aria-owns"]
                .iter()
                .filter_map(|attr| doc.attr(*n, attr))
                .flat_map(|ids| ids.split_whitespace())
                .filter_map(|id| doc.get_element_by_id(doc.tree_root(*n), id))
                .collect::<Vec<_>>()
        })
        .collect();

    found
        .into_iter()
        .filter(|node| {
            if owned_popups.contains(node) && doc.role(*node).as_deref() == Some("listbox") {
                return false;
            }
            if NATIVE_CONTROLS.contains(&doc.tag(*node)) {
                return true;
            }
            let wraps_control = doc
                .composed_descendant_elements(*node)
                .into_iter()
                .any(|d| set.contains(&d) && is_native_or_aria(doc, d));
            !wraps_control
        })
        .collect()
}

// ============================================================================
// Filters
// ============================================================================

fn is_checkable(doc: &Document, node: NodeId) -> bool {
    matches!(doc.input_type(node).as_deref(), Some("checkbox" | "radio"))
        || doc
            .role(node)
            .is_some_and(|r| CHECKABLE_ROLES.contains(&r.as_str()))
}

/// Why a candidate should not be treated as fillable, if it should not.
pub fn skip_reason(doc: &Document, node: NodeId) -> Option<&'static str> {
    if doc.is_disabled(node)
        || doc.property(node, "disabled") == Some("true")
        || doc.attr(node, "aria-disabled") == Some("true")
    {
        return Some("disabled");
    }
    if (doc.has_attr(node, "readonly") && NATIVE_CONTROLS.contains(&doc.tag(node)))
        || doc.attr(node, "aria-readonly") == Some("true")
    {
        return Some("readonly");
    }
    let style = doc.computed_style(node);
    if style.is_visibility_hidden() && style.is_transparent() {
        return Some("invisible");
    }
    if doc.attr(node, "aria-hidden") == Some("true")
        || matches!(doc.role(node).as_deref(), Some("presentation" | "none"))
    {
        return Some("decorative");
    }
    let exempt_from_size = is_checkable(doc, node)
        || doc.input_type(node).as_deref() == Some("file")
        || doc.role(node).is_some();
    if !exempt_from_size && doc.bounding_rect(node).is_empty() {
        return Some("zero-size");
    }
    None
}

pub fn sort_composed(doc: &Document, nodes: &mut [NodeId]) {
    let order = doc.composed_order();
    nodes.sort_by_key(|n| order.get(n).copied().unwrap_or(usize::MAX));
}
