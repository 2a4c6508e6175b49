use crate::dom::dom_model::{Document, NodeId, collapse_whitespace};

// ============================================================================
// Label resolution: ranked strategies, highest confidence wins
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    LabelFor,
    EnclosingLabel,
    AriaLabelledBy,
    AriaLabel,
    Placeholder,
    Title,
    PrecedingText,
    Legend,
    AncestorText,
    ShadowHost,
    Humanized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelCandidate {
    pub text: String,
    pub source: LabelSource,
    pub confidence: f32,
}

const MAX_LABEL_LEN: usize = 120;
const ANCESTOR_TEXT_DEPTH: usize = 3;
const CONTROL_TAGS: &[&str] = &["input", "select", "textarea", "button", "option", "optgroup"];

/// Best label for `node`, or an empty string.
pub fn resolve_label(doc: &Document, node: NodeId) -> String {
    best_candidate(doc, node, &[])
        .map(|c| c.text)
        .unwrap_or_default()
}

/// Label for one member of a checkable group: group-level sources are skipped
/// so members do not all inherit the legend.
pub fn member_label(doc: &Document, node: NodeId) -> String {
    let excluded = [LabelSource::Legend, LabelSource::AncestorText, LabelSource::Humanized];
    if let Some(candidate) = best_candidate(doc, node, &excluded) {
        return candidate.text;
    }
    doc.attr(node, "value")
        .map(str::to_string)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| {
            let text = doc.normalized_text(node);
            clean_label(&text)
        })
}

pub fn best_candidate(doc: &Document, node: NodeId, excluded: &[LabelSource]) -> Option<LabelCandidate> {
    label_candidates(doc, node)
        .into_iter()
        .filter(|c| !excluded.contains(&c.source))
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
}

/// Every strategy that produced a non-empty label.
pub fn label_candidates(doc: &Document, node: NodeId) -> Vec<LabelCandidate> {
    let mut out = Vec::new();
    let mut push = |text: String, source: LabelSource, confidence: f32| {
        let text = clean_label(&text);
        if !text.is_empty() {
            out.push(LabelCandidate {
                text,
                source,
                confidence,
            });
        }
    };

    let root = doc.tree_root(node);

    if let Some(id) = doc.attr(node, "id").filter(|id| !id.is_empty()) {
        let explicit = doc
            .descendant_elements(root)
            .into_iter()
            .find(|l| doc.tag(*l) == "label" && doc.attr(*l, "for") == Some(id));
        if let Some(label) = explicit {
            push(label_text(doc, label), LabelSource::LabelFor, 1.0);
        }
    }

    if let Some(label) = doc.ancestors(node).into_iter().find(|a| doc.tag(*a) == "label") {
        push(label_text(doc, label), LabelSource::EnclosingLabel, 0.95);
    }

    if let Some(ids) = doc.attr(node, "aria-labelledby") {
        let text = ids
            .split_whitespace()
            .filter_map(|id| doc.get_element_by_id(root, id))
            .map(|n| doc.normalized_text(n))
            .collect::<Vec<_>>()
            .join(" ");
        push(text, LabelSource::AriaLabelledBy, 0.9);
    }

    if let Some(text) = doc.attr(node, "aria-label") {
        push(text.to_string(), LabelSource::AriaLabel, 0.85);
    }

    if let Some(text) = doc.attr(node, "placeholder") {
        push(text.to_string(), LabelSource::Placeholder, 0.7);
    }

    if let Some(text) = doc.attr(node, "title") {
        push(text.to_string(), LabelSource::Title, 0.65);
    }

    if let Some(text) = preceding_text(doc, node) {
        push(text, LabelSource::PrecedingText, 0.55);
    }

    if let Some(legend) = enclosing_legend(doc, node) {
        push(doc.normalized_text(legend), LabelSource::Legend, 0.5);
    }

    for ancestor in doc.ancestors(node).into_iter().take(ANCESTOR_TEXT_DEPTH) {
        let text = doc.own_text(ancestor);
        if !text.is_empty() {
            push(text, LabelSource::AncestorText, 0.4);
            break;
        }
    }

    if let Some(host) = doc.shadow_host(root) {
        if let Some(candidate) = best_candidate(doc, host, &[LabelSource::Humanized]) {
            push(candidate.text, LabelSource::ShadowHost, candidate.confidence * 0.9);
        }
    }

    let raw_name = doc
        .attr(node, "name")
        .filter(|n| !n.is_empty())
        .or_else(|| doc.attr(node, "id"));
    if let Some(name) = raw_name {
        push(humanize(name), LabelSource::Humanized, 0.3);
    }

    out
}

/// Text of a `<label>`, ignoring the text of controls nested inside it.
fn label_text(doc: &Document, label: NodeId) -> String {
    let mut parts = Vec::new();
    collect_text_skipping_controls(doc, label, &mut parts);
    collapse_whitespace(&parts.join(" "))
}

fn collect_text_skipping_controls(doc: &Document, node: NodeId, parts: &mut Vec<String>) {
    for child in doc.children(node) {
        if doc.is_element(*child) {
            if !CONTROL_TAGS.contains(&doc.tag(*child)) {
                collect_text_skipping_controls(doc, *child, parts);
            }
        } else if !doc.is_shadow_root(*child) {
            parts.push(doc.text_content(*child));
        }
    }
}

/// Nearest non-empty text before `node` among its siblings, stopping at
/// another control.
fn preceding_text(doc: &Document, node: NodeId) -> Option<String> {
    let parent = doc.parent(node)?;
    let siblings = doc.children(parent);
    let index = siblings.iter().position(|s| *s == node)?;
    for sibling in siblings[..index].iter().rev() {
        if doc.is_element(*sibling) {
            if CONTROL_TAGS.contains(&doc.tag(*sibling)) || doc.role(*sibling).is_some() {
                return None;
            }
            let text = label_text(doc, *sibling);
            if !text.is_empty() {
                return Some(text);
            }
        } else {
            let text = collapse_whitespace(&doc.text_content(*sibling));
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

pub fn enclosing_legend(doc: &Document, node: NodeId) -> Option<NodeId> {
    let fieldset = doc
        .ancestors(node)
        .into_iter()
        .find(|a| doc.tag(*a) == "fieldset")?;
    doc.element_children(fieldset)
        .into_iter()
        .find(|c| doc.tag(*c) == "legend")
}

/// Trim whitespace, trailing colons and required-asterisks; cap the length.
pub fn clean_label(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    let trimmed = collapsed
        .trim_end_matches(|c: char| c == ':' || c == '*' || c.is_whitespace())
        .trim_start_matches(|c: char| c == '*' || c.is_whitespace());
    if trimmed.chars().count() > MAX_LABEL_LEN {
        trimmed.chars().take(MAX_LABEL_LEN).collect::<String>().trim_end().to_string()
    } else {
        trimmed.to_string()
    }
}

/// `first_name`, `firstName`, `first-name[0]` → "First name".
pub fn humanize(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if c.is_uppercase() && prev_lower && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
            current.extend(c.to_lowercase());
        } else {
            prev_lower = false;
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    let words: Vec<String> = words
        .into_iter()
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .collect();
    let joined = words.join(" ");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
