use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::kind::element_kind;
use crate::config::{ContainerConfig, EngineConfig};
use crate::container::keywords::{CONTAINER_KEYWORDS, SUBMIT_TEXT};
use crate::discovery::discover_fields;
use crate::dom::dom_model::{Document, NodeId};
use crate::field::field_model::FieldType;

// ============================================================================
// Container scoring
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerScore {
    pub score: i32,
    pub reasons: Vec<String>,
    pub field_count: usize,
}

impl ContainerScore {
    fn add(&mut self, points: i32, reason: impl Into<String>) {
        if points != 0 {
            self.score += points;
            self.reasons.push(format!("{} ({:+})", reason.into(), points));
        }
    }
}

const LANDMARK_TAGS: &[&str] = &["nav", "header", "footer", "aside", "menu"];
const MAX_KEYWORD_POINTS: i32 = 25;

fn count_tier(count: usize) -> i32 {
    match count {
        0 => 0,
        1 => 5,
        2 => 10,
        3..=4 => 15,
        5..=9 => 20,
        _ => 25,
    }
}

/// Form-likeness of `region` given the discovered field elements.
pub fn score_container(
    doc: &Document,
    region: NodeId,
    fields: &[NodeId],
    config: &ContainerConfig,
) -> ContainerScore {
    let inside: Vec<NodeId> = fields
        .iter()
        .copied()
        .filter(|f| *f != region && doc.composed_contains(region, *f))
        .collect();
    let types: HashSet<FieldType> = inside
        .iter()
        .filter_map(|f| element_kind(doc, *f))
        .map(|k| k.field_type())
        .collect();

    let mut result = ContainerScore {
        score: 0,
        reasons: vec![],
        field_count: inside.len(),
    };

    result.add(count_tier(inside.len()), format!("{} fields", inside.len()));
    result.add((types.len() as i32 * 4).min(16), format!("{} field types", types.len()));

    let text_like = types.iter().any(|t| t.is_text_like() && *t != FieldType::Email);
    if text_like && types.contains(&FieldType::Email) {
        result.add(5, "text+email");
    }
    if text_like && types.contains(&FieldType::Select) {
        result.add(3, "select+text");
    }
    if types.contains(&FieldType::Checkbox) && types.contains(&FieldType::Radio) {
        result.add(3, "checkbox+radio");
    }
    if types.contains(&FieldType::File) {
        result.add(3, "file input");
    }

    let tag = doc.tag(region);
    let role = doc.role(region);
    match (tag, role.as_deref()) {
        ("form", _) => result.add(20, "form element"),
        ("fieldset", _) => result.add(10, "fieldset element"),
        (_, Some("form")) => result.add(15, "role=form"),
        (_, Some("group")) => result.add(5, "role=group"),
        _ => {}
    }
    if LANDMARK_TAGS.contains(&tag) {
        result.add(-25, format!("<{}> landmark", tag));
    }

    let keyword_points = keyword_score(doc, region);
    result.add(keyword_points, "class/id keywords");

    let descendants = doc.composed_descendant_elements(region);
    if descendants.iter().any(|d| doc.tag(*d) == "legend") {
        result.add(5, "legend");
    }
    if descendants.iter().any(|d| is_submit_like(doc, *d)) {
        result.add(8, "submit button");
    }
    let radios = inside
        .iter()
        .filter(|f| element_kind(doc, **f).map(|k| k.field_type()) == Some(FieldType::Radio))
        .count();
    if radios >= 2 {
        result.add(3, "radio set");
    }
    let checkboxes = inside
        .iter()
        .filter(|f| element_kind(doc, **f).map(|k| k.field_type()) == Some(FieldType::Checkbox))
        .count();
    if checkboxes >= 2 {
        result.add(3, "checkbox set");
    }

    if doc.is_element(region) {
        if !doc.is_rendered(region) {
            result.add(-10, "not rendered");
        } else {
            let rect = doc.bounding_rect(region);
            if rect.width * rect.height >= 10_000.0 {
                result.add(3, "visible area");
            }
        }
    }

    let depth = doc.depth(region);
    if depth > config.depth_penalty_start {
        result.add(-((depth - config.depth_penalty_start) as i32), "nesting depth");
    }

    result
}

fn keyword_score(doc: &Document, region: NodeId) -> i32 {
    let Some(el) = doc.element(region) else {
        return 0;
    };
    let haystack: Vec<&str> = el
        .attrs
        .iter()
        .filter(|(k, _)| k == "class" || k == "id" || k.starts_with("data-"))
        .filter(|(k, _)| !k.starts_with("data-formscope-"))
        .map(|(_, v)| v.as_str())
        .collect();
    let text = haystack.join(" ");
    let total: i32 = CONTAINER_KEYWORDS
        .iter()
        .filter(|(re, _)| re.is_match(&text))
        .map(|(_, w)| *w)
        .sum();
    total.clamp(-MAX_KEYWORD_POINTS, MAX_KEYWORD_POINTS)
}

fn is_submit_like(doc: &Document, node: NodeId) -> bool {
    match doc.tag(node) {
        "button" => {
            doc.attr(node, "type").is_none_or(|t| t.eq_ignore_ascii_case("submit"))
                || SUBMIT_TEXT.is_match(&doc.normalized_text(node))
        }
        "input" => matches!(doc.input_type(node).as_deref(), Some("submit" | "image")),
        _ => doc.role(node).as_deref() == Some("button") && SUBMIT_TEXT.is_match(&doc.normalized_text(node)),
    }
}

// ============================================================================
// Selection and expansion
// ============================================================================

/// Highest score wins; ties go to the candidate holding more fields.
pub fn pick_best(
    doc: &Document,
    candidates: &[NodeId],
    fields: &[NodeId],
    config: &ContainerConfig,
) -> Option<(NodeId, ContainerScore)> {
    candidates
        .iter()
        .map(|c| (*c, score_container(doc, *c, fields, config)))
        .max_by(|(_, a), (_, b)| a.score.cmp(&b.score).then(a.field_count.cmp(&b.field_count)))
}

/// Walk outward while an ancestor (parent or grandparent) holds clearly more
/// fields and still scores acceptably.
pub fn expand_outward(doc: &Document, start: NodeId, fields: &[NodeId], config: &ContainerConfig) -> NodeId {
    let mut current = start;
    let mut current_count = score_container(doc, current, fields, config).field_count;

    loop {
        let parent = doc.composed_parent_element(current);
        let grandparent = parent.and_then(|p| doc.composed_parent_element(p));

        let mut next = None;
        for candidate in [grandparent, parent].into_iter().flatten() {
            let score = score_container(doc, candidate, fields, config);
            let grows = score.field_count as f64 > current_count as f64 * config.expand_ratio;
            if grows && score.score >= config.min_acceptable_score {
                next = Some((candidate, score.field_count));
                break;
            }
        }

        match next {
            Some((candidate, count)) => {
                debug!(from = current.0, to = candidate.0, fields = count, "container expanded");
                current = candidate;
                current_count = count;
            }
            None => return current,
        }
    }
}

/// Settle the region detection runs in.
pub fn resolve_container(doc: &Document, container: Option<NodeId>, config: &EngineConfig) -> NodeId {
    let root = doc.root();
    let all_fields = discover_fields(doc, root, &config.discovery);

    if let Some(requested) = container {
        if !doc.is_element(requested) && !doc.is_shadow_root(requested) && !doc.is_document(requested) {
            warn!(node = requested.0, "requested container is not a node, using document");
            return root;
        }
        if !doc.is_element(requested) {
            return requested;
        }
        let score = score_container(doc, requested, &all_fields, &config.container);
        if score.score < config.container.min_acceptable_score {
            info!(node = requested.0, score = score.score, "requested container scores poorly");
        }
        // A lone field is a seed, not a region
        if score.field_count == 1 {
            return expand_outward(doc, requested, &all_fields, &config.container);
        }
        return requested;
    }

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for field in &all_fields {
        for ancestor in doc.composed_ancestors(*field) {
            if seen.insert(ancestor) {
                candidates.push(ancestor);
            }
        }
    }

    let Some((best, score)) = pick_best(doc, &candidates, &all_fields, &config.container) else {
        debug!("no container candidates, using document");
        return root;
    };
    info!(
        node = best.0,
        tag = doc.tag(best),
        score = score.score,
        fields = score.field_count,
        "container chosen"
    );
    expand_outward(doc, best, &all_fields, &config.container)
}
