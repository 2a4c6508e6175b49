use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::classify::kind::element_kind;
use crate::config::GroupingConfig;
use crate::dom::dom_model::{Document, NodeId};
use crate::field::field_model::{FieldType, GroupType};
use crate::locate::label::{enclosing_legend, humanize, resolve_label};

// ============================================================================
// Checkable grouping
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSource {
    Name,
    Container,
    Proximity,
    Singleton,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckableGroup {
    pub kind: GroupType,
    pub name: String,
    pub members: Vec<NodeId>,
    pub container: Option<NodeId>,
    pub label: String,
    pub source: GroupSource,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupingResult {
    pub groups: Vec<CheckableGroup>,
    /// Checkboxes that stay single fields
    pub independent: Vec<NodeId>,
}

static GROUP_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(radio|checkbox|check|option|choice)[-_]?(group|list|set|wrapper)|btn-group|form-check-group")
        .expect("group class regex")
});

const UNRELATED_PENALTY: i32 = 5;

/// Cluster radios and checkboxes: name, then semantic container, then
/// proximity, then singletons (radios) or independence (checkboxes).
pub fn group_checkables(
    doc: &Document,
    radios: &[NodeId],
    checkboxes: &[NodeId],
    config: &GroupingConfig,
) -> GroupingResult {
    let mut result = GroupingResult::default();

    let leftover_radios = group_kind(doc, radios, GroupType::Radio, config, &mut result.groups);
    for radio in leftover_radios {
        let name = doc
            .attr(radio, "name")
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("radio-{}", radio.0));
        let label = resolve_label(doc, radio);
        result.groups.push(CheckableGroup {
            kind: GroupType::Radio,
            name,
            members: vec![radio],
            container: None,
            label,
            source: GroupSource::Singleton,
        });
    }

    result.independent = group_kind(doc, checkboxes, GroupType::Checkbox, config, &mut result.groups);

    debug!(
        groups = result.groups.len(),
        independent = result.independent.len(),
        "checkables grouped"
    );
    result
}

/// Run the name, container and proximity stages; return what is left.
fn group_kind(
    doc: &Document,
    elements: &[NodeId],
    kind: GroupType,
    config: &GroupingConfig,
    groups: &mut Vec<CheckableGroup>,
) -> Vec<NodeId> {
    let min_members = match kind {
        GroupType::Radio => config.radio_min_members.max(1),
        GroupType::Checkbox => config.checkbox_min_members.max(1),
    };

    // 1. Shared name within the same tree and form
    let mut by_name: Vec<((String, NodeId, Option<NodeId>), Vec<NodeId>)> = Vec::new();
    let mut remaining = Vec::new();
    for el in elements {
        let Some(name) = doc.attr(*el, "name").filter(|n| !n.is_empty()) else {
            remaining.push(*el);
            continue;
        };
        let key = (name.to_string(), doc.tree_root(*el), doc.form_owner(*el));
        match by_name.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(*el),
            None => by_name.push((key, vec![*el])),
        }
    }
    for ((name, _, _), members) in by_name {
        if members.len() >= min_members {
            let container = doc.common_ancestor(&members);
            groups.push(make_group(doc, kind, name, members, container, GroupSource::Name));
        } else {
            remaining.extend(members);
        }
    }

    // 2. Best enclosing semantic container
    let mut by_container: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut container_order = Vec::new();
    let mut unclustered = Vec::new();
    for el in &remaining {
        match best_semantic_container(doc, *el, &remaining, kind, config) {
            Some(c) => {
                if !by_container.contains_key(&c) {
                    container_order.push(c);
                }
                by_container.entry(c).or_default().push(*el);
            }
            None => unclustered.push(*el),
        }
    }
    for container in container_order {
        let members = by_container.remove(&container).unwrap_or_default();
        if members.len() >= min_members {
            let name = container_name(doc, container);
            groups.push(make_group(doc, kind, name, members, Some(container), GroupSource::Container));
        } else {
            unclustered.extend(members);
        }
    }

    // 3. Proximity: shared parent, looking through label wrappers
    let proximity_on = match kind {
        GroupType::Radio => config.proximity_grouping,
        GroupType::Checkbox => config.proximity_grouping && config.checkbox_proximity,
    };
    if !proximity_on {
        return sorted(doc, unclustered);
    }
    let mut by_parent: Vec<(NodeId, Vec<NodeId>)> = Vec::new();
    let mut leftover = Vec::new();
    for el in unclustered {
        let Some(parent) = proximity_parent(doc, el) else {
            leftover.push(el);
            continue;
        };
        match by_parent.iter_mut().find(|(p, _)| *p == parent) {
            Some((_, members)) => members.push(el),
            None => by_parent.push((parent, vec![el])),
        }
    }
    for (parent, members) in by_parent {
        if members.len() >= min_members.max(2) {
            let name = container_name(doc, parent);
            groups.push(make_group(doc, kind, name, members, Some(parent), GroupSource::Proximity));
        } else {
            leftover.extend(members);
        }
    }
    sorted(doc, leftover)
}

fn sorted(doc: &Document, mut nodes: Vec<NodeId>) -> Vec<NodeId> {
    crate::discovery::discovery::sort_composed(doc, &mut nodes);
    nodes
}

fn proximity_parent(doc: &Document, node: NodeId) -> Option<NodeId> {
    let mut parent = doc.parent_element(node)?;
    while doc.tag(parent) == "label" {
        parent = doc.parent_element(parent)?;
    }
    Some(parent)
}

fn kind_of(doc: &Document, node: NodeId) -> Option<FieldType> {
    element_kind(doc, node).map(|k| k.field_type())
}

/// Highest-scoring semantic wrapper within reach, if any scores above zero.
fn best_semantic_container(
    doc: &Document,
    node: NodeId,
    peers: &[NodeId],
    kind: GroupType,
    config: &GroupingConfig,
) -> Option<NodeId> {
    let wanted = match kind {
        GroupType::Radio => FieldType::Radio,
        GroupType::Checkbox => FieldType::Checkbox,
    };

    doc.ancestors(node)
        .into_iter()
        .take(config.max_container_depth)
        .filter_map(|ancestor| {
            let role = doc.role(ancestor);
            let base = match (role.as_deref(), doc.tag(ancestor)) {
                (Some("radiogroup"), _) => 40,
                (Some("group"), _) => 30,
                (_, "fieldset") => 25,
                _ if GROUP_CLASS.is_match(doc.class_attr(ancestor)) => 15,
                _ => return None,
            };
            let inside = doc.composed_descendant_elements(ancestor);
            let members = peers.iter().filter(|p| inside.contains(p)).count() as i32;
            let unrelated = inside
                .iter()
                .filter(|d| match kind_of(doc, **d) {
                    Some(t) => t != wanted && matches!(doc.tag(**d), "input" | "select" | "textarea"),
                    None => false,
                })
                .count() as i32;
            let score = base + members * 2 - unrelated * UNRELATED_PENALTY;
            (score > 0).then_some((ancestor, score))
        })
        .max_by_key(|(_, score)| *score)
        .map(|(ancestor, _)| ancestor)
}

fn container_name(doc: &Document, container: NodeId) -> String {
    doc.attr(container, "id")
        .or_else(|| doc.attr(container, "data-name"))
        .or_else(|| doc.attr(container, "name"))
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("group-{}", container.0))
}

fn make_group(
    doc: &Document,
    kind: GroupType,
    name: String,
    members: Vec<NodeId>,
    container: Option<NodeId>,
    source: GroupSource,
) -> CheckableGroup {
    let label = group_label(doc, &members, container, &name);
    CheckableGroup {
        kind,
        name,
        members,
        container,
        label,
        source,
    }
}

/// Legend, then labelling attributes on the container, then the humanized name.
fn group_label(doc: &Document, members: &[NodeId], container: Option<NodeId>, name: &str) -> String {
    if let Some(first) = members.first() {
        if let Some(legend) = enclosing_legend(doc, *first) {
            let fieldset = doc.parent(legend);
            if fieldset.is_some_and(|f| members.iter().all(|m| doc.contains(f, *m))) {
                let text = doc.normalized_text(legend);
                if !text.is_empty() {
                    return text;
                }
            }
        }
    }

    let mut labelled = Vec::new();
    if let Some(c) = container {
        labelled.push(c);
        labelled.extend(
            doc.ancestors(c)
                .into_iter()
                .filter(|a| matches!(doc.role(*a).as_deref(), Some("radiogroup" | "group")))
                .take(1),
        );
    }
    for node in labelled {
        for attr in ["aria-label", "data-label"] {
            if let Some(text) = doc.attr(node, attr).filter(|t| !t.trim().is_empty()) {
                return text.trim().to_string();
            }
        }
        if let Some(ids) = doc.attr(node, "aria-labelledby") {
            let text = ids
                .split_whitespace()
                .filter_map(|id| doc.get_element_by_id(doc.tree_root(node), id))
                .map(|n| doc.normalized_text(n))
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                return text;
            }
        }
    }

    humanize(name)
}
