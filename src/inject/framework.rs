use std::fmt;

use serde::Serialize;

use crate::dom::dom_model::{Document, NodeId};

/// Which rendering layer an element most likely belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkHint {
    React,
    Vue,
    Angular,
    Svelte,
    Native,
}

impl FrameworkHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::React => "react",
            Self::Vue => "vue",
            Self::Angular => "angular",
            Self::Svelte => "svelte",
            Self::Native => "native",
        }
    }

    /// Whether the element's value is owned by a reactive layer.
    pub fn is_controlled(&self) -> bool {
        *self != Self::Native
    }
}

impl fmt::Display for FrameworkHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Detector = fn(&Document, NodeId) -> bool;

/// Checked in order; the first detector that fires names the framework.
const DETECTORS: &[(Detector, FrameworkHint)] = &[
    (looks_like_react, FrameworkHint::React),
    (looks_like_vue, FrameworkHint::Vue),
    (looks_like_angular, FrameworkHint::Angular),
    (looks_like_svelte, FrameworkHint::Svelte),
];

/// How many composed ancestors are inspected for root markers.
const ANCESTOR_SEARCH_DEPTH: usize = 8;

pub fn detect_framework(doc: &Document, node: NodeId) -> FrameworkHint {
    DETECTORS
        .iter()
        .find(|(detector, _)| detector(doc, node))
        .map(|(_, hint)| *hint)
        .unwrap_or(FrameworkHint::Native)
}

fn has_attr_prefix(doc: &Document, node: NodeId, prefix: &str) -> bool {
    doc.element(node)
        .is_some_and(|el| el.attrs.iter().any(|(k, _)| k.starts_with(prefix)))
}

fn self_and_ancestors(doc: &Document, node: NodeId) -> impl Iterator<Item = NodeId> {
    std::iter::once(node).chain(doc.composed_ancestors(node).into_iter().take(ANCESTOR_SEARCH_DEPTH))
}

fn looks_like_react(doc: &Document, node: NodeId) -> bool {
    ["__reactFiber$", "__reactProps$", "__reactInternalInstance$", "_valueTracker"]
        .iter()
        .any(|p| doc.has_property_prefix(node, p))
        || self_and_ancestors(doc, node).any(|n| doc.has_attr(n, "data-reactroot"))
}

fn looks_like_vue(doc: &Document, node: NodeId) -> bool {
    ["__vue__", "__vueParentComponent", "__vue_app__", "_vei"]
        .iter()
        .any(|p| doc.has_property_prefix(node, p))
        || has_attr_prefix(doc, node, "data-v-")
        || self_and_ancestors(doc, node).any(|n| doc.has_attr(n, "data-v-app"))
}

fn looks_like_angular(doc: &Document, node: NodeId) -> bool {
    has_attr_prefix(doc, node, "_ngcontent-")
        || has_attr_prefix(doc, node, "ng-reflect-")
        || doc.has_class(node, "ng-pristine")
        || doc.has_class(node, "ng-untouched")
        || self_and_ancestors(doc, node).any(|n| doc.has_attr(n, "ng-version"))
}

fn looks_like_svelte(doc: &Document, node: NodeId) -> bool {
    doc.has_property_prefix(node, "__svelte")
        || doc
            .element(node)
            .is_some_and(|el| el.classes().any(|c| c.starts_with("svelte-")))
}
