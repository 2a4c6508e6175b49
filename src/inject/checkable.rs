use async_trait::async_trait;
use tracing::debug;

use crate::classify::checkable::member_value;
use crate::classify::kind::checked_state;
use crate::dom::dom_model::{Document, NodeId};
use crate::dom::events::DomEvent;
use crate::field::field_model::{Field, FieldOption};
use crate::locate::label::member_label;
use crate::locate::locator::relocate_member;
use crate::inject::strategy::{
    ApplyOptions, AttemptOutcome, InjectionStrategy, InjectionTarget, Recorder, run_cascade,
};

// ============================================================================
// Checkable strategies
// ============================================================================

const CHECKED_CLASSES: &[&str] = &["checked", "is-checked", "active", "selected"];
const SEMANTIC_CONTAINERS: &[&str] = &["fieldset"];

pub fn checkable_strategies() -> Vec<Box<dyn InjectionStrategy>> {
    vec![
        Box::new(NativeClick),
        Box::new(NativeProperty),
        Box::new(AriaState),
        Box::new(CustomClassClick),
    ]
}

fn is_native_checkable(doc: &Document, node: NodeId) -> bool {
    matches!(doc.input_type(node).as_deref(), Some("checkbox" | "radio"))
}

fn is_radio_like(doc: &Document, node: NodeId) -> bool {
    doc.input_type(node).as_deref() == Some("radio")
        || doc.role(node).as_deref() == Some("radio")
        || doc.class_attr(node).to_lowercase().contains("custom-radio")
}

fn shows_desired(doc: &Document, target: &InjectionTarget) -> bool {
    checked_state(doc, target.element) == target.checked
}

/// Pointer click; native activation and page handlers do the rest.
pub struct NativeClick;

#[async_trait(?Send)]
impl InjectionStrategy for NativeClick {
    fn name(&self) -> &'static str {
        "native-click"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        !doc.is_disabled(target.element)
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        if shows_desired(doc, target) {
            return AttemptOutcome::NoEffect;
        }
        doc.click(target.element);
        AttemptOutcome::Applied
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        shows_desired(doc, target)
    }
}

/// `checked` property write plus `input`/`change`.
pub struct NativeProperty;

#[async_trait(?Send)]
impl InjectionStrategy for NativeProperty {
    fn name(&self) -> &'static str {
        "native-property"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        is_native_checkable(doc, target.element) && !doc.is_disabled(target.element)
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        let el = target.element;
        if target.checked && doc.input_type(el).as_deref() == Some("radio") {
            doc.check_radio_exclusive(el);
        } else {
            doc.set_checked(el, target.checked);
        }
        doc.dispatch_event(DomEvent::new("input", el));
        doc.dispatch_event(DomEvent::change(el));
        AttemptOutcome::Applied
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        shows_desired(doc, target)
    }
}

pub struct AriaState;

#[async_trait(?Send)]
impl InjectionStrategy for AriaState {
    fn name(&self) -> &'static str {
        "aria-state"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        !is_native_checkable(doc, target.element)
            && (doc.has_attr(target.element, "aria-checked")
                || matches!(doc.role(target.element).as_deref(), Some("checkbox" | "radio" | "switch")))
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        let el = target.element;
        doc.set_attr(el, "aria-checked", if target.checked { "true" } else { "false" });
        doc.dispatch_event(DomEvent::new("input", el));
        doc.dispatch_event(DomEvent::change(el));
        AttemptOutcome::Applied
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        shows_desired(doc, target)
    }
}

/// Click, then force the state class if the widget still disagrees.
pub struct CustomClassClick;

#[async_trait(?Send)]
impl InjectionStrategy for CustomClassClick {
    fn name(&self) -> &'static str {
        "custom-class-click"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        !is_native_checkable(doc, target.element) && !doc.has_attr(target.element, "aria-checked")
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        let el = target.element;
        doc.click(el);
        if checked_state(doc, el) != target.checked {
            if target.checked {
                doc.add_class(el, "checked");
            } else {
                for class in CHECKED_CLASSES {
                    doc.remove_class(el, class);
                }
            }
        }
        AttemptOutcome::Applied
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        shows_desired(doc, target)
    }
}

// ============================================================================
// Group handling
// ============================================================================

/// Member elements of a grouped field, re-located when their handle went stale.
pub fn live_options(doc: &Document, field: &Field) -> Vec<(NodeId, FieldOption)> {
    field
        .options
        .iter()
        .flatten()
        .filter_map(|o| relocate_member(doc, o.xpath.as_deref(), o.element).map(|n| (n, o.clone())))
        .collect()
}

fn option_matches(doc: &Document, node: NodeId, option: &FieldOption, wanted: &str) -> bool {
    let wanted = wanted.trim();
    option.value == wanted
        || option.text.eq_ignore_ascii_case(wanted)
        || option.value.eq_ignore_ascii_case(wanted)
        || member_value(doc, node).eq_ignore_ascii_case(wanted)
        || member_label(doc, node).eq_ignore_ascii_case(wanted)
}

/// The radio member that should end up checked.
pub fn pick_radio(doc: &Document, members: &[(NodeId, FieldOption)], wanted: &str) -> Option<NodeId> {
    let wanted_lower = wanted.trim().to_lowercase();
    members
        .iter()
        .find(|(n, o)| option_matches(doc, *n, o, wanted))
        .or_else(|| {
            if wanted_lower.is_empty() {
                return None;
            }
            members
                .iter()
                .find(|(_, o)| o.text.to_lowercase().contains(&wanted_lower))
        })
        .map(|(n, _)| *n)
}

fn force_unchecked(doc: &mut Document, node: NodeId) {
    if is_native_checkable(doc, node) {
        doc.set_checked(node, false);
    }
    if doc.has_attr(node, "aria-checked") {
        doc.set_attr(node, "aria-checked", "false");
    }
    for class in CHECKED_CLASSES {
        doc.remove_class(node, class);
    }
}

/// Every other element of the chosen radio's logical group.
pub fn radio_peers(doc: &Document, chosen: NodeId, members: &[NodeId]) -> Vec<NodeId> {
    let mut peers: Vec<NodeId> = Vec::new();
    let push = |n: NodeId, peers: &mut Vec<NodeId>| {
        if n != chosen && !peers.contains(&n) {
            peers.push(n);
        }
    };

    let name = doc.attr(chosen, "name").filter(|n| !n.is_empty());
    if let Some(name) = name {
        for n in doc.composed_descendant_elements(doc.tree_root(chosen)) {
            if is_radio_like(doc, n) && doc.attr(n, "name") == Some(name) {
                push(n, &mut peers);
            }
        }
    }

    // Unnamed radios in the same radiogroup or fieldset; other named groups stay untouched
    let semantic = doc.ancestors(chosen).into_iter().find(|a| {
        doc.role(*a).as_deref() == Some("radiogroup") || SEMANTIC_CONTAINERS.contains(&doc.tag(*a))
    });
    if let Some(container) = semantic {
        for n in doc.composed_descendant_elements(container) {
            let same_group = match doc.attr(n, "name").filter(|v| !v.is_empty()) {
                Some(other) => Some(other) == name,
                None => true,
            };
            if is_radio_like(doc, n) && same_group {
                push(n, &mut peers);
            }
        }
    }

    for m in members {
        push(*m, &mut peers);
    }
    peers
}

pub async fn apply_checkable(
    doc: &mut Document,
    target: &InjectionTarget,
    options: &ApplyOptions,
    recorder: &mut Recorder<'_>,
) -> bool {
    run_cascade(doc, target, &checkable_strategies(), options, recorder).await
}

/// Check the requested radio and clear the rest of its group.
pub async fn apply_radio_group(
    doc: &mut Document,
    field: &Field,
    base: &InjectionTarget,
    options: &ApplyOptions,
    recorder: &mut Recorder<'_>,
) -> bool {
    let members = live_options(doc, field);
    let Some(chosen) = pick_radio(doc, &members, &base.value) else {
        recorder
            .report
            .note(format!("no radio option matches '{}'", base.value));
        return false;
    };

    let target = InjectionTarget {
        element: chosen,
        checked: true,
        ..base.clone()
    };
    if !apply_checkable(doc, &target, options, recorder).await {
        return false;
    }

    let member_nodes: Vec<NodeId> = members.iter().map(|(n, _)| *n).collect();
    let peers = radio_peers(doc, chosen, &member_nodes);
    for peer in &peers {
        if checked_state(doc, *peer) {
            force_unchecked(doc, *peer);
        }
    }
    debug!(chosen = chosen.0, peers = peers.len(), "radio peers cleared");
    peers.iter().all(|p| !checked_state(doc, *p))
}

/// Set each member to whether its value was requested.
pub async fn apply_checkbox_group(
    doc: &mut Document,
    field: &Field,
    base: &InjectionTarget,
    options: &ApplyOptions,
    recorder: &mut Recorder<'_>,
) -> bool {
    let members = live_options(doc, field);
    if members.is_empty() {
        recorder.report.note("checkbox group has no live members");
        return false;
    }

    let mut all_ok = true;
    for (node, option) in &members {
        let desired = base.values.iter().any(|w| option_matches(doc, *node, option, w));
        if checked_state(doc, *node) == desired {
            continue;
        }
        let target = InjectionTarget {
            element: *node,
            checked: desired,
            ..base.clone()
        };
        all_ok &= apply_checkable(doc, &target, options, recorder).await;
    }
    all_ok
}
