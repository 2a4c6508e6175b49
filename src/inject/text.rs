use async_trait::async_trait;

use crate::classify::text::current_text;
use crate::dom::dom_model::{Document, NodeId, collapse_whitespace};
use crate::dom::events::DomEvent;
use crate::inject::strategy::{
    ApplyOptions, AttemptOutcome, InjectionStrategy, InjectionTarget, Recorder, run_cascade,
};

// ============================================================================
// Text strategies
// ============================================================================

/// Controlled typing, content-editable write, direct write, execCommand, blur/refocus.
pub fn text_strategies() -> Vec<Box<dyn InjectionStrategy>> {
    vec![
        Box::new(ControlledTyping),
        Box::new(ContentEditableWrite),
        Box::new(DirectWrite),
        Box::new(ExecCommand),
        Box::new(BlurRefocus),
    ]
}

pub async fn apply_text(
    doc: &mut Document,
    target: &InjectionTarget,
    options: &ApplyOptions,
    recorder: &mut Recorder<'_>,
) -> bool {
    run_cascade(doc, target, &text_strategies(), options, recorder).await
}

fn shows_text(doc: &Document, target: &InjectionTarget) -> bool {
    let current = current_text(doc, target.element, target.field_type);
    current == target.value || collapse_whitespace(&current) == collapse_whitespace(&target.value)
}

fn is_native_text_host(doc: &Document, node: NodeId) -> bool {
    matches!(doc.tag(node), "input" | "textarea")
}

/// Raw write without events: value property, text content, or ARIA value.
fn write_raw(doc: &mut Document, node: NodeId, value: &str) {
    if is_native_text_host(doc, node) {
        doc.set_value(node, value);
    } else if doc.is_content_editable(node) {
        doc.set_text_content(node, value);
    } else if doc.has_attr(node, "aria-valuenow") || matches!(doc.role(node).as_deref(), Some("slider" | "spinbutton")) {
        doc.set_attr(node, "aria-valuenow", value);
    } else {
        doc.set_text_content(node, value);
    }
}

/// Keystroke emulation for elements whose value a reactive layer owns.
pub struct ControlledTyping;

#[async_trait(?Send)]
impl InjectionStrategy for ControlledTyping {
    fn name(&self) -> &'static str {
        "controlled-typing"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        target.framework.is_controlled() && doc.is_text_editable(target.element)
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        let el = target.element;
        doc.focus(el);
        doc.dispatch_event(DomEvent::composition("compositionstart", el, ""));
        write_raw(doc, el, "");

        let mut typed = String::new();
        for ch in target.value.chars() {
            let key = ch.to_string();
            doc.dispatch_event(DomEvent::key("keydown", el, &key));
            doc.dispatch_event(DomEvent::before_input(el, &key));
            typed.push(ch);
            write_raw(doc, el, &typed);
            doc.dispatch_event(DomEvent::input(el, Some(&key)));
            doc.dispatch_event(DomEvent::key("keyup", el, &key));
            tokio::task::yield_now().await;
        }

        doc.dispatch_event(DomEvent::composition("compositionupdate", el, &target.value));
        doc.dispatch_event(DomEvent::composition("compositionend", el, &target.value));
        doc.dispatch_event(DomEvent::change(el));
        doc.blur(el);
        AttemptOutcome::Applied
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        shows_text(doc, target)
    }
}

pub struct ContentEditableWrite;

#[async_trait(?Send)]
impl InjectionStrategy for ContentEditableWrite {
    fn name(&self) -> &'static str {
        "contenteditable-write"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        !is_native_text_host(doc, target.element) && doc.is_content_editable(target.element)
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        let el = target.element;
        doc.focus(el);
        doc.set_text_content(el, &target.value);
        doc.dispatch_event(DomEvent::input(el, Some(&target.value)));
        doc.blur(el);
        AttemptOutcome::Applied
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        shows_text(doc, target)
    }
}

/// Property write followed by `input` and `change`.
pub struct DirectWrite;

#[async_trait(?Send)]
impl InjectionStrategy for DirectWrite {
    fn name(&self) -> &'static str {
        "direct-write"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        !doc.is_disabled(target.element)
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        let el = target.element;
        write_raw(doc, el, &target.value);
        doc.dispatch_event(DomEvent::input(el, None));
        doc.dispatch_event(DomEvent::change(el));
        AttemptOutcome::Applied
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        shows_text(doc, target)
    }
}

pub struct ExecCommand;

#[async_trait(?Send)]
impl InjectionStrategy for ExecCommand {
    fn name(&self) -> &'static str {
        "exec-command"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        doc.is_text_editable(target.element)
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        doc.focus(target.element);
        if doc.exec_insert_text(&target.value) {
            AttemptOutcome::Applied
        } else {
            AttemptOutcome::Failed("insertText rejected".to_string())
        }
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        shows_text(doc, target)
    }
}

/// Last resort: drop focus, take it back, write again.
pub struct BlurRefocus;

#[async_trait(?Send)]
impl InjectionStrategy for BlurRefocus {
    fn name(&self) -> &'static str {
        "blur-refocus"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        doc.is_text_editable(target.element)
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        let el = target.element;
        doc.blur(el);
        tokio::task::yield_now().await;
        doc.focus(el);
        write_raw(doc, el, &target.value);
        doc.dispatch_event(DomEvent::input(el, Some(&target.value)));
        doc.dispatch_event(DomEvent::change(el));
        doc.blur(el);
        AttemptOutcome::Applied
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        shows_text(doc, target)
    }
}
