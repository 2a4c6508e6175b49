use std::rc::Rc;

use crate::dom::dom_model::{Document, NodeId};

/// Listener callback. Handlers get mutable access to the document so they can
/// emulate whatever the host page's rendering layer does in response.
pub type EventHandler = Rc<dyn Fn(&mut Document, &DomEvent)>;

#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    pub event_type: String,
    pub target: NodeId,
    pub bubbles: bool,
    pub composed: bool,
    /// InputEvent.data / CompositionEvent.data
    pub data: Option<String>,
    /// InputEvent.inputType
    pub input_type: Option<String>,
    /// KeyboardEvent.key
    pub key: Option<String>,
    /// File names carried by a drop's DataTransfer
    pub files: Vec<String>,
}

impl DomEvent {
    pub fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            bubbles: true,
            composed: true,
            data: None,
            input_type: None,
            key: None,
            files: vec![],
        }
    }

    pub fn non_bubbling(mut self) -> Self {
        self.bubbles = false;
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_input_type(mut self, input_type: &str) -> Self {
        self.input_type = Some(input_type.to_string());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    // ---- Common event shapes ----

    pub fn input(target: NodeId, data: Option<&str>) -> Self {
        let event = Self::new("input", target).with_input_type("insertText");
        match data {
            Some(d) => event.with_data(d),
            None => event,
        }
    }

    pub fn before_input(target: NodeId, data: &str) -> Self {
        Self::new("beforeinput", target)
            .with_input_type("insertText")
            .with_data(data)
    }

    pub fn change(target: NodeId) -> Self {
        Self::new("change", target)
    }

    pub fn key(event_type: &str, target: NodeId, key: &str) -> Self {
        Self::new(event_type, target).with_key(key)
    }

    pub fn composition(event_type: &str, target: NodeId, data: &str) -> Self {
        Self::new(event_type, target).with_data(data)
    }

    pub fn focus(target: NodeId) -> Self {
        Self::new("focus", target).non_bubbling()
    }

    pub fn blur(target: NodeId) -> Self {
        Self::new("blur", target).non_bubbling()
    }
}

/// Outcome of a dispatch: how many listeners saw the event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchResult {
    pub handled: usize,
}

impl DispatchResult {
    pub fn was_handled(&self) -> bool {
        self.handled > 0
    }
}

pub(crate) struct Listener {
    pub(crate) node: NodeId,
    pub(crate) event_type: String,
    pub(crate) handler: EventHandler,
}
