use std::cell::RefCell;
use std::rc::Rc;

use formscope::dom::dom_model::{Document, NodeId};

// ============================================================================
// Emulated page behavior
// ============================================================================

/// A React-style controlled input: the component keeps its own state, takes
/// it from typed input, and re-renders the element from it on anything else.
pub fn make_controlled(doc: &mut Document, input: NodeId) -> Rc<RefCell<String>> {
    doc.set_property(input, "__reactProps$k3j2", "{}");
    let state = Rc::new(RefCell::new(String::new()));

    let on_input = Rc::clone(&state);
    doc.listen(input, "input", move |doc, event| {
        if event.data.is_some() {
            *on_input.borrow_mut() = doc.value(event.target);
        } else {
            let rendered = on_input.borrow().clone();
            doc.set_value(event.target, &rendered);
        }
    });

    let on_change = Rc::clone(&state);
    doc.listen(input, "change", move |doc, event| {
        let rendered = on_change.borrow().clone();
        doc.set_value(event.target, &rendered);
    });

    state
}

/// An input that clears itself on any `input` event carrying no text.
pub fn make_stubborn(doc: &mut Document, input: NodeId) {
    doc.listen(input, "input", |doc, event| {
        if event.data.is_none() {
            doc.set_value(event.target, "");
        }
    });
}

/// ARIA combobox whose listbox only renders after the trigger is clicked.
pub fn wire_combobox(doc: &mut Document, combobox: NodeId, listbox: NodeId) {
    doc.listen(combobox, "click", move |doc, _| {
        doc.remove_attr(listbox, "style");
    });
    for option in doc.element_children(listbox) {
        doc.listen(option, "click", move |doc, event| {
            let text = doc.normalized_text(event.target);
            for other in doc.element_children(listbox) {
                doc.set_attr(other, "aria-selected", "false");
            }
            doc.set_attr(event.target, "aria-selected", "true");
            doc.set_text_content(combobox, &text);
            doc.set_attr(listbox, "style", "display:none");
        });
    }
}

/// Drop zone that lists dropped file names in its text.
pub fn wire_dropzone(doc: &mut Document, zone: NodeId) {
    doc.listen(zone, "drop", |doc, event| {
        let names = event.files.join(", ");
        doc.set_text_content(event.target, &format!("Uploaded: {}", names));
    });
}
