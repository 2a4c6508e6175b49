use crate::dom::dom_model::{Document, NodeId};
use crate::field::field_model::FieldType;

/// Which classifier owns an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Text(FieldType),
    Select,
    Checkable(FieldType),
    File,
}

impl ElementKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text(t) | Self::Checkable(t) => *t,
            Self::Select => FieldType::Select,
            Self::File => FieldType::File,
        }
    }
}

const SELECT_LIBRARY_CLASSES: &[&str] = &[
    "ant-select",
    "MuiSelect-select",
    "react-select__control",
    "select2-selection",
    "v-select",
    "el-select",
];

/// Route an element to its classifier. `None` for things that are not fields.
pub fn element_kind(doc: &Document, node: NodeId) -> Option<ElementKind> {
    let tag = doc.tag(node);
    match tag {
        "input" => {
            let input_type = doc.input_type(node)?;
            return match input_type.as_str() {
                "hidden" | "submit" | "button" | "reset" | "image" => None,
                "file" => Some(ElementKind::File),
                "checkbox" if doc.role(node).as_deref() == Some("switch") => {
                    Some(ElementKind::Checkable(FieldType::Switch))
                }
                "checkbox" | "radio" => Some(ElementKind::Checkable(FieldType::from_input_type(&input_type))),
                _ if doc.role(node).as_deref() == Some("combobox") => Some(ElementKind::Select),
                other => Some(ElementKind::Text(FieldType::from_input_type(other))),
            };
        }
        "textarea" => return Some(ElementKind::Text(FieldType::Textarea)),
        "select" => return Some(ElementKind::Select),
        _ => {}
    }

    if let Some(role) = doc.role(node) {
        match role.as_str() {
            "textbox" => {
                return Some(ElementKind::Text(if doc.is_content_editable(node) {
                    FieldType::ContentEditable
                } else {
                    FieldType::Text
                }));
            }
            "searchbox" => return Some(ElementKind::Text(FieldType::Search)),
            "spinbutton" => return Some(ElementKind::Text(FieldType::Number)),
            "slider" => return Some(ElementKind::Text(FieldType::Range)),
            "combobox" | "listbox" => return Some(ElementKind::Select),
            "checkbox" => return Some(ElementKind::Checkable(FieldType::Checkbox)),
            "radio" => return Some(ElementKind::Checkable(FieldType::Radio)),
            "switch" => return Some(ElementKind::Checkable(FieldType::Switch)),
            _ => {}
        }
    }

    if doc.is_content_editable(node) {
        return Some(ElementKind::Text(FieldType::ContentEditable));
    }

    let class_lower = doc.class_attr(node).to_lowercase();
    if SELECT_LIBRARY_CLASSES.iter().any(|c| doc.has_class(node, c))
        || class_lower.contains("custom-select")
        || class_lower.contains("dropdown")
    {
        return Some(ElementKind::Select);
    }
    if doc.has_attr(node, "data-upload") || class_lower.contains("dropzone") || class_lower.contains("upload") {
        return Some(ElementKind::File);
    }
    if class_lower.contains("switch") || class_lower.contains("toggle") {
        return Some(ElementKind::Checkable(FieldType::Switch));
    }
    if class_lower.contains("custom-checkbox") {
        return Some(ElementKind::Checkable(FieldType::Checkbox));
    }
    if class_lower.contains("custom-radio") {
        return Some(ElementKind::Checkable(FieldType::Radio));
    }
    if doc.has_class(node, "ant-picker") {
        return Some(ElementKind::Text(FieldType::Date));
    }
    if tag.contains('-') && tag.split('-').any(|p| p == "select" || p == "dropdown") {
        return Some(ElementKind::Select);
    }
    // Custom inputs and fallback-scored elements with no stronger hint read as text
    Some(ElementKind::Text(FieldType::Text))
}

/// Current checked state for native and ARIA checkables.
pub fn checked_state(doc: &Document, node: NodeId) -> bool {
    if doc.tag(node) == "input" {
        return doc.checked(node);
    }
    if let Some(state) = doc.attr(node, "aria-checked") {
        return state == "true";
    }
    ["checked", "is-checked", "active", "selected"]
        .iter()
        .any(|c| doc.has_class(node, c))
}
