use crate::classify::classifier::{ClassifyContext, FieldClassifier, base_field, classify_each, finish};
use crate::classify::kind::ElementKind;
use crate::dom::dom_model::{Document, NodeId};
use crate::error::Result;
use crate::field::field_model::{Field, FieldOption, FieldType, FieldValue};
use crate::locate::locator::xpath_of;

/// Native `<select>`, ARIA listbox/combobox and library dropdowns.
pub struct SelectClassifier;

impl FieldClassifier for SelectClassifier {
    fn name(&self) -> &'static str {
        "select"
    }

    fn accepts(&self, kind: ElementKind) -> bool {
        kind == ElementKind::Select
    }

    fn classify(&self, ctx: &mut ClassifyContext<'_>, candidates: &[NodeId]) -> Vec<Field> {
        classify_each(ctx, candidates, build_select_field)
    }
}

fn build_select_field(ctx: &mut ClassifyContext<'_>, node: NodeId) -> Result<Field> {
    let doc = ctx.doc;
    let native = doc.tag(node) == "select";
    let multiple = if native {
        doc.has_attr(node, "multiple")
    } else {
        doc.attr(node, "aria-multiselectable") == Some("true")
    };

    let options = if native {
        native_options(doc, node)
    } else {
        aria_options(doc, node)
    };

    let selected: Vec<String> = options
        .iter()
        .filter(|o| o.selected)
        .map(|o| o.value.clone())
        .collect();
    let value = if multiple {
        FieldValue::List(selected)
    } else {
        match selected.into_iter().next() {
            Some(v) => FieldValue::Text(v),
            None if doc.tag(node) == "input" => FieldValue::Text(doc.value(node)),
            None => FieldValue::Text(String::new()),
        }
    };

    let mut field = base_field(ctx, node, FieldType::Select, value)?;
    field.options = Some(options);
    if let Some(meta) = field.metadata.as_mut() {
        meta.is_multiple = Some(multiple);
    }
    Ok(finish(ctx, field))
}

fn native_options(doc: &Document, select: NodeId) -> Vec<FieldOption> {
    let selected = doc.selected_options(select);
    doc.options_of(select)
        .into_iter()
        .map(|o| FieldOption {
            value: doc.option_value(o),
            text: doc.option_text(o),
            selected: selected.contains(&o),
            element: Some(o),
            xpath: Some(xpath_of(doc, o)),
        })
        .collect()
}

/// The popup an ARIA widget points at, if any.
pub fn popup_of(doc: &Document, node: NodeId) -> Option<NodeId> {
    ["aria-controls", "aria-owns"]
        .iter()
        .filter_map(|attr| doc.attr(node, attr))
        .flat_map(|ids| ids.split_whitespace())
        .find_map(|id| {
            doc.get_element_by_id(doc.tree_root(node), id)
                .or_else(|| doc.get_element_by_id(doc.root(), id))
        })
}

/// `role=option` elements in the widget's popup, or inside the widget.
pub fn aria_option_elements(doc: &Document, node: NodeId) -> Vec<NodeId> {
    let scope = popup_of(doc, node).unwrap_or(node);
    doc.composed_descendant_elements(scope)
        .into_iter()
        .filter(|d| doc.role(*d).as_deref() == Some("option") || doc.tag(*d) == "option")
        .collect()
}

pub fn aria_option_value(doc: &Document, option: NodeId) -> String {
    doc.attr(option, "data-value")
        .or_else(|| doc.attr(option, "value"))
        .map(str::to_string)
        .unwrap_or_else(|| doc.normalized_text(option))
}

fn aria_options(doc: &Document, node: NodeId) -> Vec<FieldOption> {
    aria_option_elements(doc, node)
        .into_iter()
        .map(|o| FieldOption {
            value: aria_option_value(doc, o),
            text: doc.normalized_text(o),
            selected: doc.attr(o, "aria-selected") == Some("true") || doc.is_selected(o),
            element: Some(o),
            xpath: Some(xpath_of(doc, o)),
        })
        .collect()
}
