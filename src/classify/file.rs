use crate::classify::classifier::{ClassifyContext, FieldClassifier, base_field, classify_each, finish};
use crate::classify::kind::ElementKind;
use crate::dom::dom_model::{Document, NodeId};
use crate::error::Result;
use crate::field::field_model::{Field, FieldType, FieldValue};

/// Native file inputs and custom upload widgets.
pub struct FileClassifier;

impl FieldClassifier for FileClassifier {
    fn name(&self) -> &'static str {
        "file"
    }

    fn accepts(&self, kind: ElementKind) -> bool {
        kind == ElementKind::File
    }

    fn classify(&self, ctx: &mut ClassifyContext<'_>, candidates: &[NodeId]) -> Vec<Field> {
        classify_each(ctx, candidates, build_file_field)
    }
}

/// The native input that actually holds files: the element or one inside it.
pub fn native_file_input(doc: &Document, node: NodeId) -> Option<NodeId> {
    if doc.input_type(node).as_deref() == Some("file") {
        return Some(node);
    }
    doc.composed_descendant_elements(node)
        .into_iter()
        .find(|d| doc.input_type(*d).as_deref() == Some("file"))
}

fn build_file_field(ctx: &mut ClassifyContext<'_>, node: NodeId) -> Result<Field> {
    let doc = ctx.doc;
    let input = native_file_input(doc, node);
    let multiple = input.is_some_and(|i| doc.has_attr(i, "multiple")) || doc.has_attr(node, "multiple");
    let names: Vec<String> = input
        .map(|i| doc.files(i).iter().map(|f| f.name.clone()).collect())
        .unwrap_or_default();
    let value = if multiple {
        FieldValue::List(names)
    } else {
        FieldValue::Text(names.into_iter().next().unwrap_or_default())
    };

    let mut field = base_field(ctx, node, FieldType::File, value)?;
    if let Some(meta) = field.metadata.as_mut() {
        meta.is_multiple = Some(multiple);
        meta.accept = input
            .and_then(|i| doc.attr(i, "accept"))
            .or_else(|| doc.attr(node, "accept"))
            .map(str::to_string);
    }
    Ok(finish(ctx, field))
}
