use crate::classify::classifier::{ClassifyContext, FieldClassifier, base_field, classify_each, finish, read_validation};
use crate::classify::kind::{ElementKind, element_kind};
use crate::dom::dom_model::{Document, NodeId};
use crate::error::{EngineError, Result};
use crate::field::field_model::{Field, FieldType, FieldValue};

/// Single-line inputs, textareas, ARIA textboxes and content-editable regions.
pub struct TextClassifier;

impl FieldClassifier for TextClassifier {
    fn name(&self) -> &'static str {
        "text"
    }

    fn accepts(&self, kind: ElementKind) -> bool {
        matches!(kind, ElementKind::Text(_))
    }

    fn classify(&self, ctx: &mut ClassifyContext<'_>, candidates: &[NodeId]) -> Vec<Field> {
        classify_each(ctx, candidates, build_text_field)
    }
}

fn build_text_field(ctx: &mut ClassifyContext<'_>, node: NodeId) -> Result<Field> {
    let doc = ctx.doc;
    let Some(ElementKind::Text(field_type)) = element_kind(doc, node) else {
        return Err(EngineError::Classification {
            element: node,
            reason: "not a text-like element".to_string(),
        });
    };

    let value = FieldValue::Text(current_text(doc, node, field_type));
    let mut field = base_field(ctx, node, field_type, value)?;
    field.validation = read_validation(doc, node);
    Ok(finish(ctx, field))
}

/// What the user would see as the element's current value.
pub fn current_text(doc: &Document, node: NodeId, field_type: FieldType) -> String {
    match doc.tag(node) {
        "input" | "textarea" => doc.value(node),
        _ if field_type == FieldType::ContentEditable || doc.is_content_editable(node) => {
            doc.normalized_text(node)
        }
        _ => doc
            .attr(node, "aria-valuenow")
            .or_else(|| doc.attr(node, "data-value"))
            .map(str::to_string)
            .unwrap_or_else(|| doc.normalized_text(node)),
    }
}
