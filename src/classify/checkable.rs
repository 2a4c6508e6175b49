use crate::classify::classifier::{ClassifyContext, FieldClassifier, base_field, classify_each, finish};
use crate::classify::grouping::{CheckableGroup, group_checkables};
use crate::classify::kind::{ElementKind, checked_state};
use crate::dom::dom_model::{Document, NodeId};
use crate::error::{EngineError, Result};
use crate::field::field_model::{Field, FieldOption, FieldType, FieldValue, GroupType};
use crate::locate::label::member_label;
use crate::locate::locator::xpath_of;

/// Checkboxes, radios and switches. Radios and checkboxes go through
/// grouping first; switches are always single fields.
pub struct CheckableClassifier;

impl FieldClassifier for CheckableClassifier {
    fn name(&self) -> &'static str {
        "checkable"
    }

    fn accepts(&self, kind: ElementKind) -> bool {
        matches!(kind, ElementKind::Checkable(_))
    }

    fn classify(&self, ctx: &mut ClassifyContext<'_>, candidates: &[NodeId]) -> Vec<Field> {
        let doc = ctx.doc;
        let mut radios = Vec::new();
        let mut checkboxes = Vec::new();
        let mut switches = Vec::new();
        for node in candidates {
            match crate::classify::kind::element_kind(doc, *node) {
                Some(ElementKind::Checkable(FieldType::Radio)) => radios.push(*node),
                Some(ElementKind::Checkable(FieldType::Checkbox)) => checkboxes.push(*node),
                Some(ElementKind::Checkable(_)) => switches.push(*node),
                _ => {}
            }
        }

        let grouping = group_checkables(doc, &radios, &checkboxes, &ctx.config.grouping);

        let mut fields = Vec::new();
        for group in &grouping.groups {
            match build_group_field(ctx, group) {
                Ok(field) => fields.push(field),
                Err(e) => tracing::warn!(group = %group.name, error = %e, "group skipped"),
            }
        }
        fields.extend(classify_each(ctx, &grouping.independent, |ctx, node| {
            build_single_field(ctx, node, FieldType::Checkbox)
        }));
        fields.extend(classify_each(ctx, &switches, |ctx, node| {
            build_single_field(ctx, node, FieldType::Switch)
        }));
        fields
    }
}

/// Submitted value of one member: `value`, `data-value`, or its label.
pub fn member_value(doc: &Document, node: NodeId) -> String {
    doc.attr(node, "value")
        .or_else(|| doc.attr(node, "data-value"))
        .map(str::to_string)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| {
            let label = member_label(doc, node);
            if label.is_empty() && doc.tag(node) == "input" {
                "on".to_string()
            } else {
                label
            }
        })
}

fn build_group_field(ctx: &mut ClassifyContext<'_>, group: &CheckableGroup) -> Result<Field> {
    let doc = ctx.doc;
    let Some(first) = group.members.first().copied() else {
        return Err(EngineError::Classification {
            element: group.container.unwrap_or(doc.root()),
            reason: "empty group".to_string(),
        });
    };

    let options: Vec<FieldOption> = group
        .members
        .iter()
        .map(|m| FieldOption {
            value: member_value(doc, *m),
            text: member_label(doc, *m),
            selected: checked_state(doc, *m),
            element: Some(*m),
            xpath: Some(xpath_of(doc, *m)),
        })
        .collect();

    let (field_type, value) = match group.kind {
        GroupType::Radio => (
            FieldType::Radio,
            FieldValue::Text(
                options
                    .iter()
                    .find(|o| o.selected)
                    .map(|o| o.value.clone())
                    .unwrap_or_default(),
            ),
        ),
        GroupType::Checkbox => (
            FieldType::Checkbox,
            FieldValue::List(options.iter().filter(|o| o.selected).map(|o| o.value.clone()).collect()),
        ),
    };

    let mut field = base_field(ctx, first, field_type, value)?;
    field.label = group.label.clone();
    field.options = Some(options);
    field.group_name = Some(group.name.clone());
    field.group_type = Some(group.kind);
    if group.members.iter().any(|m| doc.has_attr(*m, "required")) {
        if let Some(meta) = field.metadata.as_mut() {
            meta.required = Some(true);
        }
    }
    Ok(finish(ctx, field))
}

fn build_single_field(ctx: &mut ClassifyContext<'_>, node: NodeId, field_type: FieldType) -> Result<Field> {
    let value = FieldValue::Bool(checked_state(ctx.doc, node));
    let field = base_field(ctx, node, field_type, value)?;
    Ok(finish(ctx, field))
}
