use tracing::{debug, warn};

use crate::classify::kind::{ElementKind, element_kind};
use crate::config::EngineConfig;
use crate::dom::dom_model::{Document, NodeId};
use crate::error::{EngineError, Result};
use crate::field::field_model::{Field, FieldMetadata, FieldType, FieldValue, Validation, Visibility};
use crate::field::markers::fingerprint;
use crate::field::session::DetectionSession;
use crate::field::test_values::test_value_for;
use crate::inject::framework::detect_framework;
use crate::locate::label::resolve_label;
use crate::locate::locator::{unique_selectors, xpath_of};

// ============================================================================
// Classifier seam
// ============================================================================

pub struct ClassifyContext<'a> {
    pub doc: &'a Document,
    pub session: &'a mut DetectionSession,
    pub config: &'a EngineConfig,
    pub test_mode: bool,
}

/// Turns raw candidate elements into fields for one type category.
pub trait FieldClassifier {
    fn name(&self) -> &'static str;

    /// Whether this classifier owns the element.
    fn accepts(&self, kind: ElementKind) -> bool;

    /// Build fields from the accepted candidates. Elements that fail are
    /// skipped by the caller, never the whole batch.
    fn classify(&self, ctx: &mut ClassifyContext<'_>, candidates: &[NodeId]) -> Vec<Field>;
}

/// Run every classifier over the same candidate set and concatenate.
pub fn run_classifiers(
    ctx: &mut ClassifyContext<'_>,
    classifiers: &[Box<dyn FieldClassifier>],
    candidates: &[NodeId],
) -> Vec<Field> {
    let kinds: Vec<(NodeId, Option<ElementKind>)> = candidates
        .iter()
        .map(|n| (*n, element_kind(ctx.doc, *n)))
        .collect();

    let mut fields = Vec::new();
    for classifier in classifiers {
        let mine: Vec<NodeId> = kinds
            .iter()
            .filter(|(_, kind)| kind.is_some_and(|k| classifier.accepts(k)))
            .map(|(n, _)| *n)
            .collect();
        if mine.is_empty() {
            continue;
        }
        let produced = classifier.classify(ctx, &mine);
        debug!(
            classifier = classifier.name(),
            candidates = mine.len(),
            fields = produced.len(),
            "classifier finished"
        );
        fields.extend(produced);
    }
    fields
}

/// Apply a per-element builder, logging and skipping failures.
pub fn classify_each(
    ctx: &mut ClassifyContext<'_>,
    candidates: &[NodeId],
    build: impl Fn(&mut ClassifyContext<'_>, NodeId) -> Result<Field>,
) -> Vec<Field> {
    let mut out = Vec::new();
    for node in candidates {
        match build(ctx, *node) {
            Ok(field) => out.push(field),
            Err(e) => warn!(node = node.0, error = %e, "classification failed, element skipped"),
        }
    }
    out
}

// ============================================================================
// Shared field construction
// ============================================================================

/// Field skeleton every classifier starts from.
pub fn base_field(
    ctx: &mut ClassifyContext<'_>,
    node: NodeId,
    field_type: FieldType,
    value: FieldValue,
) -> Result<Field> {
    let doc = ctx.doc;
    if !doc.is_element(node) {
        return Err(EngineError::NotAnElement(node));
    }

    let xpath = xpath_of(doc, node);
    let name = doc
        .attr(node, "name")
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    let framework = detect_framework(doc, node);
    let metadata = FieldMetadata {
        framework: framework.is_controlled().then(|| framework.as_str().to_string()),
        visibility: Some(Visibility {
            is_visible: doc.is_rendered(node) && !doc.bounding_rect(node).is_empty(),
        }),
        is_multiple: None,
        required: (doc.has_attr(node, "required") || doc.attr(node, "aria-required") == Some("true"))
            .then_some(true),
        placeholder: doc.attr(node, "placeholder").map(str::to_string),
        fingerprint: Some(fingerprint(field_type.as_str(), &xpath, name.as_deref())),
        name,
        accept: None,
    };

    Ok(Field {
        id: ctx.session.issue_id(),
        field_type,
        label: resolve_label(doc, node),
        value,
        test_value: None,
        options: None,
        validation: None,
        unique_selectors: unique_selectors(doc, node),
        xpath,
        metadata: Some(metadata),
        group_name: None,
        group_type: None,
        element: node,
    })
}

/// Constraint attributes, or `None` when the element declares none.
pub fn read_validation(doc: &Document, node: NodeId) -> Option<Validation> {
    let number = |attr: &str| doc.attr(node, attr).and_then(|v| v.trim().parse::<f64>().ok());
    let length = |attr: &str| doc.attr(node, attr).and_then(|v| v.trim().parse::<usize>().ok());
    let validation = Validation {
        min: number("min").or_else(|| number("aria-valuemin")),
        max: number("max").or_else(|| number("aria-valuemax")),
        step: number("step"),
        pattern: doc.attr(node, "pattern").map(str::to_string),
        min_length: length("minlength"),
        max_length: length("maxlength"),
    };
    (!validation.is_empty()).then_some(validation)
}

/// Attach a test value when running in test mode.
pub fn finish(ctx: &ClassifyContext<'_>, mut field: Field) -> Field {
    if ctx.test_mode {
        field.test_value = Some(test_value_for(&field));
    }
    field
}
