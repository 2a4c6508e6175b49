//! Writes values into live elements through ordered strategy cascades.

pub mod checkable;
pub mod file;
pub mod framework;
pub mod normalize;
pub mod poll;
pub mod select;
pub mod strategy;
pub mod text;

use tracing::{info, warn};

use crate::dom::dom_model::{Document, NodeId};
use crate::field::field_model::{Field, FieldType, FieldValue};
use crate::field::value::is_checked;
use crate::locate::locator::relocate;

pub use framework::{FrameworkHint, detect_framework};
pub use strategy::{
    ApplyOptions, AttemptRecord, InjectionReport, InjectionState, InjectionStatus, InjectionStrategy,
    InjectionTarget, Recorder,
};

/// Write `value` into `element` with default options.
pub async fn apply(doc: &mut Document, element: NodeId, field: &Field, value: &FieldValue) -> InjectionReport {
    apply_with(doc, element, field, value, &ApplyOptions::default()).await
}

/// Write `value` into `element`. Never fails; the report carries the outcome.
pub async fn apply_with(
    doc: &mut Document,
    element: NodeId,
    field: &Field,
    value: &FieldValue,
    options: &ApplyOptions,
) -> InjectionReport {
    let framework = if doc.is_element(element) {
        detect_framework(doc, element)
    } else {
        FrameworkHint::Native
    };
    let mut recorder = Recorder::new(InjectionReport::new(field, framework), options.trace.as_deref());

    if !doc.is_element(element) {
        warn!(field = %field.id, element = element.0, "injection target is not an element");
        recorder.report.note("target is not an element");
        return recorder.finish_with(InjectionStatus::ElementMissing);
    }

    recorder.transition(InjectionState::Normalizing);
    let mut target = InjectionTarget {
        element,
        field_type: field.field_type,
        value: value.as_text(),
        values: value.as_list(),
        checked: is_checked(Some(value)),
        framework,
    };

    let success = match field.field_type {
        FieldType::Select => {
            recorder.report.normalized_value = target.values.join(", ");
            select::apply_select(doc, &target, options, &mut recorder).await
        }
        FieldType::Radio if field.is_group() => {
            recorder.report.normalized_value = target.value.clone();
            checkable::apply_radio_group(doc, field, &target, options, &mut recorder).await
        }
        FieldType::Checkbox if field.is_group() => {
            // A bare boolean checks or clears the whole group
            if let FieldValue::Bool(all) = value {
                target.values = if *all {
                    field.options.iter().flatten().map(|o| o.value.clone()).collect()
                } else {
                    vec![]
                };
            }
            recorder.report.normalized_value = target.values.join(", ");
            checkable::apply_checkbox_group(doc, field, &target, options, &mut recorder).await
        }
        FieldType::Checkbox | FieldType::Radio | FieldType::Switch => {
            recorder.report.normalized_value = target.checked.to_string();
            checkable::apply_checkable(doc, &target, options, &mut recorder).await
        }
        FieldType::File => {
            let (files, notes) = file::resolve_sources(doc, &target.values);
            for note in notes {
                recorder.report.note(note);
            }
            recorder.report.normalized_value = files
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            if files.is_empty() {
                return recorder.finish_with(InjectionStatus::Unsupported);
            }
            file::apply_file(doc, &target, &files, options, &mut recorder).await
        }
        text_type => {
            let normalized = normalize::normalize_text_value(doc, element, text_type, &target.value);
            recorder.report.normalized_value = normalized.clone();
            target.value = normalized;
            text::apply_text(doc, &target, options, &mut recorder).await
        }
    };

    recorder.finish(success)
}

/// Re-locate the field's element from its handle and locators, then apply.
pub async fn apply_field(
    doc: &mut Document,
    field: &Field,
    value: &FieldValue,
    options: &ApplyOptions,
) -> InjectionReport {
    match relocate(doc, field) {
        Some(element) => apply_with(doc, element, field, value, options).await,
        None => {
            info!(field = %field.id, xpath = %field.xpath, "field element not found");
            let recorder = Recorder::new(
                InjectionReport::new(field, FrameworkHint::Native),
                options.trace.as_deref(),
            );
            recorder.finish_with(InjectionStatus::ElementMissing)
        }
    }
}
