use tracing::{debug, info};

use crate::{
    classify::{ClassifyContext, default_classifiers, run_classifiers},
    config::EngineConfig,
    container::resolve_container,
    discovery::discover_fields,
    dom::dom_model::{Document, NodeId},
    field::{
        field_model::Field,
        markers::{is_processed, write_markers},
        session::DetectionSession,
    },
};

pub mod classify;
pub mod cli;
pub mod config;
pub mod container;
pub mod discovery;
pub mod dom;
pub mod error;
pub mod field;
pub mod inject;
pub mod locate;
pub mod report;
pub mod trace;

pub use inject::{ApplyOptions, InjectionReport, InjectionStatus, apply, apply_field, apply_with};

/// Knobs for one `detect` pass.
#[derive(Debug, Clone, Default)]
pub struct DetectOptions {
    /// Attach a plausible sample value to every field
    pub test_mode: bool,
    /// Leave out elements an earlier pass already marked
    pub skip_processed: bool,
    pub config: EngineConfig,
}

/// Find every field under `container` (or the best form-like region) and
/// describe it. Only marker attributes are written to the page.
pub fn detect(doc: &mut Document, container: Option<NodeId>, options: &DetectOptions) -> Vec<Field> {
    let root = resolve_container(doc, container, &options.config);
    let mut candidates = discover_fields(doc, root, &options.config.discovery);

    if options.skip_processed {
        let before = candidates.len();
        candidates.retain(|n| !is_processed(doc, *n));
        debug!(skipped = before - candidates.len(), "already processed elements left out");
    }

    let mut session = DetectionSession::new();
    session.reserve_existing(doc);

    let fields = {
        let mut ctx = ClassifyContext {
            doc,
            session: &mut session,
            config: &options.config,
            test_mode: options.test_mode,
        };
        run_classifiers(&mut ctx, &default_classifiers(), &candidates)
    };

    for field in &fields {
        write_markers(doc, field);
    }

    info!(
        container = root.0,
        candidates = candidates.len(),
        fields = fields.len(),
        "detection finished"
    );
    fields
}
