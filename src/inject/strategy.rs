use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::dom::dom_model::{Document, NodeId};
use crate::field::field_model::{Field, FieldType};
use crate::inject::framework::FrameworkHint;
use crate::inject::poll::{PollOutcome, poll_until};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

// ============================================================================
// Options
// ============================================================================

/// Knobs for one `apply` call.
#[derive(Clone, Default)]
pub struct ApplyOptions {
    pub config: EngineConfig,
    /// JSONL sink for state transitions
    pub trace: Option<Arc<TraceLogger>>,
    /// Cancels the verification poll
    pub cancel: CancellationToken,
}

impl fmt::Debug for ApplyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyOptions")
            .field("config", &self.config)
            .field("trace", &self.trace.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

// ============================================================================
// State machine and report
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "strategy", rename_all = "camelCase")]
pub enum InjectionState {
    Idle,
    Normalizing,
    StrategySelection,
    Attempt(usize),
    Success,
    ExhaustedStrategies,
}

impl fmt::Display for InjectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attempt(i) => write!(f, "Attempt({})", i),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InjectionStatus {
    Success,
    ExhaustedStrategies,
    /// Nothing to try: unsupported source or value
    Unsupported,
    /// The element could not be found again
    ElementMissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The strategy acted; verification decides whether it took
    Applied,
    /// The strategy found nothing to do
    NoEffect,
    Failed(String),
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::NoEffect => f.write_str("no effect"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub strategy: String,
    pub element: NodeId,
    pub outcome: String,
    pub verified: bool,
}

/// What happened to one field during `apply`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionReport {
    pub field_id: String,
    pub field_type: FieldType,
    pub normalized_value: String,
    pub framework: FrameworkHint,
    pub states: Vec<InjectionState>,
    pub attempts: Vec<AttemptRecord>,
    pub status: InjectionStatus,
    pub notes: Vec<String>,
}

impl InjectionReport {
    pub fn new(field: &Field, framework: FrameworkHint) -> Self {
        Self {
            field_id: field.id.clone(),
            field_type: field.field_type,
            normalized_value: String::new(),
            framework,
            states: vec![InjectionState::Idle],
            attempts: vec![],
            status: InjectionStatus::ExhaustedStrategies,
            notes: vec![],
        }
    }

    pub fn state(&self) -> InjectionState {
        self.states.last().copied().unwrap_or(InjectionState::Idle)
    }

    pub fn succeeded(&self) -> bool {
        self.status == InjectionStatus::Success
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Strategy names in the order they were attempted.
    pub fn attempted_strategies(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.strategy.as_str()).collect()
    }
}

/// Records transitions into the report and the optional trace sink.
pub struct Recorder<'a> {
    pub report: InjectionReport,
    trace: Option<&'a TraceLogger>,
}

impl<'a> Recorder<'a> {
    pub fn new(report: InjectionReport, trace: Option<&'a TraceLogger>) -> Self {
        Self { report, trace }
    }

    pub fn transition(&mut self, state: InjectionState) {
        debug!(field = %self.report.field_id, state = %state, "injection state");
        self.report.states.push(state);
        if let Some(trace) = self.trace {
            trace.log(&TraceEvent::now(&self.report.field_id, state));
        }
    }

    fn record_attempt(&mut self, name: &str, element: NodeId, outcome: &AttemptOutcome, verified: bool) {
        self.report.attempts.push(AttemptRecord {
            strategy: name.to_string(),
            element,
            outcome: outcome.to_string(),
            verified,
        });
        if let Some(trace) = self.trace {
            trace.log(
                &TraceEvent::now(&self.report.field_id, self.report.state())
                    .with_strategy(name)
                    .with_outcome(outcome)
                    .with_detail(if verified { "verified" } else { "unverified" }),
            );
        }
    }

    /// Close the trail: Success or ExhaustedStrategies.
    pub fn finish(mut self, success: bool) -> InjectionReport {
        if success {
            self.transition(InjectionState::Success);
            self.report.status = InjectionStatus::Success;
        } else if self.report.state() != InjectionState::ExhaustedStrategies {
            self.transition(InjectionState::ExhaustedStrategies);
        }
        info!(
            field = %self.report.field_id,
            status = ?self.report.status,
            attempts = self.report.attempts.len(),
            "injection finished"
        );
        self.report
    }

    pub fn finish_with(mut self, status: InjectionStatus) -> InjectionReport {
        if status == InjectionStatus::Success {
            return self.finish(true);
        }
        self.report.status = status;
        self.finish(false)
    }
}

// ============================================================================
// Strategy seam and cascade
// ============================================================================

/// What a strategy is asked to write.
#[derive(Debug, Clone)]
pub struct InjectionTarget {
    pub element: NodeId,
    pub field_type: FieldType,
    /// Normalized scalar value
    pub value: String,
    /// Every requested entry (multi-select)
    pub values: Vec<String>,
    /// Desired state for checkables
    pub checked: bool,
    pub framework: FrameworkHint,
}

/// One attempt within an ordered fallback list.
#[async_trait(?Send)]
pub trait InjectionStrategy {
    fn name(&self) -> &'static str;

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool;

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome;

    /// Whether the element now shows the requested state.
    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool;
}

/// Run `strategies` in order until one verifies. Each runs at most once.
pub async fn run_cascade(
    doc: &mut Document,
    target: &InjectionTarget,
    strategies: &[Box<dyn InjectionStrategy>],
    options: &ApplyOptions,
    recorder: &mut Recorder<'_>,
) -> bool {
    recorder.transition(InjectionState::StrategySelection);
    let timeout = Duration::from_millis(options.config.injection.verify_timeout_ms);
    let interval = Duration::from_millis(options.config.injection.verify_interval_ms);

    for (index, strategy) in strategies.iter().enumerate() {
        if !strategy.applies(doc, target) {
            debug!(strategy = strategy.name(), "strategy does not apply");
            continue;
        }
        recorder.transition(InjectionState::Attempt(index));
        let outcome = strategy.attempt(doc, target).await;

        let verified = match outcome {
            AttemptOutcome::Applied => {
                let view: &Document = doc;
                let polled = poll_until(|| strategy.verify(view, target), timeout, interval, &options.cancel).await;
                if polled == PollOutcome::Cancelled {
                    recorder.record_attempt(strategy.name(), target.element, &outcome, false);
                    recorder.report.note("verification cancelled");
                    return false;
                }
                polled == PollOutcome::Satisfied
            }
            AttemptOutcome::NoEffect => strategy.verify(doc, target),
            AttemptOutcome::Failed(_) => false,
        };

        debug!(
            strategy = strategy.name(),
            outcome = %outcome,
            verified,
            "strategy attempted"
        );
        recorder.record_attempt(strategy.name(), target.element, &outcome, verified);
        if verified {
            return true;
        }
    }

    warn!(
        field = %recorder.report.field_id,
        element = target.element.0,
        "all injection strategies exhausted"
    );
    false
}
