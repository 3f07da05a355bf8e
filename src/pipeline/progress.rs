//! Progress Reporting
//!
//! The orchestrator emits an event after each stage completes (and one at
//! start and end). Front ends attach an observer: the CLI prints styled
//! phase lines, the HTTP API ignores them, tests capture them.

use std::sync::Arc;

use tracing::info;

use crate::types::StageName;

/// Pipeline lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Processing begins
    Started,
    /// A stage is about to run
    StageStarted { stage: StageName },
    /// A stage finished; carries its output text
    StageDone { stage: StageName, output: String },
    /// A stage exhausted its budget; the run terminates
    StageFailed { stage: StageName, error: String },
    /// Terminal event; carries the final output
    Completed { output: String },
}

impl ProgressEvent {
    /// Short machine-readable phase tag
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Started => "start",
            Self::StageStarted { stage } => match stage {
                StageName::Analysis => "analyzing",
                StageName::Generation => "generating",
                StageName::Vetting => "vetting",
                StageName::Finalization => "finalizing",
                StageName::Enhancement => "enhancing",
                StageName::Comprehensive | StageName::Presenter => "comprehensive",
                StageName::Solve => "solving",
                StageName::Verify => "verifying",
            },
            Self::StageDone { stage, .. } => match stage {
                StageName::Analysis => "analysis_done",
                StageName::Generation => "generation_done",
                StageName::Vetting => "vetting_done",
                StageName::Finalization => "finalize_done",
                StageName::Enhancement => "enhance_done",
                StageName::Comprehensive | StageName::Presenter => "comprehensive_done",
                StageName::Solve => "solved",
                StageName::Verify => "verified",
            },
            Self::StageFailed { .. } => "error",
            Self::Completed { .. } => "complete",
        }
    }

    /// Human-readable status line for interactive front ends
    pub fn message(&self) -> &'static str {
        match self.phase() {
            "start" => "Processing prompt...",
            "analyzing" => "Phase 1/6: Analysis",
            "analysis_done" => "Analysis complete.",
            "generating" => "Phase 2/6: Generation",
            "generation_done" => "Generation complete.",
            "vetting" => "Phase 3/6: Vetting",
            "vetting_done" => "Vetting complete.",
            "finalizing" => "Phase 4/6: Finalization",
            "finalize_done" => "Finalization complete.",
            "enhancing" => "Phase 5/6: Enhancement",
            "enhance_done" => "Enhancement complete.",
            "comprehensive" => "Phase 6/6: Review",
            "comprehensive_done" => "Review complete.",
            "solving" => "Solving...",
            "solved" => "Solution drafted.",
            "verifying" => "Verifying...",
            "verified" => "Answer verified.",
            "error" => "Stage failed.",
            "complete" => "Process complete.",
            _ => "",
        }
    }
}

/// Sink for pipeline progress events
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Shared observer handle
pub type SharedObserver = Arc<dyn ProgressObserver>;

/// Observer that drops every event
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Observer that logs each event through tracing
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_event(&self, event: &ProgressEvent) {
        info!(phase = event.phase(), "{}", event.message());
    }
}

/// Observer wrapping a closure. Convenient for CLI front ends and tests.
pub struct FnObserver<F>(pub F);

impl<F> ProgressObserver for FnObserver<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: &ProgressEvent) {
        (self.0)(event);
    }
}
