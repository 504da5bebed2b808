//! Progress ports.
//!
//! [`PipelineProgressNotifier`] and [`CoordinationProgressNotifier`] are
//! **output ports** the presentation layer implements to show live progress.
//! All callback argument types come from the domain layer.
//!
//! All methods have default no-op implementations, so implementers only
//! need to override the callbacks they care about.
//!
//! # Example Implementation
//!
//! ```ignore
//! use civic_application::ports::progress::PipelineProgressNotifier;
//!
//! struct MyProgress;
//!
//! impl PipelineProgressNotifier for MyProgress {
//!     fn on_stage_change(&self, department: Department, stage: PipelineStage) {
//!         println!("{}: {}", department, stage.display_name());
//!     }
//! }
//! ```

use civic_domain::{
    ConflictCheckResult, CoordinationStage, Decision, Department, EscalationRecord, PipelineStage,
    Plan, Resolution, ToolResult,
};

/// Callbacks fired by the department pipeline.
pub trait PipelineProgressNotifier: Send + Sync {
    fn on_stage_change(&self, _department: Department, _stage: PipelineStage) {}

    fn on_tool_result(&self, _department: Department, _result: &ToolResult) {}

    /// Called when an alternative plan replaces an infeasible one
    fn on_retry(&self, _department: Department, _attempt: u32, _plan: &Plan) {}

    fn on_checkpoint(&self, _department: Department, _result: &ConflictCheckResult) {}

    /// Called when the checkpoint failed and the run continues without it
    fn on_checkpoint_degraded(&self, _department: Department, _error: &str) {}

    fn on_escalation(&self, _department: Department, _reason: &str) {}

    fn on_decision(&self, _decision: &Decision) {}
}

/// Callbacks fired by the coordination pipeline.
pub trait CoordinationProgressNotifier: Send + Sync {
    fn on_stage_change(&self, _stage: CoordinationStage) {}

    fn on_conflicts_detected(&self, _count: usize) {}

    fn on_resolution(&self, _resolution: &Resolution) {}

    /// Called before waiting on a human verdict
    fn on_human_wait(&self, _escalation: &EscalationRecord) {}
}

/// No-op progress notifier
pub struct NoProgress;

impl PipelineProgressNotifier for NoProgress {}
impl CoordinationProgressNotifier for NoProgress {}
