//! Application layer for civic-quorum
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{CoordinationParams, OracleParams, PipelineParams};
pub use ports::{
    audit_logger::{AuditEvent, AuditLogger, NoAuditLogger},
    audit_store::{ActiveDecisionQuery, AuditStore, StoreError},
    coordination_checkpoint::{CoordinationCheckpoint, CoordinationError},
    department_data::{DataAccessError, DepartmentDataPort},
    human_approval::{
        AutoApproveEscalations, AutoRejectEscalations, HumanApprovalError, HumanApprovalPort,
    },
    progress::{CoordinationProgressNotifier, NoProgress, PipelineProgressNotifier},
    reasoning_oracle::{OracleError, OracleRequest, ReasoningOracle},
};
pub use use_cases::check_conflicts::CheckPlanConflictsUseCase;
pub use use_cases::coordinate::{CoordinateError, CoordinateUseCase, CoordinationResult};
pub use use_cases::decide::{DecideError, DecideOutput, DecideUseCase};
pub use use_cases::negotiate::NegotiationEngine;
pub use use_cases::router::DepartmentRouter;
