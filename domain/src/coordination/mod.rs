//! Cross-department coordination.
//!
//! Departments decide independently; this module finds where their
//! decisions collide and describes how collisions get resolved.
//!
//! # Flow
//!
//! ```text
//! DetectConflicts → AssessComplexity ─┬─ no conflicts ─────────────────────────▶ Finalize
//!                                     ├─ all rule-resolvable → ResolveWithRules ─┐
//!                                     └─ otherwise ──────────→ ResolveWithLlm ───┤
//!                                                                                 ▼
//!                                   Finalize ◀── [EscalateHuman] ◀── CheckHumanApproval
//! ```
//!
//! Everything here is pure: [`ConflictDetector`] and [`RuleEngine`] take
//! the current time as an argument, and [`parse_negotiation_response`]
//! only decodes text the application layer got from the oracle.

pub mod candidate;
pub mod conflict;
pub mod detector;
pub mod negotiation;
pub mod resolution;
pub mod rule_engine;
pub mod state;

pub use candidate::AgentDecision;
pub use conflict::{Conflict, ConflictCheckResult, ConflictQuery, ConflictSeverity, ConflictType};
pub use detector::ConflictDetector;
pub use negotiation::{NegotiationParseError, parse_negotiation_response};
pub use resolution::{ExecutionPlan, Resolution, ResolutionDecision, ResolutionMethod};
pub use rule_engine::{MonsoonPolicy, RuleEngine};
pub use state::{
    CoordinationRecord, CoordinationStage, CoordinationState, EscalationRecord, HumanVerdict,
    WorkflowEntry,
};
