//! Domain layer for civic-quorum
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns, and
//! nothing in it performs I/O or reads the clock behind the caller's back.
//!
//! # Core Concepts
//!
//! ## Department pipeline
//!
//! Every department runs the same bounded decision pipeline, parameterized
//! by its [`RuleTable`]. A [`Request`] goes in; a [`Decision`] of approve,
//! escalate or reject comes out.
//!
//! ## Coordination
//!
//! When departments act at the same location, the [`ConflictDetector`]
//! reports resource, location, budget and priority conflicts. Simple ones
//! are settled by the [`RuleEngine`]; the rest are negotiated or escalated
//! to a human.

pub mod confidence;
pub mod coordination;
pub mod core;
pub mod pipeline;
pub mod prompt;
pub mod request;
pub mod routing;
pub mod rules;

// Re-export commonly used types
pub use confidence::{ConfidenceCalculator, ConfidenceInputs, ConfidenceScore, ConfidenceWeights};
pub use coordination::{
    AgentDecision, Conflict, ConflictCheckResult, ConflictDetector, ConflictQuery,
    ConflictSeverity, ConflictType, CoordinationRecord, CoordinationStage, CoordinationState,
    EscalationRecord, ExecutionPlan, HumanVerdict, MonsoonPolicy, NegotiationParseError,
    Resolution, ResolutionDecision, ResolutionMethod, RuleEngine, WorkflowEntry,
    parse_negotiation_response,
};
pub use core::{
    error::{DomainError, ValidationError},
    facts::{Facts, fact_flag, fact_number},
    string::truncate,
};
pub use pipeline::{
    Decision, DecisionStatus, FinalDecision, PipelineStage, PipelineState, Plan, PlanParseError,
    PlanSet, PlanSource, PlanStep, ToolResult, ToolStatus, normalize_observations,
    parse_plan_response,
};
pub use prompt::PromptTemplate;
pub use request::{Department, Priority, Request};
pub use routing::{DecisionRouter, RoutingOutcome};
pub use rules::{
    CheckSeverity, FactRule, FeasibilityEvaluator, IntentProfile, NamedCheck, PlanTemplate,
    PolicyValidator, RiskLevel, RuleTable, RuleVerdict, Violation, departments,
};
