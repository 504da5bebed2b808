//! Department decision pipeline entities.
//!
//! The pipeline turns a [`Request`](crate::request::Request) into a
//! [`Decision`] through a fixed sequence of [`PipelineStage`]s:
//!
//! ```text
//! Initialized → ContextLoaded → IntentAnalyzed ─┬─(critical risk)──────────────▶ Output
//!                                               ▼
//!   GoalsSet → Planned → [CoordinationChecked] → ToolsExecuted → Observed → FeasibilityChecked
//!                              ▲                      ▲                            │
//!                              └──────────────────────┴──── retry with alternative ┘
//!
//!   FeasibilityChecked → PolicyValidated → Logged → ConfidenceEstimated → Routed → Output
//! ```
//!
//! Entities here are pure data plus transition checks; the orchestration
//! lives in the application layer.

pub mod decision;
pub mod observation;
pub mod plan;
pub mod plan_parser;
pub mod stage;
pub mod state;
pub mod tool_result;

pub use decision::{Decision, DecisionStatus, FinalDecision};
pub use observation::normalize_observations;
pub use plan::{Plan, PlanSet, PlanSource, PlanStep};
pub use plan_parser::{PlanParseError, parse_plan_response};
pub use stage::PipelineStage;
pub use state::PipelineState;
pub use tool_result::{ToolResult, ToolStatus};
