//! Department rule tables and the pure evaluators that read them.
//!
//! One pipeline engine serves every department; what differs is the
//! [`RuleTable`]: how request kinds map to intents, what each intent's
//! feasibility and policy checks are, and which plan templates it falls
//! back to. Built-in tables live in [`departments`].
//!
//! | Component | Input | Output |
//! |-----------|-------|--------|
//! | [`FeasibilityEvaluator`] | intent, observations, request | [`RuleVerdict`] |
//! | [`PolicyValidator`] | intent, observations, request | [`RuleVerdict`] |
//! | [`RuleTable::assess_risk`] | intent profile, request | [`RiskLevel`] |

pub mod check;
pub mod departments;
pub mod evaluator;
pub mod risk;
pub mod rule_table;

pub use check::{CheckSeverity, FactRule, NamedCheck, RuleVerdict, Violation, evaluate_checks};
pub use evaluator::{FeasibilityEvaluator, PolicyValidator};
pub use risk::RiskLevel;
pub use rule_table::{IntentProfile, PlanTemplate, RuleTable};
