//! Feasibility and policy evaluation.
//!
//! Both evaluators are pure: they select a rule-set from the
//! [`RuleTable`] by intent and run it against the observations. Neither
//! performs I/O or consults the oracle.

use super::check::{RuleVerdict, evaluate_checks};
use super::rule_table::RuleTable;
use crate::core::facts::Facts;
use crate::pipeline::Plan;
use crate::request::Request;

/// Can the current plan actually be carried out?
pub struct FeasibilityEvaluator<'a> {
    table: &'a RuleTable,
}

impl<'a> FeasibilityEvaluator<'a> {
    pub fn new(table: &'a RuleTable) -> Self {
        Self { table }
    }

    pub fn evaluate(
        &self,
        intent: &str,
        observations: &Facts,
        request: &Request,
        plan: Option<&Plan>,
    ) -> RuleVerdict {
        evaluate_checks(
            "feasibility",
            self.table.feasibility_checks(intent),
            observations,
            request,
            plan,
        )
    }
}

/// Does the plan respect the department's standing policies?
pub struct PolicyValidator<'a> {
    table: &'a RuleTable,
}

impl<'a> PolicyValidator<'a> {
    pub fn new(table: &'a RuleTable) -> Self {
        Self { table }
    }

    pub fn validate(
        &self,
        intent: &str,
        observations: &Facts,
        request: &Request,
        plan: Option<&Plan>,
    ) -> RuleVerdict {
        evaluate_checks(
            "policy",
            self.table.policy_checks(intent),
            observations,
            request,
            plan,
        )
    }
}
