//! Mutable per-run state of the department pipeline.

use super::{FinalDecision, PipelineStage, Plan, PlanSet, ToolResult};
use crate::coordination::ConflictCheckResult;
use crate::core::error::DomainError;
use crate::core::facts::Facts;
use crate::request::Request;
use crate::rules::{RiskLevel, RuleVerdict, Violation};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Everything a pipeline run has learned so far.
///
/// Invariants maintained by the methods below:
/// - `attempts <= max_attempts`
/// - once `escalate` is set it stays set, and no further retry is allowed
/// - `stage` only moves along [`PipelineStage::can_transition_to`]
#[derive(Debug, Clone, Serialize)]
pub struct PipelineState {
    pub request: Request,
    pub stage: PipelineStage,
    pub stage_history: Vec<PipelineStage>,
    pub context: Facts,
    pub intent: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub goal: Option<String>,
    pub plan: Option<Plan>,
    pub alternative_plans: VecDeque<Plan>,
    pub tool_results: BTreeMap<String, ToolResult>,
    pub observations: Facts,
    pub observation_summary: Option<String>,
    pub feasible: bool,
    pub feasibility_reason: String,
    pub feasibility_details: Option<RuleVerdict>,
    pub policy_ok: bool,
    /// False when the run ended before policy validation.
    pub policy_evaluated: bool,
    pub policy_violations: Vec<Violation>,
    pub confidence: Option<f64>,
    pub confidence_factors: BTreeMap<String, f64>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub escalate: bool,
    pub escalation_reason: Option<String>,
    pub coordination_check: Option<ConflictCheckResult>,
    pub coordination_degraded: bool,
    pub final_decision: Option<FinalDecision>,
    pub reasoning: String,
    pub notes: Vec<String>,
}

impl PipelineState {
    pub fn new(request: Request, max_attempts: u32) -> Self {
        Self {
            request,
            stage: PipelineStage::Initialized,
            stage_history: vec![PipelineStage::Initialized],
            context: Facts::new(),
            intent: None,
            risk_level: None,
            goal: None,
            plan: None,
            alternative_plans: VecDeque::new(),
            tool_results: BTreeMap::new(),
            observations: Facts::new(),
            observation_summary: None,
            feasible: false,
            feasibility_reason: String::new(),
            feasibility_details: None,
            policy_ok: false,
            policy_evaluated: false,
            policy_violations: Vec::new(),
            confidence: None,
            confidence_factors: BTreeMap::new(),
            attempts: 0,
            max_attempts,
            escalate: false,
            escalation_reason: None,
            coordination_check: None,
            coordination_degraded: false,
            final_decision: None,
            reasoning: String::new(),
            notes: Vec::new(),
        }
    }

    /// Move to `next`, refusing transitions the pipeline does not define.
    pub fn advance(&mut self, next: PipelineStage) -> Result<(), DomainError> {
        if !self.stage.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.stage.to_string(),
                to: next.to_string(),
            });
        }
        self.stage = next;
        self.stage_history.push(next);
        Ok(())
    }

    /// Set the escalation flag. The first reason wins.
    pub fn escalate(&mut self, reason: impl Into<String>) {
        if !self.escalate {
            self.escalate = true;
            self.escalation_reason = Some(reason.into());
        }
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn set_plans(&mut self, plans: PlanSet) {
        self.plan = Some(plans.primary);
        self.alternative_plans = plans.alternatives;
    }

    /// Whether another alternative may be tried.
    pub fn can_retry(&self) -> bool {
        !self.escalate && self.attempts < self.max_attempts && !self.alternative_plans.is_empty()
    }

    /// Swap in the next alternative plan and clear per-plan results.
    ///
    /// Returns `None` (and changes nothing) when [`can_retry`](Self::can_retry)
    /// is false.
    pub fn retry_with_next_alternative(&mut self) -> Option<&Plan> {
        if !self.can_retry() {
            return None;
        }
        let next = self.alternative_plans.pop_front()?;
        self.attempts += 1;
        self.plan = Some(next);
        self.tool_results.clear();
        self.observations.clear();
        self.observation_summary = None;
        self.feasible = false;
        self.feasibility_reason.clear();
        self.feasibility_details = None;
        self.coordination_check = None;
        self.plan.as_ref()
    }

    /// Record a feasibility verdict.
    pub fn record_feasibility(&mut self, verdict: RuleVerdict) {
        self.feasible = verdict.ok;
        self.feasibility_reason = verdict.reason.clone();
        self.feasibility_details = Some(verdict);
    }

    /// Mark the current plan infeasible without running any checks.
    pub fn mark_infeasible(&mut self, reason: impl Into<String>) {
        self.feasible = false;
        self.feasibility_reason = reason.into();
        self.feasibility_details = None;
    }

    pub fn record_policy(&mut self, verdict: RuleVerdict) {
        self.policy_ok = verdict.ok;
        self.policy_evaluated = true;
        self.policy_violations = verdict.violations;
    }

    /// Total number of plans tried so far, the primary included.
    pub fn plans_tried(&self) -> u32 {
        self.attempts + 1
    }

    pub fn feasibility_violation_count(&self) -> usize {
        self.feasibility_details
            .as_ref()
            .map(|v| v.violations.len())
            .unwrap_or(0)
    }

    /// Whether any tool ran during this pipeline run.
    pub fn tools_executed(&self) -> bool {
        self.stage_history.contains(&PipelineStage::ToolsExecuted)
    }

    pub fn all_tools_succeeded(&self) -> bool {
        self.tool_results.values().all(ToolResult::is_success)
    }
}
