//! Coordinate use case
//!
//! Arbitrates a batch of department decisions that may collide.
//!
//! ```text
//! DetectConflicts → AssessComplexity ─(none)──────────────────────────────→ Finalize
//!                          │                                                   ↑
//!                          ├─(all simple)→ ResolveWithRules ─┐                 │
//!                          │                                 ├→ CheckHumanApproval
//!                          └─(otherwise)─→ ResolveWithLlm ───┘        │
//!                                                                     └→ [EscalateHuman]
//! ```
//!
//! Resolution methods are never mixed within a run: one conflict that the
//! rules may not settle sends every conflict to negotiation.

mod hil;
mod types;

pub use types::{CoordinateError, CoordinationResult};

use crate::config::CoordinationParams;
use crate::ports::audit_logger::{AuditEvent, AuditLogger, NoAuditLogger};
use crate::ports::audit_store::AuditStore;
use crate::ports::human_approval::HumanApprovalPort;
use crate::ports::progress::{CoordinationProgressNotifier, NoProgress};
use crate::ports::reasoning_oracle::ReasoningOracle;
use crate::use_cases::negotiate::NegotiationEngine;
use chrono::Utc;
use civic_domain::{
    AgentDecision, ConflictDetector, CoordinationRecord, CoordinationStage, CoordinationState,
    Decision, ExecutionPlan, ResolutionDecision, ResolutionMethod, RuleEngine,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Use case for coordinating a batch of department decisions
pub struct CoordinateUseCase {
    pub(super) store: Arc<dyn AuditStore>,
    pub(super) approver: Option<Arc<dyn HumanApprovalPort>>,
    pub(super) audit_logger: Arc<dyn AuditLogger>,
    pub(super) progress: Arc<dyn CoordinationProgressNotifier>,
    pub(super) params: CoordinationParams,
    pub(super) cancellation_token: Option<CancellationToken>,
    detector: ConflictDetector,
    rules: RuleEngine,
    negotiator: NegotiationEngine,
}

impl CoordinateUseCase {
    pub fn new(
        store: Arc<dyn AuditStore>,
        oracle: Option<Arc<dyn ReasoningOracle>>,
        params: CoordinationParams,
    ) -> Self {
        Self {
            store,
            approver: None,
            audit_logger: Arc::new(NoAuditLogger),
            progress: Arc::new(NoProgress),
            detector: ConflictDetector::new(params.budget_ceiling),
            rules: RuleEngine::new(params.auto_approval_cost_limit, params.monsoon.clone()),
            negotiator: NegotiationEngine::new(
                oracle,
                params.oracle.clone(),
                params.monsoon.clone(),
                params.auto_approval_cost_limit,
            ),
            params,
            cancellation_token: None,
        }
    }

    pub fn with_approver(mut self, approver: Arc<dyn HumanApprovalPort>) -> Self {
        self.approver = Some(approver);
        self
    }

    pub fn with_audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit_logger = logger;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn CoordinationProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub async fn execute(&self, decisions: Vec<Decision>) -> Result<CoordinationResult, CoordinateError> {
        let candidates: Vec<AgentDecision> = decisions.iter().map(AgentDecision::from).collect();
        let mut state = CoordinationState::new(candidates);
        info!(
            coordination_id = %state.coordination_id,
            decisions = state.agent_decisions.len(),
            "Coordinating decisions"
        );

        self.detect(&mut state);
        self.advance(&mut state, CoordinationStage::AssessComplexity)?;

        if state.conflicts_detected.is_empty() {
            state.log("no conflicts; nothing to resolve");
        } else {
            if self
                .rules
                .can_resolve_all(&state.conflicts_detected, &state.agent_decisions)
            {
                self.advance(&mut state, CoordinationStage::ResolveWithRules)?;
                self.resolve_with_rules(&mut state);
            } else {
                self.advance(&mut state, CoordinationStage::ResolveWithLlm)?;
                self.resolve_with_llm(&mut state).await;
            }

            self.advance(&mut state, CoordinationStage::CheckHumanApproval)?;
            if let Some(reason) = self.needs_human(&state) {
                state.requires_human = true;
                self.advance(&mut state, CoordinationStage::EscalateHuman)?;
                self.escalate_to_human(&mut state, reason).await;
            } else {
                state.log("within automatic approval limits");
            }
        }

        self.advance(&mut state, CoordinationStage::Finalize)?;
        self.finalize(&mut state);
        let record = CoordinationRecord::from_state(&state);
        self.persist(&state, &record).await;

        info!(
            coordination_id = %state.coordination_id,
            decision = %record.final_decision,
            unresolved = record.unresolved,
            "Coordination finished"
        );
        Ok(CoordinationResult { state, record })
    }

    // ==================== Stages ====================

    fn detect(&self, state: &mut CoordinationState) {
        state.conflicts_detected = self
            .detector
            .detect_batch(&state.agent_decisions, Utc::now());
        let count = state.conflicts_detected.len();
        debug!(count, "Conflicts detected");
        state.log(format!("{} conflict(s) detected", count));
        self.progress.on_conflicts_detected(count);
    }

    fn resolve_with_rules(&self, state: &mut CoordinationState) {
        state.resolution_method = Some(ResolutionMethod::Rule);
        let now = Utc::now();
        let resolutions: Vec<_> = state
            .conflicts_detected
            .iter()
            .map(|c| self.rules.resolve_with_rules(c, &state.agent_decisions, now))
            .collect();
        for resolution in resolutions {
            self.record_resolution(state, resolution);
        }
    }

    async fn resolve_with_llm(&self, state: &mut CoordinationState) {
        state.resolution_method = Some(ResolutionMethod::Llm);
        let conflicts = state.conflicts_detected.clone();
        for conflict in &conflicts {
            let resolution = self
                .negotiator
                .negotiate(conflict, &state.agent_decisions)
                .await;
            self.record_resolution(state, resolution);
        }
    }

    fn record_resolution(&self, state: &mut CoordinationState, resolution: civic_domain::Resolution) {
        state.log(format!(
            "{} resolution for {}: {} ({})",
            resolution.method, resolution.conflict_id, resolution.decision, resolution.rationale
        ));
        self.progress.on_resolution(&resolution);
        state.resolutions.push(resolution);
    }

    /// Settle the final decision and execution plan.
    ///
    /// A human verdict wins, then the first resolution (its decision and its
    /// execution plan); a run without conflicts approves everything. An
    /// unresolved escalation stays an escalation.
    fn finalize(&self, state: &mut CoordinationState) {
        let everyone: Vec<String> = state.departments().iter().map(|d| d.to_string()).collect();
        let proposed = state
            .resolutions
            .first()
            .map(|r| r.execution_plan.clone())
            .unwrap_or_default();

        let (decision, plan) = if state.unresolved {
            (ResolutionDecision::Escalate, proposed)
        } else if let Some(verdict) = &state.human_verdict {
            let plan = match (&verdict.execution_plan, verdict.decision) {
                (Some(plan), _) => plan.clone(),
                (None, ResolutionDecision::ApproveAll) => ExecutionPlan {
                    approved: everyone,
                    deferred: Vec::new(),
                },
                (None, ResolutionDecision::Reject | ResolutionDecision::Defer) => ExecutionPlan {
                    approved: Vec::new(),
                    deferred: everyone,
                },
                (None, _) => proposed,
            };
            (verdict.decision, plan)
        } else if let Some(first) = state.resolutions.first() {
            (first.decision, proposed)
        } else {
            (
                ResolutionDecision::ApproveAll,
                ExecutionPlan {
                    approved: everyone,
                    deferred: Vec::new(),
                },
            )
        };

        state.final_decision = Some(decision);
        state.execution_plan = plan;
        state.completed_at = Some(Utc::now());
        state.log(format!("final decision: {}", decision));
    }

    async fn persist(&self, state: &CoordinationState, record: &CoordinationRecord) {
        for conflict in &state.conflicts_detected {
            if let Err(e) = self.store.insert_conflict(conflict).await {
                warn!(conflict_id = %conflict.conflict_id, "Failed to persist conflict: {}", e);
            }
        }
        for resolution in &state.resolutions {
            if let Err(e) = self.store.insert_resolution(resolution).await {
                warn!(resolution_id = %resolution.resolution_id, "Failed to persist resolution: {}", e);
            }
            self.audit_logger.log(AuditEvent::new(
                "conflict_resolved",
                json!({
                    "coordination_id": state.coordination_id,
                    "conflict_id": resolution.conflict_id,
                    "method": resolution.method,
                    "decision": resolution.decision,
                    "confidence": resolution.confidence,
                    "requires_human": resolution.requires_human,
                }),
            ));
        }
        if let Err(e) = self.store.insert_coordination(record).await {
            warn!(coordination_id = %record.coordination_id, "Failed to persist coordination: {}", e);
        }
        self.audit_logger.log(AuditEvent::new(
            "coordination_completed",
            json!({
                "coordination_id": record.coordination_id,
                "departments": record.departments,
                "conflicts": record.conflict_ids.len(),
                "method": record.method,
                "final_decision": record.final_decision,
                "execution_plan": record.execution_plan,
                "unresolved": record.unresolved,
            }),
        ));
    }

    fn advance(
        &self,
        state: &mut CoordinationState,
        next: CoordinationStage,
    ) -> Result<(), CoordinateError> {
        state.advance(next)?;
        self.progress.on_stage_change(next);
        Ok(())
    }
}
