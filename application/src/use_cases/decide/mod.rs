//! Decide use case
//!
//! Runs one request through a department's bounded decision pipeline. The
//! same engine serves every department; what differs is the injected
//! [`RuleTable`] and data port.
//!
//! ```text
//! Initialized → ContextLoaded → IntentAnalyzed ──(critical risk)──────────────→ Output
//!                                     │
//!                                     ↓
//!                         GoalsSet → Planned → [CoordinationChecked] → ToolsExecuted
//!                                                  ↑        │              ↓
//!                                                  │        └──(conflict)  Observed
//!                                                  │                 ↘     ↓
//!                                                  └──(retry)────── FeasibilityChecked
//!                                                                          ↓
//!                        Output ← Routed ← ConfidenceEstimated ← Logged ← PolicyValidated
//! ```
//!
//! Retries pop the next alternative plan while the plan is infeasible,
//! alternatives remain and `attempts < max_attempts`. Escalation stops
//! retries for good. A checkpoint that demands human review ends the run at
//! `CoordinationChecked → Output` without feasibility or policy work.
//!
//! Cancellation is honoured only before the run starts; once started, a run
//! always ends in a recorded decision.

mod observer;
mod planner;
mod tool_executor;
mod types;

pub use types::{DecideError, DecideOutput};

use crate::config::PipelineParams;
use crate::ports::audit_logger::{AuditEvent, AuditLogger, NoAuditLogger};
use crate::ports::audit_store::AuditStore;
use crate::ports::coordination_checkpoint::{CoordinationCheckpoint, CoordinationError};
use crate::ports::department_data::DepartmentDataPort;
use crate::ports::progress::{NoProgress, PipelineProgressNotifier};
use crate::ports::reasoning_oracle::ReasoningOracle;
use crate::use_cases::shared::check_cancelled;
use civic_domain::{
    ConfidenceCalculator, ConfidenceInputs, ConflictQuery, Decision, DecisionRouter, Department,
    DomainError, FeasibilityEvaluator, FinalDecision, PipelineStage, PipelineState,
    PolicyValidator, Request, RiskLevel, RuleTable,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Use case for deciding one department request
pub struct DecideUseCase {
    table: Arc<RuleTable>,
    data: Arc<dyn DepartmentDataPort>,
    store: Arc<dyn AuditStore>,
    oracle: Option<Arc<dyn ReasoningOracle>>,
    checkpoint: Option<Arc<dyn CoordinationCheckpoint>>,
    audit_logger: Arc<dyn AuditLogger>,
    progress: Arc<dyn PipelineProgressNotifier>,
    params: PipelineParams,
    cancellation_token: Option<CancellationToken>,
}

impl DecideUseCase {
    pub fn new(
        table: Arc<RuleTable>,
        data: Arc<dyn DepartmentDataPort>,
        store: Arc<dyn AuditStore>,
        params: PipelineParams,
    ) -> Self {
        Self {
            table,
            data,
            store,
            oracle: None,
            checkpoint: None,
            audit_logger: Arc::new(NoAuditLogger),
            progress: Arc::new(NoProgress),
            params,
            cancellation_token: None,
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn ReasoningOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Consult `checkpoint` before running tools (when enabled in params).
    pub fn with_checkpoint(mut self, checkpoint: Arc<dyn CoordinationCheckpoint>) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn with_audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit_logger = logger;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn PipelineProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    /// Refuse to start new runs once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn department(&self) -> Department {
        self.table.department
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Decide `request`, record the decision and return it with the final
    /// state.
    ///
    /// Only invalid input and cancellation are errors. An internal invariant
    /// violation is turned into an escalate decision carrying the error text.
    pub async fn execute(&self, request: Request) -> Result<DecideOutput, DecideError> {
        request.validate()?;
        if request.department != self.table.department {
            return Err(DecideError::UnknownDepartment(request.department));
        }
        check_cancelled(&self.cancellation_token).map_err(|_| DecideError::Cancelled)?;

        let started = Instant::now();
        info!(
            department = %request.department,
            kind = %request.kind,
            location = %request.location,
            "Deciding request"
        );

        let state = PipelineState::new(request, self.params.max_attempts);
        Ok(self.decide(state, started).await)
    }

    /// Run the pipeline from `state` and record whatever it concludes.
    async fn decide(&self, mut state: PipelineState, started: Instant) -> DecideOutput {
        if let Err(e) = self.run(&mut state).await {
            error!("Pipeline aborted: {}", e);
            state.escalate(format!("internal error: {}", e));
            state.final_decision = Some(FinalDecision::Escalate);
            state.reasoning = format!("Pipeline aborted: {}", e);
        }

        let decision = Decision::from_state(&state, started.elapsed().as_millis() as u64);
        self.record(&decision).await;

        info!(
            department = %decision.department,
            decision = %decision.final_decision,
            confidence = decision.confidence,
            "Decision recorded"
        );
        DecideOutput { decision, state }
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        self.load_context(state).await?;
        self.analyze_intent(state)?;

        if state.risk_level == Some(RiskLevel::Critical) {
            return self.fast_path(state);
        }

        self.set_goal(state)?;
        self.plan(state).await?;

        loop {
            let blocked = if self.checkpoint_enabled() {
                self.advance(state, PipelineStage::CoordinationChecked)?;
                let blocked = self.coordination_check(state).await;
                if state.escalate {
                    return self.escalate_now(state);
                }
                blocked
            } else {
                false
            };

            if blocked {
                self.advance(state, PipelineStage::FeasibilityChecked)?;
            } else {
                self.execute_tools(state).await?;
                self.observe(state).await?;
                self.check_feasibility(state)?;
            }

            if state.feasible || !state.can_retry() {
                break;
            }

            let reason = state.feasibility_reason.clone();
            if let Some(next) = state.retry_with_next_alternative() {
                let name = next.name.clone();
                info!(attempt = state.attempts, plan = %name, "Retrying with alternative plan: {}", reason);
                state.note(format!("plan infeasible ({}); trying '{}'", reason, name));
                if let Some(plan) = &state.plan {
                    self.progress
                        .on_retry(state.request.department, state.attempts, plan);
                }
            }
        }

        self.validate_policy(state)?;
        self.log_evaluation(state)?;
        self.estimate_confidence(state)?;
        self.route(state)?;
        self.advance(state, PipelineStage::Output)
    }

    // ==================== Stages ====================

    async fn load_context(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        match self.data.fetch_context(&state.request.location).await {
            Ok(context) => state.context = context,
            Err(e) => {
                warn!("Context unavailable, continuing without it: {}", e);
                state.note(format!("context unavailable: {}", e));
            }
        }
        self.advance(state, PipelineStage::ContextLoaded)
    }

    fn analyze_intent(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        let profile = self.table.classify(&state.request.kind);
        let risk = self.table.assess_risk(
            profile,
            &state.request,
            self.params.auto_approval_cost_limit,
        );
        debug!(intent = %profile.intent, risk = %risk, "Intent analyzed");
        state.intent = Some(profile.intent.clone());
        state.risk_level = Some(risk);
        self.advance(state, PipelineStage::IntentAnalyzed)
    }

    /// Critical risk goes straight to a human without running any tool.
    fn fast_path(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        let reason = format!(
            "Critical risk for '{}' at {}: immediate human review required",
            state.request.kind, state.request.location
        );
        warn!(department = %state.request.department, "{}", reason);
        state.escalate(reason.clone());
        self.progress
            .on_escalation(state.request.department, &reason);
        self.escalate_now(state)
    }

    /// End an escalated run: score it and go straight to `Output`.
    fn escalate_now(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        let score = ConfidenceCalculator::new(self.params.confidence_weights.clone())
            .calculate(&ConfidenceInputs::from(&*state));
        state.confidence = Some(score.value);
        state.confidence_factors = score.factors;
        state.final_decision = Some(FinalDecision::Escalate);
        state.reasoning = format!(
            "Escalated without execution: {}",
            state.escalation_reason.as_deref().unwrap_or("escalation requested")
        );
        self.advance(state, PipelineStage::Output)
    }

    fn set_goal(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        let intent = state.intent.clone().unwrap_or_default();
        let profile = self.table.profile(&intent);
        state.goal = Some(self.table.goal_for(profile, &state.request));
        self.advance(state, PipelineStage::GoalsSet)
    }

    async fn plan(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        let outcome = planner::plan(
            &self.table,
            self.oracle.as_deref(),
            &self.params.oracle,
            state,
        )
        .await;
        state.note(outcome.note);
        state.set_plans(outcome.plans);
        self.advance(state, PipelineStage::Planned)
    }

    /// Returns true when the current plan must not run.
    async fn coordination_check(&self, state: &mut PipelineState) -> bool {
        let Some(checkpoint) = &self.checkpoint else {
            return false;
        };
        let Some(query) = ConflictQuery::from_state(state) else {
            return false;
        };
        let department = state.request.department;

        let answer =
            match tokio::time::timeout(self.params.checkpoint_timeout, checkpoint.check(&query))
                .await
            {
                Ok(answer) => answer,
                Err(_) => Err(CoordinationError::Timeout),
            };

        let result = match answer {
            Ok(result) => result,
            Err(e) => {
                warn!(department = %department, "Coordination checkpoint unavailable, proceeding: {}", e);
                state.coordination_degraded = true;
                state.note(format!("coordination checkpoint degraded: {}", e));
                self.progress
                    .on_checkpoint_degraded(department, &e.to_string());
                return false;
            }
        };

        self.progress.on_checkpoint(department, &result);
        let blocked = result.has_conflicts;
        if result.requires_human {
            let reason = format!("Coordination requires human review: {}", result.summary());
            self.progress.on_escalation(department, &reason);
            state.escalate(reason);
        }
        if blocked {
            debug!(department = %department, "Checkpoint reported conflicts: {}", result.summary());
            state.mark_infeasible(format!("coordination conflict: {}", result.summary()));
        }
        state.coordination_check = Some(result);
        blocked
    }

    async fn execute_tools(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        let results = match &state.plan {
            Some(plan) => {
                tool_executor::execute_plan(self.data.as_ref(), plan, self.progress.as_ref()).await
            }
            None => Default::default(),
        };
        state.tool_results = results;
        if !state.all_tools_succeeded() {
            state.note("some tools failed; their facts are missing");
        }
        self.advance(state, PipelineStage::ToolsExecuted)
    }

    async fn observe(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        state.observations = observer::observe(state);
        if self.params.observer_summary
            && let Some(oracle) = &self.oracle
        {
            state.observation_summary =
                observer::summarize(oracle.as_ref(), &self.params.oracle, state).await;
        }
        self.advance(state, PipelineStage::Observed)
    }

    fn check_feasibility(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        let intent = state.intent.clone().unwrap_or_default();
        let verdict = FeasibilityEvaluator::new(&self.table).evaluate(
            &intent,
            &state.observations,
            &state.request,
            state.plan.as_ref(),
        );
        debug!(feasible = verdict.ok, "{}", verdict.reason);
        state.record_feasibility(verdict);
        self.advance(state, PipelineStage::FeasibilityChecked)
    }

    fn validate_policy(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        let intent = state.intent.clone().unwrap_or_default();
        let verdict = PolicyValidator::new(&self.table).validate(
            &intent,
            &state.observations,
            &state.request,
            state.plan.as_ref(),
        );
        debug!(policy_ok = verdict.ok, "{}", verdict.reason);
        state.record_policy(verdict);
        self.advance(state, PipelineStage::PolicyValidated)
    }

    fn log_evaluation(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        self.advance(state, PipelineStage::Logged)?;
        info!(
            department = %state.request.department,
            intent = state.intent.as_deref().unwrap_or_default(),
            feasible = state.feasible,
            policy_ok = state.policy_ok,
            attempts = state.attempts,
            "Pipeline evaluated"
        );
        self.audit_logger.log(AuditEvent::new(
            "pipeline_evaluated",
            json!({
                "department": state.request.department,
                "requester_id": state.request.requester_id,
                "kind": state.request.kind,
                "location": state.request.location,
                "intent": state.intent,
                "risk_level": state.risk_level,
                "plan": state.plan.as_ref().map(|p| p.name.clone()),
                "attempts": state.attempts,
                "feasible": state.feasible,
                "feasibility_reason": state.feasibility_reason,
                "policy_ok": state.policy_ok,
                "policy_violations": state.policy_violations.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "coordination_degraded": state.coordination_degraded,
                "escalate": state.escalate,
            }),
        ));
        Ok(())
    }

    fn estimate_confidence(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        let score = ConfidenceCalculator::new(self.params.confidence_weights.clone())
            .calculate(&ConfidenceInputs::from(&*state));
        state.confidence = Some(score.value);
        state.confidence_factors = score.factors;
        self.advance(state, PipelineStage::ConfidenceEstimated)
    }

    fn route(&self, state: &mut PipelineState) -> Result<(), DomainError> {
        let outcome = DecisionRouter::new(self.params.confidence_threshold).route(state);
        if let Some(reason) = &outcome.escalation_reason {
            if !state.escalate {
                self.progress
                    .on_escalation(state.request.department, reason);
            }
            state.escalate(reason.clone());
        }
        state.final_decision = Some(outcome.decision);
        state.reasoning = outcome.reasoning;
        self.advance(state, PipelineStage::Routed)
    }

    // ==================== Helpers ====================

    fn checkpoint_enabled(&self) -> bool {
        self.params.coordination_checkpoint && self.checkpoint.is_some()
    }

    fn advance(&self, state: &mut PipelineState, next: PipelineStage) -> Result<(), DomainError> {
        state.advance(next)?;
        self.progress
            .on_stage_change(state.request.department, next);
        Ok(())
    }

    async fn record(&self, decision: &Decision) {
        if let Err(e) = self.store.insert_decision(decision).await {
            warn!(decision_id = %decision.decision_id, "Failed to persist decision: {}", e);
        }
        self.audit_logger.log(AuditEvent::new(
            "decision_recorded",
            json!({
                "decision_id": decision.decision_id,
                "department": decision.department,
                "final_decision": decision.final_decision,
                "status": decision.status,
                "confidence": decision.confidence,
                "escalation_reason": decision.escalation_reason,
                "execution_time_ms": decision.execution_time_ms,
            }),
        ));
        self.progress.on_decision(decision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::coordination_checkpoint::CoordinationError;
    use crate::use_cases::test_support::{
        FixedCheckpoint, MemoryStore, MockDataPort, RecordingLogger, ScriptedOracle,
    };
    use civic_domain::{
        Conflict, ConflictCheckResult, ConflictSeverity, ConflictType, FactRule, IntentProfile,
        NamedCheck, PlanTemplate, Priority, ToolResult, ToolStatus, departments,
    };
    use proptest::prelude::*;
    use std::sync::Mutex;
    use std::time::Duration;

    // ==================== Test Helpers ====================

    fn water_request() -> Request {
        Request::new("citizen-17", Department::Water, "pipe_burst", "ward-3")
            .with_resource("repair_crew")
            .with_cost(8_000.0)
            .with_payload("crews_required", 2)
            .with_payload("max_outage_hours", 12)
    }

    /// Everything the in-house repair needs, reported as available.
    fn healthy_water_data() -> MockDataPort {
        MockDataPort::new(Department::Water)
            .with_context("ward_population", 42_000)
            .with_tool(
                ToolResult::new("check_crew_availability", ToolStatus::Available)
                    .with_field("crews_available", 3),
            )
            .with_tool(
                ToolResult::new("check_pipeline_condition", ToolStatus::Operational)
                    .with_field("pipeline_repairable", true)
                    .with_field("estimated_outage_hours", 6)
                    .with_field("excavation_permit", true),
            )
            .with_tool(
                ToolResult::new("check_budget", ToolStatus::WithinLimits)
                    .with_field("budget_available", 120_000),
            )
    }

    fn use_case(data: MockDataPort, store: Arc<MemoryStore>) -> DecideUseCase {
        DecideUseCase::new(
            Arc::new(departments::builtin(Department::Water)),
            Arc::new(data),
            store,
            PipelineParams::default(),
        )
    }

    fn conflict(severity: ConflictSeverity) -> Conflict {
        Conflict::new(
            ConflictType::Resource,
            severity,
            "ward-3",
            [Department::Water, Department::Engineering],
            [uuid::Uuid::new_v4()],
            "shared excavator",
            chrono::Utc::now(),
        )
    }

    /// Records every stage change so tests can assert on the path taken.
    #[derive(Default)]
    struct TrackingProgress {
        stages: Mutex<Vec<PipelineStage>>,
        retries: Mutex<Vec<String>>,
        degraded: Mutex<u32>,
    }

    impl PipelineProgressNotifier for TrackingProgress {
        fn on_stage_change(&self, _department: Department, stage: PipelineStage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_retry(&self, _department: Department, _attempt: u32, plan: &civic_domain::Plan) {
            self.retries.lock().unwrap().push(plan.name.clone());
        }

        fn on_checkpoint_degraded(&self, _department: Department, _error: &str) {
            *self.degraded.lock().unwrap() += 1;
        }
    }

    // ==================== Happy Path ====================

    #[tokio::test]
    async fn test_feasible_request_is_approved_and_recorded() {
        let store = Arc::new(MemoryStore::default());
        let logger = Arc::new(RecordingLogger::default());
        let uc = use_case(healthy_water_data(), store.clone()).with_audit_logger(logger.clone());

        let output = uc.execute(water_request()).await.unwrap();

        assert_eq!(output.decision.final_decision, FinalDecision::Approve);
        assert!(output.decision.feasible);
        assert!(output.decision.policy_compliant);
        assert!(output.decision.confidence >= 0.7);
        assert_eq!(output.state.attempts, 0);
        assert_eq!(output.state.stage, PipelineStage::Output);
        assert_eq!(store.decision_count(), 1);
        assert_eq!(
            logger.event_types(),
            vec!["pipeline_evaluated", "decision_recorded"]
        );
    }

    #[tokio::test]
    async fn test_confidence_factors_sum_to_value() {
        let uc = use_case(healthy_water_data(), Arc::new(MemoryStore::default()));
        let output = uc.execute(water_request()).await.unwrap();

        let sum: f64 = 0.5 + output.decision.confidence_factors.values().sum::<f64>();
        assert!((sum - output.decision.confidence).abs() < 1e-9);
    }

    // ==================== Validation ====================

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_pipeline() {
        let store = Arc::new(MemoryStore::default());
        let uc = use_case(healthy_water_data(), store.clone());

        let err = uc
            .execute(Request::new("", Department::Water, "pipe_burst", "ward-3"))
            .await
            .unwrap_err();

        assert!(matches!(err, DecideError::Validation(_)));
        assert_eq!(store.decision_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_department_is_an_error() {
        let uc = use_case(healthy_water_data(), Arc::new(MemoryStore::default()));
        let err = uc
            .execute(Request::new("r", Department::Fire, "fire", "ward-3"))
            .await
            .unwrap_err();
        assert!(matches!(err, DecideError::UnknownDepartment(Department::Fire)));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let uc = use_case(healthy_water_data(), Arc::new(MemoryStore::default()))
            .with_cancellation(token);

        let err = uc.execute(water_request()).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    // ==================== Critical Fast Path ====================

    #[tokio::test]
    async fn test_critical_risk_escalates_without_tools() {
        let data = healthy_water_data();
        let store = Arc::new(MemoryStore::default());
        let uc = DecideUseCase::new(
            Arc::new(departments::builtin(Department::Water)),
            Arc::new(data),
            store.clone(),
            PipelineParams::default(),
        );

        let request = water_request().with_payload("public_safety_hazard", true);
        let output = uc.execute(request).await.unwrap();

        assert_eq!(output.decision.final_decision, FinalDecision::Escalate);
        assert!(output.state.escalate);
        assert!(!output.state.tools_executed());
        assert!(output.state.tool_results.is_empty());
        assert_eq!(
            output.state.stage_history.last(),
            Some(&PipelineStage::Output)
        );
        assert!(!output.state.stage_history.contains(&PipelineStage::Routed));
        assert_eq!(store.decision_count(), 1);
    }

    // ==================== Retry Loop ====================

    #[tokio::test]
    async fn test_infeasible_primary_retries_with_alternative() {
        // No municipal crews, but contractors are free.
        let data = MockDataPort::new(Department::Water)
            .with_tool(
                ToolResult::new("check_crew_availability", ToolStatus::Available)
                    .with_field("crews_available", 0),
            )
            .with_tool(
                ToolResult::new("check_contractor_availability", ToolStatus::Available)
                    .with_field("crews_available", 4),
            )
            .with_tool(
                ToolResult::new("check_pipeline_condition", ToolStatus::Operational)
                    .with_field("pipeline_repairable", true)
                    .with_field("estimated_outage_hours", 6)
                    .with_field("excavation_permit", true),
            )
            .with_tool(
                ToolResult::new("check_budget", ToolStatus::WithinLimits)
                    .with_field("budget_available", 120_000),
            );
        let progress = Arc::new(TrackingProgress::default());
        let uc = use_case(data, Arc::new(MemoryStore::default())).with_progress(progress.clone());

        let output = uc.execute(water_request()).await.unwrap();

        assert_eq!(output.state.attempts, 1);
        assert!(output.state.feasible);
        assert_eq!(
            output.state.plan.as_ref().map(|p| p.name.as_str()),
            Some("contractor_repair")
        );
        assert_eq!(*progress.retries.lock().unwrap(), vec!["contractor_repair"]);
    }

    #[tokio::test]
    async fn test_exhausted_alternatives_escalate() {
        let data = MockDataPort::new(Department::Water);
        let uc = use_case(data, Arc::new(MemoryStore::default()));

        let output = uc.execute(water_request()).await.unwrap();

        assert!(!output.state.feasible);
        assert_eq!(output.decision.final_decision, FinalDecision::Escalate);
        assert!(
            output
                .decision
                .escalation_reason
                .as_deref()
                .unwrap_or_default()
                .starts_with("No feasible plan found after 2 attempts")
        );
    }

    // ==================== Oracle ====================

    #[tokio::test]
    async fn test_oracle_garbage_falls_back_to_templates() {
        let oracle = Arc::new(ScriptedOracle::replying(&["I think you should fix the pipe."]));
        let uc = use_case(healthy_water_data(), Arc::new(MemoryStore::default()))
            .with_oracle(oracle.clone());

        let output = uc.execute(water_request()).await.unwrap();

        assert_eq!(oracle.call_count(), 1);
        assert_eq!(output.decision.final_decision, FinalDecision::Approve);
        assert_eq!(
            output.state.plan.as_ref().map(|p| p.name.as_str()),
            Some("in_house_repair")
        );
    }

    // ==================== Coordination Checkpoint ====================

    #[tokio::test]
    async fn test_checkpoint_conflict_marks_plan_infeasible_and_retries() {
        let checkpoint = Arc::new(FixedCheckpoint::answering(Ok(
            ConflictCheckResult::from_conflicts(vec![conflict(ConflictSeverity::Medium)]),
        )));
        let data = Arc::new(healthy_water_data());
        let uc = DecideUseCase::new(
            Arc::new(departments::builtin(Department::Water)),
            data.clone(),
            Arc::new(MemoryStore::default()),
            PipelineParams::default(),
        )
        .with_checkpoint(checkpoint.clone());

        let output = uc.execute(water_request()).await.unwrap();

        // Primary and one alternative were both checked; neither ran tools.
        assert_eq!(checkpoint.call_count(), 2);
        assert!(data.calls().is_empty());
        assert!(output.state.feasibility_reason.starts_with("coordination conflict"));
        assert_eq!(output.decision.final_decision, FinalDecision::Escalate);
    }

    #[tokio::test]
    async fn test_checkpoint_requiring_human_escalates_immediately() {
        let checkpoint = Arc::new(FixedCheckpoint::answering(Ok(
            ConflictCheckResult::from_conflicts(vec![conflict(ConflictSeverity::High)]),
        )));
        let uc = use_case(healthy_water_data(), Arc::new(MemoryStore::default()))
            .with_checkpoint(checkpoint.clone());

        let output = uc.execute(water_request()).await.unwrap();

        assert_eq!(checkpoint.call_count(), 1);
        assert!(output.state.escalate);
        assert_eq!(output.state.attempts, 0);
        assert_eq!(output.decision.final_decision, FinalDecision::Escalate);
        assert!(
            output
                .decision
                .escalation_reason
                .as_deref()
                .unwrap_or_default()
                .starts_with("Coordination requires human review")
        );
        let history = &output.state.stage_history;
        assert_eq!(
            &history[history.len() - 2..],
            &[PipelineStage::CoordinationChecked, PipelineStage::Output]
        );
        assert!(!history.contains(&PipelineStage::PolicyValidated));
        assert!(!history.contains(&PipelineStage::Routed));
        assert!(output.state.confidence.is_some());
    }

    #[tokio::test]
    async fn test_human_review_checkpoint_records_no_policy_verdict() {
        // No water data at all: running policy checks would invent
        // "missing observation" violations.
        let checkpoint = Arc::new(FixedCheckpoint::answering(Ok(
            ConflictCheckResult::from_conflicts(vec![conflict(ConflictSeverity::High)]),
        )));
        let store = Arc::new(MemoryStore::default());
        let data = Arc::new(MockDataPort::new(Department::Water));
        let uc = DecideUseCase::new(
            Arc::new(departments::builtin(Department::Water)),
            data.clone(),
            store.clone(),
            PipelineParams::default(),
        )
        .with_checkpoint(checkpoint);

        let output = uc.execute(water_request()).await.unwrap();

        assert!(data.calls().is_empty());
        assert!(!output.decision.policy_evaluated);
        assert!(output.state.policy_violations.is_empty());
        assert_eq!(output.decision.status, civic_domain::DecisionStatus::PendingReview);
        assert_eq!(store.decision_count(), 1);
    }

    #[tokio::test]
    async fn test_completed_run_marks_policy_evaluated() {
        let uc = use_case(healthy_water_data(), Arc::new(MemoryStore::default()));
        let output = uc.execute(water_request()).await.unwrap();
        assert!(output.decision.policy_evaluated);
    }

    #[tokio::test]
    async fn test_checkpoint_failure_degrades_and_proceeds() {
        let checkpoint = Arc::new(FixedCheckpoint::answering(Err(
            CoordinationError::Unavailable("connection refused".to_string()),
        )));
        let progress = Arc::new(TrackingProgress::default());
        let uc = use_case(healthy_water_data(), Arc::new(MemoryStore::default()))
            .with_checkpoint(checkpoint)
            .with_progress(progress.clone());

        let output = uc.execute(water_request()).await.unwrap();

        assert!(output.state.coordination_degraded);
        assert_eq!(output.decision.final_decision, FinalDecision::Approve);
        assert_eq!(*progress.degraded.lock().unwrap(), 1);
        assert!(
            output
                .state
                .notes
                .iter()
                .any(|n| n.contains("coordination checkpoint degraded"))
        );
    }

    #[tokio::test]
    async fn test_checkpoint_disabled_in_params_is_skipped() {
        let checkpoint = Arc::new(FixedCheckpoint::clear());
        let uc = DecideUseCase::new(
            Arc::new(departments::builtin(Department::Water)),
            Arc::new(healthy_water_data()),
            Arc::new(MemoryStore::default()),
            PipelineParams::default().with_coordination_checkpoint(false),
        )
        .with_checkpoint(checkpoint.clone());

        let output = uc.execute(water_request()).await.unwrap();

        assert_eq!(checkpoint.call_count(), 0);
        assert!(
            !output
                .state
                .stage_history
                .contains(&PipelineStage::CoordinationChecked)
        );
    }

    // ==================== Cancellation and Internal Errors ====================

    /// Checkpoint that cancels the run's token the first time it is asked.
    struct CancellingCheckpoint {
        token: CancellationToken,
    }

    #[async_trait::async_trait]
    impl CoordinationCheckpoint for CancellingCheckpoint {
        async fn check(
            &self,
            _query: &ConflictQuery,
        ) -> Result<ConflictCheckResult, CoordinationError> {
            self.token.cancel();
            Ok(ConflictCheckResult::clear())
        }
    }

    #[tokio::test]
    async fn test_cancel_after_start_still_records_decision() {
        let token = CancellationToken::new();
        let store = Arc::new(MemoryStore::default());
        let uc = use_case(healthy_water_data(), store.clone())
            .with_checkpoint(Arc::new(CancellingCheckpoint {
                token: token.clone(),
            }))
            .with_cancellation(token.clone());

        let output = uc.execute(water_request()).await.unwrap();

        assert!(token.is_cancelled());
        assert!(output.state.tools_executed());
        assert_eq!(output.state.stage, PipelineStage::Output);
        assert_eq!(output.decision.final_decision, FinalDecision::Approve);
        assert_eq!(store.decision_count(), 1);

        // The next run is refused before it starts.
        assert!(uc.execute(water_request()).await.unwrap_err().is_cancelled());
        assert_eq!(store.decision_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_transition_becomes_escalation() {
        let store = Arc::new(MemoryStore::default());
        let uc = use_case(healthy_water_data(), store.clone());

        // Context already loaded, so the pipeline's own first step is illegal.
        let mut state = PipelineState::new(water_request(), 3);
        state.advance(PipelineStage::ContextLoaded).unwrap();

        let output = uc.decide(state, Instant::now()).await;

        assert_eq!(output.decision.final_decision, FinalDecision::Escalate);
        assert!(output.state.escalate);
        let reason = output.decision.escalation_reason.as_deref().unwrap_or_default();
        assert!(reason.starts_with("internal error:"), "{}", reason);
        assert!(reason.contains("context_loaded"));
        assert!(output.decision.reasoning.starts_with("Pipeline aborted"));
        assert_eq!(store.decision_count(), 1);
    }

    // ==================== Degraded Inputs ====================

    #[tokio::test]
    async fn test_context_failure_is_noted_not_fatal() {
        let uc = use_case(
            healthy_water_data().with_failing_context(),
            Arc::new(MemoryStore::default()),
        );
        let output = uc.execute(water_request()).await.unwrap();

        assert!(output.state.context.is_empty());
        assert!(output.state.notes.iter().any(|n| n.contains("context unavailable")));
        assert_eq!(output.decision.final_decision, FinalDecision::Approve);
    }

    #[tokio::test]
    async fn test_blocking_policy_violation_rejects() {
        let data = MockDataPort::new(Department::Water)
            .with_tool(
                ToolResult::new("check_crew_availability", ToolStatus::Available)
                    .with_field("crews_available", 3),
            )
            .with_tool(
                ToolResult::new("check_pipeline_condition", ToolStatus::Operational)
                    .with_field("pipeline_repairable", true)
                    .with_field("estimated_outage_hours", 6)
                    .with_field("excavation_permit", false),
            )
            .with_tool(
                ToolResult::new("check_budget", ToolStatus::WithinLimits)
                    .with_field("budget_available", 120_000),
            );
        let uc = use_case(data, Arc::new(MemoryStore::default()));

        let output = uc.execute(water_request()).await.unwrap();
        assert_eq!(output.decision.final_decision, FinalDecision::Reject);
        assert!(!output.state.escalate);
    }

    #[tokio::test]
    async fn test_emergency_priority_raises_risk() {
        let uc = use_case(healthy_water_data(), Arc::new(MemoryStore::default()));
        let output = uc
            .execute(water_request().with_priority(Priority::High))
            .await
            .unwrap();
        assert_eq!(output.state.risk_level, Some(RiskLevel::Medium));

        let critical = uc
            .execute(water_request().with_priority(Priority::Critical))
            .await
            .unwrap();
        assert_eq!(critical.state.risk_level, Some(RiskLevel::High));
        assert!(
            critical.decision.confidence_factors["risk"]
                < output.decision.confidence_factors["risk"]
        );
    }

    // ==================== Property Tests ====================

    fn run_blocking<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    /// A table whose `n + 1` plans each call their own tool; a plan is
    /// feasible when its tool reports a free unit.
    fn generated_table(n: usize) -> RuleTable {
        let profile = (0..=n).fold(
            IntentProfile::new("maintenance", "maintain {location}").feasibility(
                NamedCheck::new(
                    "unit_free",
                    FactRule::Min {
                        fact: "units_available".to_string(),
                        min: 1.0,
                    },
                )
                .blocking(),
            ),
            |profile, i| {
                profile.template(
                    PlanTemplate::new(format!("plan_{}", i)).step(format!("check_unit_{}", i), json!({})),
                )
            },
        );
        RuleTable::new(Department::Water, profile)
    }

    fn generated_data(free: &[bool]) -> MockDataPort {
        free.iter().enumerate().fold(
            MockDataPort::new(Department::Water),
            |data, (i, free)| {
                data.with_tool(
                    ToolResult::new(format!("check_unit_{}", i), ToolStatus::Available)
                        .with_field("units_available", u32::from(*free)),
                )
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// However many alternatives exist and whichever of them could work,
        /// the attempt count never exceeds the configured bound.
        #[test]
        fn prop_attempts_bounded(
            free in proptest::collection::vec(any::<bool>(), 1..8),
            max_attempts in 0u32..6,
        ) {
            let alternatives = free.len() - 1;
            let uc = DecideUseCase::new(
                Arc::new(generated_table(alternatives)),
                Arc::new(generated_data(&free)),
                Arc::new(MemoryStore::default()),
                PipelineParams::default().with_max_attempts(max_attempts),
            );
            let request = Request::new("r", Department::Water, "maintenance", "ward-2");

            let output = run_blocking(uc.execute(request)).unwrap();

            prop_assert!(output.state.attempts <= max_attempts);
            prop_assert_eq!(output.state.stage, PipelineStage::Output);

            let tried = output.state.plans_tried() as usize;
            let reachable = (max_attempts as usize).min(alternatives) + 1;
            match free.iter().take(reachable).position(|f| *f) {
                Some(first_free) => {
                    prop_assert!(output.state.feasible);
                    prop_assert_eq!(tried, first_free + 1);
                }
                None => {
                    prop_assert!(!output.state.feasible);
                    prop_assert_eq!(
                        output.state.attempts as usize,
                        (max_attempts as usize).min(alternatives)
                    );
                    prop_assert_eq!(output.decision.final_decision, FinalDecision::Escalate);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_slow_checkpoint_times_out_into_degraded_mode() {
        struct SlowCheckpoint;

        #[async_trait::async_trait]
        impl CoordinationCheckpoint for SlowCheckpoint {
            async fn check(
                &self,
                _query: &ConflictQuery,
            ) -> Result<ConflictCheckResult, CoordinationError> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(ConflictCheckResult::clear())
            }
        }

        let uc = DecideUseCase::new(
            Arc::new(departments::builtin(Department::Water)),
            Arc::new(healthy_water_data()),
            Arc::new(MemoryStore::default()),
            PipelineParams::default().with_checkpoint_timeout(Duration::from_millis(20)),
        )
        .with_checkpoint(Arc::new(SlowCheckpoint));

        let output = uc.execute(water_request()).await.unwrap();
        assert!(output.state.coordination_degraded);
        assert_eq!(output.decision.final_decision, FinalDecision::Approve);
    }
}
