//! End-to-end flows across the department pipelines and the conflict check.

use crate::config::{CoordinationParams, OracleParams, PipelineParams};
use crate::use_cases::check_conflicts::CheckPlanConflictsUseCase;
use crate::use_cases::decide::DecideUseCase;
use crate::use_cases::test_support::{MemoryStore, MockDataPort, ScriptedOracle};
use civic_domain::{
    ConflictQuery, ConflictSeverity, ConflictType, Department, FinalDecision, PlanSource,
    Request, ToolResult, ToolStatus, departments,
};
use std::sync::Arc;
use std::time::Duration;

/// Sanitation data with a one-truck reserve fleet. Requests ask for two.
fn sanitation_data(route_trucks: u32, contractor_trucks: u32) -> MockDataPort {
    MockDataPort::new(Department::Sanitation)
        .with_tool(
            ToolResult::new("check_truck_availability", ToolStatus::Available)
                .with_field("trucks_available", route_trucks),
        )
        .with_tool(
            ToolResult::new("check_reserve_truck_availability", ToolStatus::Available)
                .with_field("trucks_available", 1),
        )
        .with_tool(
            ToolResult::new("check_contractor_trucks", ToolStatus::Available)
                .with_field("trucks_available", contractor_trucks),
        )
        .with_tool(
            ToolResult::new("check_landfill_capacity", ToolStatus::WithinLimits)
                .with_field("landfill_capacity_pct", 70)
                .with_field("estimated_delay_days", 1),
        )
}

fn garbage_request(location: &str, resource: &str) -> Request {
    Request::new("ward-office", Department::Sanitation, "garbage_collection", location)
        .with_resource(resource)
        .with_cost(4_000.0)
        .with_payload("trucks_required", 2)
        .with_payload("policy_max_delay", 2)
}

fn sanitation(store: Arc<MemoryStore>, data: MockDataPort) -> DecideUseCase {
    DecideUseCase::new(
        Arc::new(departments::builtin(Department::Sanitation)),
        Arc::new(data),
        store,
        PipelineParams::default(),
    )
}

async fn approve_first_request(store: &Arc<MemoryStore>, resource: &str) {
    let uc = sanitation(store.clone(), sanitation_data(3, 0));
    let output = uc.execute(garbage_request("ward-5", resource)).await.unwrap();
    assert_eq!(output.decision.final_decision, FinalDecision::Approve);
    assert_eq!(store.decision_count(), 1);
}

#[tokio::test]
async fn scenario_a_disjoint_resources_proceed() {
    let store = Arc::new(MemoryStore::default());
    approve_first_request(&store, "contract_truck").await;

    let checker = CheckPlanConflictsUseCase::new(store.clone(), &CoordinationParams::default());
    let query = ConflictQuery::new(Department::Water, "ward-5")
        .with_resource("water_tanker")
        .with_cost(6_000.0);
    let result = checker.execute(&query).await.unwrap();

    assert!(!result.has_conflicts);
    assert!(result.should_proceed);
}

#[tokio::test]
async fn scenario_b_shared_capital_budget_needs_human() {
    let store = Arc::new(MemoryStore::default());
    approve_first_request(&store, "budget_capital").await;

    let checker = CheckPlanConflictsUseCase::new(store.clone(), &CoordinationParams::default());
    let query = ConflictQuery::new(Department::Water, "ward-5")
        .with_resource("budget_capital")
        .with_cost(6_000.0);
    let result = checker.execute(&query).await.unwrap();

    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].conflict_type, ConflictType::Resource);
    assert_eq!(result.conflicts[0].severity, ConflictSeverity::High);
    assert!(!result.should_proceed);
    assert!(result.requires_human);
}

#[tokio::test]
async fn scenario_c_retries_twice_then_succeeds_on_second_alternative() {
    let uc = sanitation(Arc::new(MemoryStore::default()), sanitation_data(0, 3));

    let output = uc.execute(garbage_request("ward-5", "truck")).await.unwrap();

    assert_eq!(output.state.attempts, 2);
    assert!(output.state.feasible);
    assert_eq!(
        output.state.plan.as_ref().map(|p| p.name.as_str()),
        Some("contractor_pickup")
    );
}

#[tokio::test]
async fn scenario_c_retries_twice_then_escalates() {
    let uc = sanitation(Arc::new(MemoryStore::default()), sanitation_data(0, 0));

    let output = uc.execute(garbage_request("ward-5", "truck")).await.unwrap();

    assert_eq!(output.state.attempts, 2);
    assert_eq!(output.decision.final_decision, FinalDecision::Escalate);
    assert!(
        output
            .decision
            .escalation_reason
            .as_deref()
            .unwrap_or_default()
            .starts_with("No feasible plan found after 3 attempts")
    );
}

#[tokio::test]
async fn scenario_d_slow_oracle_uses_template_plan() {
    let oracle = Arc::new(
        ScriptedOracle::replying(&[r#"{"primary": {"name": "late", "steps": []}}"#])
            .with_delay(Duration::from_secs(5)),
    );
    let params = PipelineParams::default()
        .with_oracle(OracleParams::default().with_timeout(Duration::from_millis(20)));
    let uc = DecideUseCase::new(
        Arc::new(departments::builtin(Department::Sanitation)),
        Arc::new(sanitation_data(3, 0)),
        Arc::new(MemoryStore::default()),
        params,
    )
    .with_oracle(oracle.clone());

    let output = uc.execute(garbage_request("ward-5", "truck")).await.unwrap();

    assert_eq!(oracle.call_count(), 1);
    let plan = output.state.plan.as_ref().unwrap();
    assert_eq!(plan.source, PlanSource::Template);
    assert_eq!(output.state.stage, civic_domain::PipelineStage::Output);
}
