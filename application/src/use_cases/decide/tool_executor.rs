//! Plan step dispatch.
//!
//! Runs every step of the current plan against the department's data port.
//! A failing data fetch becomes an `error` tool result rather than an
//! error, so the observer and the feasibility checks see exactly what was
//! and was not learned.

use crate::ports::department_data::DepartmentDataPort;
use crate::ports::progress::PipelineProgressNotifier;
use civic_domain::{Plan, ToolResult};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub(super) async fn execute_plan(
    data: &dyn DepartmentDataPort,
    plan: &Plan,
    progress: &dyn PipelineProgressNotifier,
) -> BTreeMap<String, ToolResult> {
    let mut results = BTreeMap::new();

    for step in &plan.steps {
        let result = match data.execute_tool(&step.tool, &step.args).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %step.tool, "Tool failed: {}", e);
                ToolResult::error(&step.tool, e.to_string())
            }
        };
        debug!(tool = %step.tool, status = %result.status, "Tool finished");
        progress.on_tool_result(data.department(), &result);
        results.insert(step.tool.clone(), result);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::NoProgress;
    use crate::use_cases::test_support::MockDataPort;
    use civic_domain::{Department, PlanStep, ToolStatus};

    #[tokio::test]
    async fn test_failed_fetch_becomes_error_result() {
        let data = MockDataPort::new(Department::Water).with_tool(
            ToolResult::new("check_budget", ToolStatus::WithinLimits)
                .with_field("budget_available", 50_000.0),
        );
        let plan = Plan::new("p", "ward-1")
            .with_step(PlanStep::new("check_budget"))
            .with_step(PlanStep::new("check_crew_availability"));

        let results = execute_plan(&data, &plan, &NoProgress).await;

        assert_eq!(results.len(), 2);
        assert!(results["check_budget"].is_success());
        let failed = &results["check_crew_availability"];
        assert_eq!(failed.status, ToolStatus::Error);
        assert!(failed.error.as_deref().unwrap_or_default().contains("Unknown tool"));
        assert_eq!(data.calls(), vec!["check_budget", "check_crew_availability"]);
    }
}
