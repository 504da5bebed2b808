//! Plan generation for the department pipeline.
//!
//! The oracle is asked for a primary plan plus alternatives. Anything it
//! returns that does not decode cleanly, or names a tool the department does
//! not have, is discarded in favour of the rule table's templates.

use crate::config::OracleParams;
use crate::ports::reasoning_oracle::{OracleRequest, ReasoningOracle};
use crate::use_cases::shared::ask_oracle;
use civic_domain::{
    Plan, PlanSet, PipelineState, PromptTemplate, RuleTable, parse_plan_response,
};
use tracing::{debug, warn};

/// Where the chosen plans came from, with a note for the reasoning trail.
pub(super) struct PlanningOutcome {
    pub plans: PlanSet,
    pub note: String,
}

pub(super) async fn plan(
    table: &RuleTable,
    oracle: Option<&dyn ReasoningOracle>,
    params: &OracleParams,
    state: &PipelineState,
) -> PlanningOutcome {
    let intent = state.intent.as_deref().unwrap_or_default();

    if let Some(oracle) = oracle {
        let tools = table.known_tools();
        let request = OracleRequest::new(
            PromptTemplate::planner_system(),
            PromptTemplate::planner_prompt(state, &tools),
            params,
        );
        match ask_oracle(oracle, &request).await {
            Ok(text) => match parse_plan_response(&text, &tools, &state.request) {
                Ok(plans) => {
                    debug!(
                        primary = %plans.primary.name,
                        alternatives = plans.alternatives.len(),
                        "Using oracle plan"
                    );
                    return PlanningOutcome {
                        note: format!("planned by {}", oracle.name()),
                        plans,
                    };
                }
                Err(e) => warn!("Oracle plan rejected, using templates: {}", e),
            },
            Err(e) => warn!("Oracle planning failed, using templates: {}", e),
        }
    }

    match table.template_plans(intent, &state.request) {
        Some(plans) => PlanningOutcome {
            note: format!("planned from '{}' templates", intent),
            plans,
        },
        None => PlanningOutcome {
            note: "no plan template available".to_string(),
            plans: PlanSet::new(
                Plan::new("no_action", &state.request.location)
                    .with_resources(state.request.resources_needed.iter().cloned())
                    .with_cost(state.request.estimated_cost)
                    .with_rationale("no template defined for this intent"),
            ),
        },
    }
}
