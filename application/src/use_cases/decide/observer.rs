//! Observation of tool output.
//!
//! Normalization is deterministic. The optional oracle summary is prose for
//! humans only; no check ever reads it.

use crate::config::OracleParams;
use crate::ports::reasoning_oracle::{OracleRequest, ReasoningOracle};
use crate::use_cases::shared::ask_oracle;
use civic_domain::{Facts, PipelineState, PromptTemplate, normalize_observations, truncate};
use tracing::warn;

const MAX_SUMMARY_LEN: usize = 600;

pub(super) fn observe(state: &PipelineState) -> Facts {
    normalize_observations(&state.context, state.tool_results.values())
}

pub(super) async fn summarize(
    oracle: &dyn ReasoningOracle,
    params: &OracleParams,
    state: &PipelineState,
) -> Option<String> {
    let goal = state.goal.as_deref().unwrap_or_default();
    let request = OracleRequest::new(
        PromptTemplate::observer_system(),
        PromptTemplate::observer_prompt(goal, &state.observations),
        params,
    );
    match ask_oracle(oracle, &request).await {
        Ok(text) if !text.trim().is_empty() => Some(truncate(text.trim(), MAX_SUMMARY_LEN)),
        Ok(_) => None,
        Err(e) => {
            warn!("Observation summary unavailable: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::ScriptedOracle;
    use civic_domain::{Department, Request, ToolResult, ToolStatus};
    use serde_json::json;

    fn state() -> PipelineState {
        let mut state =
            PipelineState::new(Request::new("r", Department::Water, "pipe_burst", "ward-1"), 3);
        state.context.insert("budget_available".to_string(), json!(10_000));
        state.tool_results.insert(
            "check_crew_availability".to_string(),
            ToolResult::new("check_crew_availability", ToolStatus::Available)
                .with_field("crews_available", 2)
                .with_field("budget_available", 25_000),
        );
        state
    }

    #[test]
    fn test_tool_output_overrides_context() {
        let facts = observe(&state());
        assert_eq!(facts["crews_available"], json!(2));
        assert_eq!(facts["budget_available"], json!(25_000));
    }

    #[tokio::test]
    async fn test_summary_failure_is_none() {
        let oracle = ScriptedOracle::failing();
        assert!(summarize(&oracle, &OracleParams::default(), &state()).await.is_none());
    }

    #[tokio::test]
    async fn test_summary_trimmed() {
        let oracle = ScriptedOracle::replying(&["  Two crews ready.  "]);
        let summary = summarize(&oracle, &OracleParams::default(), &state()).await;
        assert_eq!(summary.as_deref(), Some("Two crews ready."));
    }
}
