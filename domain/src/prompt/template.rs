//! Prompt templates for oracle calls

use crate::coordination::{AgentDecision, Conflict, ResolutionDecision};
use crate::core::facts::Facts;
use crate::core::string::truncate;
use crate::pipeline::PipelineState;
use std::collections::BTreeSet;

/// Observation values longer than this are cut in prompts.
const MAX_FACT_LEN: usize = 200;

/// Templates for generating prompts at each oracle call site
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for the planner
    pub fn planner_system() -> &'static str {
        r#"You are an operations planner for a municipal department.
Propose a primary plan and up to two alternatives for the request you are given.
Use only the tools listed. Respond with a single JSON object and nothing else:
{"primary": {"name": "...", "steps": [{"tool": "...", "args": {}}], "resources": ["..."], "estimated_cost": 0, "exclusive_site": false, "rationale": "..."},
 "alternatives": [ ...same shape... ]}"#
    }

    /// User prompt for the planner
    pub fn planner_prompt(state: &PipelineState, tools: &BTreeSet<String>) -> String {
        let request = &state.request;
        let resources = request
            .resources_needed
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"Department: {}
Request kind: {}
Location: {}
Priority: {}
Estimated cost: {:.2}
Resources requested: {}
Intent: {}
Risk level: {}
Goal: {}

Known context:
{}

Available tools: {}"#,
            request.department.display_name(),
            request.kind,
            request.location,
            request.priority,
            request.estimated_cost,
            if resources.is_empty() { "none" } else { resources.as_str() },
            state.intent.as_deref().unwrap_or("unknown"),
            state
                .risk_level
                .map(|r| r.as_str())
                .unwrap_or("unknown"),
            state.goal.as_deref().unwrap_or("unspecified"),
            Self::format_facts(&state.context),
            tools.iter().cloned().collect::<Vec<_>>().join(", "),
        )
    }

    /// System prompt for observation summaries
    pub fn observer_system() -> &'static str {
        r#"You summarize operational readings for a municipal decision log.
Write two or three plain sentences. Mention shortfalls first. Do not recommend actions."#
    }

    /// User prompt for observation summaries
    pub fn observer_prompt(goal: &str, observations: &Facts) -> String {
        format!(
            "Goal: {}\n\nReadings:\n{}",
            goal,
            Self::format_facts(observations)
        )
    }

    /// System prompt for conflict negotiation
    pub fn negotiation_system() -> &'static str {
        r#"You mediate between municipal departments whose plans collide.
Weigh public safety first, then service continuity, then cost.
Respond with a single JSON object:
{"decision": "<outcome>", "rationale": "...", "confidence": 0.0-1.0, "requires_human": true|false,
 "execution_plan": {"approved": ["<department>"], "deferred": ["<department>"]}}"#
    }

    /// User prompt for conflict negotiation
    pub fn negotiation_prompt(
        conflict: &Conflict,
        decisions: &[AgentDecision],
        constraints: &[String],
    ) -> String {
        let mut prompt = format!(
            "Conflict: {} (severity {}) at {}\n{}\n\nPositions:\n",
            conflict.conflict_type, conflict.severity, conflict.location, conflict.description
        );

        for d in decisions
            .iter()
            .filter(|d| conflict.decisions_involved.contains(&d.decision_id))
        {
            prompt.push_str(&format!(
                "- {}: {} at {}, priority {}, cost {:.2}, resources [{}], decided {}\n",
                d.department,
                d.kind,
                d.location,
                d.priority,
                d.estimated_cost,
                d.resources.iter().cloned().collect::<Vec<_>>().join(", "),
                d.created_at.to_rfc3339()
            ));
        }

        if !constraints.is_empty() {
            prompt.push_str("\nConstraints:\n");
            for c in constraints {
                prompt.push_str(&format!("- {}\n", c));
            }
        }

        prompt.push_str(&format!(
            "\nAllowed outcomes: {}",
            ResolutionDecision::ALL
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        prompt
    }

    fn format_facts(facts: &Facts) -> String {
        if facts.is_empty() {
            return "(none)".to_string();
        }
        facts
            .iter()
            .map(|(k, v)| format!("- {}: {}", k, truncate(&v.to_string(), MAX_FACT_LEN)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::{ConflictSeverity, ConflictType};
    use crate::pipeline::DecisionStatus;
    use crate::request::{Department, Priority, Request};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_planner_prompt_lists_tools_and_goal() {
        let mut state = PipelineState::new(
            Request::new("r", Department::Water, "pipe_burst", "ward-3").with_resource("repair_crew"),
            3,
        );
        state.goal = Some("Restore supply".to_string());
        let tools: BTreeSet<String> = ["check_budget".to_string()].into_iter().collect();

        let prompt = PromptTemplate::planner_prompt(&state, &tools);
        assert!(prompt.contains("Location: ward-3"));
        assert!(prompt.contains("Goal: Restore supply"));
        assert!(prompt.contains("Available tools: check_budget"));
        assert!(prompt.contains("Resources requested: repair_crew"));
        assert!(prompt.contains("(none)"));
    }

    #[test]
    fn test_negotiation_prompt_includes_positions_and_outcomes() {
        let decision = AgentDecision {
            decision_id: Uuid::new_v4(),
            department: Department::Engineering,
            kind: "road_repair".to_string(),
            location: "ward-3".to_string(),
            resources: ["excavator".to_string()].into_iter().collect(),
            estimated_cost: 40_000.0,
            priority: Priority::High,
            exclusive_site: true,
            status: DecisionStatus::Approved,
            created_at: Utc::now(),
        };
        let conflict = Conflict::new(
            ConflictType::Budget,
            ConflictSeverity::High,
            "ward-3",
            [Department::Engineering, Department::Water],
            [decision.decision_id],
            "over budget",
            Utc::now(),
        );

        let prompt = PromptTemplate::negotiation_prompt(
            &conflict,
            &[decision],
            &["monsoon restrictions apply".to_string()],
        );
        assert!(prompt.contains("budget_conflict"));
        assert!(prompt.contains("- engineering: road_repair at ward-3"));
        assert!(prompt.contains("monsoon restrictions apply"));
        assert!(prompt.contains("approve_partial"));
    }
}
