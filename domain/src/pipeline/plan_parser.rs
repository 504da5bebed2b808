//! Strict decoding of oracle-proposed plans.
//!
//! The planner asks the oracle for JSON of the form
//!
//! ```text
//! {"primary": {"name": ..., "steps": [{"tool": ..., "args": {...}}], ...},
//!  "alternatives": [ ... ]}
//! ```
//!
//! Anything that does not match (missing object, wrong types, empty step
//! lists, tools the department does not have) is a [`PlanParseError`], and
//! the caller falls back to the department's template plans.

use super::{Plan, PlanSet, PlanSource, PlanStep};
use crate::core::json::extract_first_object;
use crate::request::Request;
use serde::Deserialize;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanParseError {
    #[error("no JSON object found in oracle response")]
    NoJson,

    #[error("malformed plan JSON: {0}")]
    Malformed(String),

    #[error("plan '{0}' has no steps")]
    EmptyPlan(String),

    #[error("plan '{plan}' uses unknown tool '{tool}'")]
    UnknownTool { plan: String, tool: String },

    #[error("plan '{0}' has an invalid cost")]
    InvalidCost(String),
}

#[derive(Debug, Deserialize)]
struct PlanResponse {
    primary: PlanDraft,
    #[serde(default)]
    alternatives: Vec<PlanDraft>,
}

#[derive(Debug, Deserialize)]
struct PlanDraft {
    name: String,
    steps: Vec<PlanStep>,
    #[serde(default)]
    resources: Option<BTreeSet<String>>,
    #[serde(default)]
    estimated_cost: Option<f64>,
    #[serde(default)]
    exclusive_site: Option<bool>,
    #[serde(default)]
    rationale: Option<String>,
}

impl PlanDraft {
    fn into_plan(
        self,
        known_tools: &BTreeSet<String>,
        request: &Request,
    ) -> Result<Plan, PlanParseError> {
        if self.steps.is_empty() {
            return Err(PlanParseError::EmptyPlan(self.name));
        }
        if let Some(step) = self.steps.iter().find(|s| !known_tools.contains(&s.tool)) {
            return Err(PlanParseError::UnknownTool {
                plan: self.name.clone(),
                tool: step.tool.clone(),
            });
        }
        let cost = self.estimated_cost.unwrap_or(request.estimated_cost);
        if !cost.is_finite() || cost < 0.0 {
            return Err(PlanParseError::InvalidCost(self.name));
        }

        Ok(Plan {
            name: self.name,
            steps: self.steps,
            location: request.location.clone(),
            resources: self
                .resources
                .unwrap_or_else(|| request.resources_needed.clone()),
            estimated_cost: cost,
            exclusive_site: self.exclusive_site.unwrap_or(false),
            rationale: self.rationale.unwrap_or_default(),
            source: PlanSource::Oracle,
        })
    }
}

/// Decode an oracle planning response into a [`PlanSet`].
///
/// Location always comes from the request; resources and cost default to
/// the request's when the oracle omits them.
pub fn parse_plan_response(
    text: &str,
    known_tools: &BTreeSet<String>,
    request: &Request,
) -> Result<PlanSet, PlanParseError> {
    let json = extract_first_object(text).ok_or(PlanParseError::NoJson)?;
    let response: PlanResponse =
        serde_json::from_str(json).map_err(|e| PlanParseError::Malformed(e.to_string()))?;

    let mut plans = PlanSet::new(response.primary.into_plan(known_tools, request)?);
    for draft in response.alternatives {
        plans = plans.with_alternative(draft.into_plan(known_tools, request)?);
    }
    Ok(plans)
}
