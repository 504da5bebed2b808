//! The coordination view of a department decision.

use crate::pipeline::{Decision, DecisionStatus};
use crate::request::{Department, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// What a department has committed to at a location.
///
/// Built from a [`Decision`], preferring the plan's location, resources and
/// cost over the original request's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDecision {
    pub decision_id: Uuid,
    pub department: Department,
    pub kind: String,
    pub location: String,
    #[serde(default)]
    pub resources: BTreeSet<String>,
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub exclusive_site: bool,
    pub status: DecisionStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Decision> for AgentDecision {
    fn from(decision: &Decision) -> Self {
        let request = &decision.request_snapshot;
        let (location, resources, estimated_cost, exclusive_site) = match &decision.plan_snapshot {
            Some(plan) => (
                plan.location.clone(),
                plan.resources.clone(),
                plan.estimated_cost,
                plan.exclusive_site,
            ),
            None => (
                request.location.clone(),
                request.resources_needed.clone(),
                request.estimated_cost,
                request.payload_flag("exclusive_site"),
            ),
        };

        Self {
            decision_id: decision.decision_id,
            department: decision.department,
            kind: request.kind.clone(),
            location,
            resources,
            estimated_cost,
            priority: request.priority,
            exclusive_site,
            status: decision.status,
            created_at: decision.created_at,
        }
    }
}
