//! Conflict records and the result of a conflict check.

use crate::pipeline::{Plan, PipelineState};
use crate::request::{Department, Priority, Request};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Conflicts at or above this count always need a human.
pub const HUMAN_REVIEW_CONFLICT_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Resource,
    Location,
    Budget,
    Priority,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::Resource => "resource_conflict",
            ConflictType::Location => "location_conflict",
            ConflictType::Budget => "budget_conflict",
            ConflictType::Priority => "priority_conflict",
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

impl ConflictSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictSeverity::Low => "low",
            ConflictSeverity::Medium => "medium",
            ConflictSeverity::High => "high",
        }
    }
}

impl std::fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected collision between departments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub conflict_id: Uuid,
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub agents_involved: Vec<Department>,
    pub decisions_involved: Vec<Uuid>,
    pub location: String,
    pub description: String,
    pub detected_at: DateTime<Utc>,
}

impl Conflict {
    /// Build a conflict whose id is derived from what it is about, so the
    /// same collision detected twice gets the same id.
    pub fn new(
        conflict_type: ConflictType,
        severity: ConflictSeverity,
        location: impl Into<String>,
        agents: impl IntoIterator<Item = Department>,
        decisions: impl IntoIterator<Item = Uuid>,
        description: impl Into<String>,
        detected_at: DateTime<Utc>,
    ) -> Self {
        let location = location.into();
        let agents: BTreeSet<Department> = agents.into_iter().collect();
        let decisions: BTreeSet<Uuid> = decisions.into_iter().collect();

        let key = format!(
            "{}|{}|{}|{}",
            conflict_type,
            location,
            agents.iter().map(|a| a.as_str()).collect::<Vec<_>>().join(","),
            decisions
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );

        Self {
            conflict_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()),
            conflict_type,
            severity,
            agents_involved: agents.into_iter().collect(),
            decisions_involved: decisions.into_iter().collect(),
            location,
            description: description.into(),
            detected_at,
        }
    }

    /// Advice attached to a conflict check for this kind of conflict.
    pub fn recommendation(&self) -> String {
        let agents = self
            .agents_involved
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(" and ");
        match self.conflict_type {
            ConflictType::Resource => format!(
                "Stagger shared resources between {} at {} or source an alternative",
                agents, self.location
            ),
            ConflictType::Location => format!(
                "Sequence site work at {} between {}",
                self.location, agents
            ),
            ConflictType::Budget => format!(
                "Obtain finance approval: combined spend at {} exceeds the ceiling",
                self.location
            ),
            ConflictType::Priority => format!(
                "Confirm which emergency at {} takes precedence",
                self.location
            ),
        }
    }
}

/// What a department is about to commit to, as seen by the checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictQuery {
    pub agent: Department,
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
}

impl ConflictQuery {
    pub fn new(agent: Department, location: impl Into<String>) -> Self {
        Self {
            agent,
            kind: String::new(),
            location: location.into(),
            resources: BTreeSet::new(),
            estimated_cost: 0.0,
            priority: Priority::default(),
            exclusive_site: false,
        }
    }

    /// The query for carrying out `plan` on behalf of `request`.
    pub fn for_plan(request: &Request, plan: &Plan) -> Self {
        Self {
            agent: request.department,
            kind: request.kind.clone(),
            location: plan.location.clone(),
            resources: plan.resources.clone(),
            estimated_cost: plan.estimated_cost,
            priority: request.priority,
            exclusive_site: plan.exclusive_site,
        }
    }

    /// The query for the pipeline's current plan, if it has one.
    pub fn from_state(state: &PipelineState) -> Option<Self> {
        state
            .plan
            .as_ref()
            .map(|plan| Self::for_plan(&state.request, plan))
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resources.insert(resource.into());
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.estimated_cost = cost;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_exclusive_site(mut self, exclusive: bool) -> Self {
        self.exclusive_site = exclusive;
        self
    }
}

/// Outcome of a conflict check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictCheckResult {
    pub has_conflicts: bool,
    pub conflicts: Vec<Conflict>,
    pub conflict_types: Vec<ConflictType>,
    pub recommendations: Vec<String>,
    pub should_proceed: bool,
    pub requires_human: bool,
}

impl ConflictCheckResult {
    pub fn clear() -> Self {
        Self::from_conflicts(Vec::new())
    }

    /// Derive the flags: proceed only without high-severity conflicts; a
    /// human is needed for any high-severity conflict or for
    /// [`HUMAN_REVIEW_CONFLICT_COUNT`] conflicts or more.
    pub fn from_conflicts(conflicts: Vec<Conflict>) -> Self {
        let any_high = conflicts
            .iter()
            .any(|c| c.severity == ConflictSeverity::High);
        let conflict_types: BTreeSet<ConflictType> =
            conflicts.iter().map(|c| c.conflict_type).collect();

        let mut recommendations: Vec<String> = Vec::new();
        for conflict in &conflicts {
            let rec = conflict.recommendation();
            if !recommendations.contains(&rec) {
                recommendations.push(rec);
            }
        }

        Self {
            has_conflicts: !conflicts.is_empty(),
            should_proceed: !any_high,
            requires_human: any_high || conflicts.len() >= HUMAN_REVIEW_CONFLICT_COUNT,
            conflict_types: conflict_types.into_iter().collect(),
            recommendations,
            conflicts,
        }
    }

    /// One-line summary for reasoning text.
    pub fn summary(&self) -> String {
        if !self.has_conflicts {
            return "no conflicts".to_string();
        }
        self.conflicts
            .iter()
            .map(|c| format!("{} ({})", c.conflict_type, c.severity))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
