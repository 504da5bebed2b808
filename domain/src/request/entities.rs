//! The [`Request`] entity.

use super::{Department, Priority};
use crate::core::error::ValidationError;
use crate::core::facts::{Facts, fact_flag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// An operational request addressed to one department.
///
/// Requests are immutable once they enter a pipeline; every derived value
/// lives in [`PipelineState`](crate::pipeline::PipelineState).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub requester_id: String,
    pub department: Department,
    pub kind: String,
    pub location: String,
    #[serde(default)]
    pub resources_needed: BTreeSet<String>,
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub payload: Facts,
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

impl Request {
    pub fn new(
        requester_id: impl Into<String>,
        department: Department,
        kind: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            requester_id: requester_id.into(),
            department,
            kind: kind.into(),
            location: location.into(),
            resources_needed: BTreeSet::new(),
            estimated_cost: 0.0,
            priority: Priority::default(),
            payload: Facts::new(),
            submitted_at: Utc::now(),
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resources_needed.insert(resource.into());
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

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }

    /// Whether a payload flag is set to a truthy value.
    pub fn payload_flag(&self, key: &str) -> bool {
        fact_flag(&self.payload, key).unwrap_or(false)
    }

    /// Reject malformed requests before they reach a pipeline.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.requester_id.trim().is_empty() {
            return Err(ValidationError::EmptyRequester);
        }
        if self.kind.trim().is_empty() {
            return Err(ValidationError::EmptyKind);
        }
        if self.location.trim().is_empty() {
            return Err(ValidationError::EmptyLocation);
        }
        if !self.estimated_cost.is_finite() || self.estimated_cost < 0.0 {
            return Err(ValidationError::InvalidCost(self.estimated_cost));
        }
        Ok(())
    }
}
