//! Audit store port
//!
//! Append-only persistence for decisions, conflicts, resolutions,
//! escalations and coordination outcomes. The only read is the active
//! decision query the conflict detector runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use civic_domain::{
    Conflict, CoordinationRecord, Decision, DecisionStatus, Department, EscalationRecord,
    Resolution,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Store error: {0}")]
    Other(String),
}

/// Filter for [`AuditStore::query_active_decisions`].
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDecisionQuery {
    pub location: String,
    /// Only decisions created at or after this instant.
    pub since: DateTime<Utc>,
    pub statuses: Vec<DecisionStatus>,
    pub exclude_department: Option<Department>,
}

impl ActiveDecisionQuery {
    /// Approved or in-progress decisions at `location` since `since`.
    pub fn new(location: impl Into<String>, since: DateTime<Utc>) -> Self {
        Self {
            location: location.into(),
            since,
            statuses: DecisionStatus::ACTIVE.to_vec(),
            exclude_department: None,
        }
    }

    pub fn excluding(mut self, department: Department) -> Self {
        self.exclude_department = Some(department);
        self
    }

    pub fn matches(&self, decision: &Decision) -> bool {
        decision.location() == self.location
            && decision.created_at >= self.since
            && self.statuses.contains(&decision.status)
            && self.exclude_department != Some(decision.department)
    }
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert_decision(&self, decision: &Decision) -> Result<(), StoreError>;

    async fn insert_conflict(&self, conflict: &Conflict) -> Result<(), StoreError>;

    async fn insert_resolution(&self, resolution: &Resolution) -> Result<(), StoreError>;

    async fn insert_escalation(&self, escalation: &EscalationRecord) -> Result<(), StoreError>;

    async fn insert_coordination(&self, record: &CoordinationRecord) -> Result<(), StoreError>;

    async fn query_active_decisions(
        &self,
        query: &ActiveDecisionQuery,
    ) -> Result<Vec<Decision>, StoreError>;
}
