//! In-process audit store.

use async_trait::async_trait;
use civic_application::{ActiveDecisionQuery, AuditStore, StoreError};
use civic_domain::{Conflict, CoordinationRecord, Decision, EscalationRecord, Resolution};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

/// Everything written to an [`InMemoryAuditStore`], in insertion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditSnapshot {
    pub decisions: Vec<Decision>,
    pub conflicts: Vec<Conflict>,
    pub resolutions: Vec<Resolution>,
    pub escalations: Vec<EscalationRecord>,
    pub coordinations: Vec<CoordinationRecord>,
}

/// Append-only audit store guarded by a tokio `RwLock`.
///
/// Decision ids must be unique. Conflict ids are derived from their content,
/// so re-inserting a conflict that is already stored is a no-op.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    log: RwLock<AuditSnapshot>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-existing decisions, skipping duplicate ids.
    pub async fn seed(&self, decisions: impl IntoIterator<Item = Decision>) {
        let mut log = self.log.write().await;
        for decision in decisions {
            if !log.decisions.iter().any(|d| d.decision_id == decision.decision_id) {
                log.decisions.push(decision);
            }
        }
    }

    pub async fn snapshot(&self) -> AuditSnapshot {
        self.log.read().await.clone()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn insert_decision(&self, decision: &Decision) -> Result<(), StoreError> {
        let mut log = self.log.write().await;
        if log.decisions.iter().any(|d| d.decision_id == decision.decision_id) {
            return Err(StoreError::Duplicate(format!(
                "decision {}",
                decision.decision_id
            )));
        }
        debug!(
            decision_id = %decision.decision_id,
            department = %decision.department,
            status = decision.status.as_str(),
            "Decision stored"
        );
        log.decisions.push(decision.clone());
        Ok(())
    }

    async fn insert_conflict(&self, conflict: &Conflict) -> Result<(), StoreError> {
        let mut log = self.log.write().await;
        if !log.conflicts.iter().any(|c| c.conflict_id == conflict.conflict_id) {
            log.conflicts.push(conflict.clone());
        }
        Ok(())
    }

    async fn insert_resolution(&self, resolution: &Resolution) -> Result<(), StoreError> {
        self.log.write().await.resolutions.push(resolution.clone());
        Ok(())
    }

    async fn insert_escalation(&self, escalation: &EscalationRecord) -> Result<(), StoreError> {
        self.log.write().await.escalations.push(escalation.clone());
        Ok(())
    }

    async fn insert_coordination(&self, record: &CoordinationRecord) -> Result<(), StoreError> {
        self.log.write().await.coordinations.push(record.clone());
        Ok(())
    }

    async fn query_active_decisions(
        &self,
        query: &ActiveDecisionQuery,
    ) -> Result<Vec<Decision>, StoreError> {
        let log = self.log.read().await;
        Ok(log
            .decisions
            .iter()
            .filter(|d| query.matches(d))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use civic_domain::{
        ConflictSeverity, ConflictType, DecisionStatus, Department, PipelineState, Request,
    };

    fn decision(department: Department, location: &str) -> Decision {
        let state = PipelineState::new(Request::new("r", department, "road_repair", location), 3);
        Decision::from_state(&state, 5).with_status(DecisionStatus::Approved)
    }

    #[tokio::test]
    async fn test_query_filters_location_department_and_age() {
        let store = InMemoryAuditStore::new();
        store.insert_decision(&decision(Department::Engineering, "ward-3")).await.unwrap();
        store.insert_decision(&decision(Department::Water, "ward-3")).await.unwrap();
        store.insert_decision(&decision(Department::Fire, "ward-4")).await.unwrap();
        store
            .insert_decision(
                &decision(Department::Health, "ward-3")
                    .with_created_at(Utc::now() - Duration::hours(48)),
            )
            .await
            .unwrap();
        store
            .insert_decision(
                &decision(Department::Finance, "ward-3").with_status(DecisionStatus::Rejected),
            )
            .await
            .unwrap();

        let query = ActiveDecisionQuery::new("ward-3", Utc::now() - Duration::hours(24))
            .excluding(Department::Water);
        let found = store.query_active_decisions(&query).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].department, Department::Engineering);
    }

    #[tokio::test]
    async fn test_duplicate_decision_rejected() {
        let store = InMemoryAuditStore::new();
        let d = decision(Department::Water, "ward-1");
        store.insert_decision(&d).await.unwrap();
        assert!(matches!(
            store.insert_decision(&d).await,
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(store.snapshot().await.decisions.len(), 1);
    }

    #[tokio::test]
    async fn test_conflict_reinsert_is_noop() {
        let store = InMemoryAuditStore::new();
        let at = Utc::now();
        let conflict = Conflict::new(
            ConflictType::Location,
            ConflictSeverity::Medium,
            "ward-2",
            [Department::Water, Department::Engineering],
            Vec::<uuid::Uuid>::new(),
            "both on site",
            at,
        );
        store.insert_conflict(&conflict).await.unwrap();
        store.insert_conflict(&conflict.clone()).await.unwrap();
        assert_eq!(store.snapshot().await.conflicts.len(), 1);
    }

    #[tokio::test]
    async fn test_seed_skips_duplicates() {
        let store = InMemoryAuditStore::new();
        let d = decision(Department::Water, "ward-1");
        store.seed([d.clone(), d]).await;
        assert_eq!(store.snapshot().await.decisions.len(), 1);
    }
}
