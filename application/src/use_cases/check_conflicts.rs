//! Check Plan Conflicts use case
//!
//! The synchronous "check before you act" query. Reads the decisions other
//! departments currently have in force at the location and reports every
//! collision with the intended action. Nothing is written, so the same
//! query against an unchanged store always returns the same conflicts (ids
//! included).

use crate::config::CoordinationParams;
use crate::ports::audit_store::{ActiveDecisionQuery, AuditStore};
use crate::ports::coordination_checkpoint::{CoordinationCheckpoint, CoordinationError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use civic_domain::{AgentDecision, ConflictCheckResult, ConflictDetector, ConflictQuery};
use std::sync::Arc;
use tracing::{debug, info};

pub struct CheckPlanConflictsUseCase {
    store: Arc<dyn AuditStore>,
    detector: ConflictDetector,
    lookback: Duration,
}

impl CheckPlanConflictsUseCase {
    pub fn new(store: Arc<dyn AuditStore>, params: &CoordinationParams) -> Self {
        Self {
            store,
            detector: ConflictDetector::new(params.budget_ceiling),
            lookback: Duration::hours(params.conflict_lookback_hours),
        }
    }

    pub async fn execute(&self, query: &ConflictQuery) -> Result<ConflictCheckResult, CoordinationError> {
        let now = Utc::now();
        let active = ActiveDecisionQuery::new(&query.location, now - self.lookback).excluding(query.agent);
        let decisions = self.store.query_active_decisions(&active).await?;
        let candidates: Vec<AgentDecision> = decisions.iter().map(AgentDecision::from).collect();

        debug!(
            agent = %query.agent,
            location = %query.location,
            active = candidates.len(),
            "Checking plan conflicts"
        );

        let result = self.detector.check(query, &candidates, now);
        if result.has_conflicts {
            info!(
                agent = %query.agent,
                location = %query.location,
                requires_human = result.requires_human,
                "Conflicts found: {}",
                result.summary()
            );
        }
        Ok(result)
    }
}

#[async_trait]
impl CoordinationCheckpoint for CheckPlanConflictsUseCase {
    async fn check(&self, query: &ConflictQuery) -> Result<ConflictCheckResult, CoordinationError> {
        self.execute(query).await
    }
}
