//! Coordination checkpoint port
//!
//! The department pipeline asks "may I act here?" before running tools.
//! The answer is advisory: nothing is reserved, so two departments checking
//! at the same moment can both be told the site is clear.

use async_trait::async_trait;
use civic_domain::{ConflictCheckResult, ConflictQuery};
use thiserror::Error;

use super::audit_store::StoreError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinationError {
    #[error("Coordination store error: {0}")]
    Store(#[from] StoreError),

    #[error("Coordination service unavailable: {0}")]
    Unavailable(String),

    #[error("Coordination check timed out")]
    Timeout,
}

/// Pre-action conflict check used by department pipelines.
///
/// Implemented in-process by
/// [`CheckPlanConflictsUseCase`](crate::use_cases::check_conflicts::CheckPlanConflictsUseCase).
/// Any error puts the calling pipeline into degraded mode.
#[async_trait]
pub trait CoordinationCheckpoint: Send + Sync {
    async fn check(&self, query: &ConflictQuery) -> Result<ConflictCheckResult, CoordinationError>;
}
