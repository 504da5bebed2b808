//! Shared utilities for use cases.
//!
//! Contains cancellation checking and the bounded oracle call used by the
//! planner, the observer and the negotiation engine.

use crate::ports::reasoning_oracle::{OracleError, OracleRequest, ReasoningOracle};
use civic_domain::DomainError;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Check if cancellation has been requested.
///
/// Returns `Err(DomainError::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), DomainError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(DomainError::Cancelled);
    }
    Ok(())
}

/// Call the oracle under `request.timeout`.
///
/// Expiry is reported as [`OracleError::Timeout`] so callers can take the
/// same fallback path as for any other oracle failure.
pub(crate) async fn ask_oracle(
    oracle: &dyn ReasoningOracle,
    request: &OracleRequest,
) -> Result<String, OracleError> {
    debug!(oracle = oracle.name(), timeout = ?request.timeout, "Calling reasoning oracle");
    match tokio::time::timeout(request.timeout, oracle.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(OracleError::Timeout(request.timeout)),
    }
}
