//! Department pipeline parameters.
//!
//! [`PipelineParams`] groups the static parameters that control the
//! department decision pipeline in
//! [`DecideUseCase`](crate::use_cases::decide::DecideUseCase).

use super::OracleParams;
use civic_domain::ConfidenceWeights;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Department pipeline control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Maximum number of retries with alternative plans.
    pub max_attempts: u32,
    /// Confidence below this routes to escalation.
    pub confidence_threshold: f64,
    /// Costs above this raise the risk level one step.
    pub auto_approval_cost_limit: f64,
    /// Whether to consult the coordination checkpoint before running tools.
    pub coordination_checkpoint: bool,
    /// Upper bound on one checkpoint call. Expiry means degraded mode.
    pub checkpoint_timeout: Duration,
    /// Ask the oracle for a prose summary of observations.
    pub observer_summary: bool,
    pub oracle: OracleParams,
    pub confidence_weights: ConfidenceWeights,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            confidence_threshold: 0.7,
            auto_approval_cost_limit: 100_000.0,
            coordination_checkpoint: true,
            checkpoint_timeout: Duration::from_secs(10),
            observer_summary: false,
            oracle: OracleParams::default(),
            confidence_weights: ConfidenceWeights::default(),
        }
    }
}

impl PipelineParams {
    // ==================== Builder Methods ====================

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_auto_approval_cost_limit(mut self, limit: f64) -> Self {
        self.auto_approval_cost_limit = limit;
        self
    }

    pub fn with_coordination_checkpoint(mut self, enabled: bool) -> Self {
        self.coordination_checkpoint = enabled;
        self
    }

    pub fn with_checkpoint_timeout(mut self, timeout: Duration) -> Self {
        self.checkpoint_timeout = timeout;
        self
    }

    pub fn with_observer_summary(mut self, enabled: bool) -> Self {
        self.observer_summary = enabled;
        self
    }

    pub fn with_oracle(mut self, oracle: OracleParams) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_confidence_weights(mut self, weights: ConfidenceWeights) -> Self {
        self.confidence_weights = weights;
        self
    }
}
