//! Pipeline configuration from TOML (`[pipeline]` section)

use super::ConfigValidationError;
use civic_application::PipelineParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw department pipeline configuration from TOML
///
/// # Example
///
/// ```toml
/// [pipeline]
/// max_attempts = 3
/// confidence_threshold = 0.7
/// auto_approval_cost_limit = 100000
/// coordination_checkpoint = true
/// checkpoint_timeout_seconds = 10
/// observer_summary = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    /// Plans tried per request, the primary included
    pub max_attempts: u32,
    /// Minimum confidence for an automatic approval
    pub confidence_threshold: f64,
    /// Spend above which a human must sign off
    pub auto_approval_cost_limit: f64,
    /// Consult the other departments before running tools
    pub coordination_checkpoint: bool,
    pub checkpoint_timeout_seconds: u64,
    /// Ask the oracle for a prose summary of observations
    pub observer_summary: bool,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        let params = PipelineParams::default();
        Self {
            max_attempts: params.max_attempts,
            confidence_threshold: params.confidence_threshold,
            auto_approval_cost_limit: params.auto_approval_cost_limit,
            coordination_checkpoint: params.coordination_checkpoint,
            checkpoint_timeout_seconds: params.checkpoint_timeout.as_secs(),
            observer_summary: params.observer_summary,
        }
    }
}

impl FilePipelineConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_attempts == 0 {
            return Err(ConfigValidationError::ZeroAttempts);
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigValidationError::ThresholdOutOfRange(
                self.confidence_threshold,
            ));
        }
        if self.auto_approval_cost_limit < 0.0 {
            return Err(ConfigValidationError::NegativeAmount(
                "pipeline.auto_approval_cost_limit",
            ));
        }
        if self.checkpoint_timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout(
                "pipeline.checkpoint_timeout_seconds",
            ));
        }
        Ok(())
    }

    /// Apply these settings on top of `base`, which carries the oracle and
    /// confidence settings.
    pub fn apply(&self, base: PipelineParams) -> PipelineParams {
        base.with_max_attempts(self.max_attempts)
            .with_confidence_threshold(self.confidence_threshold)
            .with_auto_approval_cost_limit(self.auto_approval_cost_limit)
            .with_coordination_checkpoint(self.coordination_checkpoint)
            .with_checkpoint_timeout(Duration::from_secs(self.checkpoint_timeout_seconds))
            .with_observer_summary(self.observer_summary)
    }
}
