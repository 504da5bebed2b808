//! Coordination parameters.

use super::OracleParams;
use civic_domain::MonsoonPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters for conflict checks and the coordination pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationParams {
    /// How far back a decision still counts as active.
    pub conflict_lookback_hours: i64,
    /// Combined spend at one location above this is a budget conflict.
    pub budget_ceiling: f64,
    /// Total cost above this sends a coordination run to a human.
    pub auto_approval_cost_limit: f64,
    /// How long to wait for a human before leaving the escalation unresolved.
    pub human_response_timeout: Duration,
    pub oracle: OracleParams,
    pub monsoon: MonsoonPolicy,
}

impl Default for CoordinationParams {
    fn default() -> Self {
        Self {
            conflict_lookback_hours: 24,
            budget_ceiling: 1_000_000.0,
            auto_approval_cost_limit: 100_000.0,
            human_response_timeout: Duration::from_secs(86_400),
            oracle: OracleParams::default(),
            monsoon: MonsoonPolicy::default(),
        }
    }
}

impl CoordinationParams {
    // ==================== Builder Methods ====================

    pub fn with_conflict_lookback_hours(mut self, hours: i64) -> Self {
        self.conflict_lookback_hours = hours;
        self
    }

    pub fn with_budget_ceiling(mut self, ceiling: f64) -> Self {
        self.budget_ceiling = ceiling;
        self
    }

    pub fn with_auto_approval_cost_limit(mut self, limit: f64) -> Self {
        self.auto_approval_cost_limit = limit;
        self
    }

    pub fn with_human_response_timeout(mut self, timeout: Duration) -> Self {
        self.human_response_timeout = timeout;
        self
    }

    pub fn with_oracle(mut self, oracle: OracleParams) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_monsoon(mut self, monsoon: MonsoonPolicy) -> Self {
        self.monsoon = monsoon;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = CoordinationParams::default();
        assert_eq!(params.conflict_lookback_hours, 24);
        assert_eq!(params.human_response_timeout, Duration::from_secs(86_400));
        assert_eq!(params.monsoon.months, vec![6, 7, 8, 9]);
    }

    #[test]
    fn test_builder() {
        let params = CoordinationParams::default()
            .with_budget_ceiling(250_000.0)
            .with_human_response_timeout(Duration::from_millis(50));
        assert_eq!(params.budget_ceiling, 250_000.0);
        assert_eq!(params.human_response_timeout, Duration::from_millis(50));
    }
}
