//! Coordination configuration from TOML (`[coordination]` section)

use super::ConfigValidationError;
use civic_application::CoordinationParams;
use civic_domain::MonsoonPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw coordination configuration from TOML
///
/// # Example
///
/// ```toml
/// [coordination]
/// conflict_lookback_hours = 24
/// budget_ceiling = 1000000
/// human_response_timeout_seconds = 86400
///
/// [coordination.monsoon]
/// months = [6, 7, 8, 9]
/// restricted_kinds = ["road_excavation", "trenching"]
/// ```
///
/// The auto-approval limit is shared with `[pipeline]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCoordinationConfig {
    /// How far back active decisions count toward conflicts
    pub conflict_lookback_hours: i64,
    /// Combined spend per location before a budget conflict is raised
    pub budget_ceiling: f64,
    /// How long an escalation waits for a human
    pub human_response_timeout_seconds: u64,
    pub monsoon: MonsoonPolicy,
}

impl Default for FileCoordinationConfig {
    fn default() -> Self {
        let params = CoordinationParams::default();
        Self {
            conflict_lookback_hours: params.conflict_lookback_hours,
            budget_ceiling: params.budget_ceiling,
            human_response_timeout_seconds: params.human_response_timeout.as_secs(),
            monsoon: params.monsoon,
        }
    }
}

impl FileCoordinationConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.conflict_lookback_hours <= 0 {
            return Err(ConfigValidationError::InvalidLookback(
                self.conflict_lookback_hours,
            ));
        }
        if self.budget_ceiling < 0.0 {
            return Err(ConfigValidationError::NegativeAmount(
                "coordination.budget_ceiling",
            ));
        }
        if self.human_response_timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout(
                "coordination.human_response_timeout_seconds",
            ));
        }
        if let Some(month) = self.monsoon.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(ConfigValidationError::InvalidMonth(*month));
        }
        Ok(())
    }

    pub fn apply(&self, base: CoordinationParams) -> CoordinationParams {
        base.with_conflict_lookback_hours(self.conflict_lookback_hours)
            .with_budget_ceiling(self.budget_ceiling)
            .with_human_response_timeout(Duration::from_secs(
                self.human_response_timeout_seconds,
            ))
            .with_monsoon(self.monsoon.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monsoon_section_deserialize() {
        let toml_str = r#"
[coordination]
budget_ceiling = 250000

[coordination.monsoon]
months = [7, 8]
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.coordination.budget_ceiling, 250_000.0);
        assert_eq!(config.coordination.monsoon.months, vec![7, 8]);
        // restricted_kinds falls back to the built-in list
        assert!(
            config
                .coordination
                .monsoon
                .restricted_kinds
                .contains(&"trenching".to_string())
        );
    }

    #[test]
    fn test_invalid_month_rejected() {
        let mut config = FileCoordinationConfig::default();
        config.monsoon.months = vec![6, 13];
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidMonth(13))
        ));
    }
}
