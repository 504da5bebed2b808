//! Confidence weight configuration from TOML (`[confidence]` section)

use civic_domain::{ConfidenceWeights, Department};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Confidence weights, with optional per-department tables.
///
/// A department table replaces the shared weights wholesale; keys it leaves
/// out take the built-in defaults, not the values from `[confidence.weights]`.
///
/// # Example
///
/// ```toml
/// [confidence.weights]
/// base = 0.5
///
/// [confidence.departments.fire]
/// risk_high = -0.2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfidenceConfig {
    pub weights: ConfidenceWeights,
    pub departments: BTreeMap<Department, ConfidenceWeights>,
}

impl FileConfidenceConfig {
    pub fn weights_for(&self, department: Department) -> ConfidenceWeights {
        self.departments
            .get(&department)
            .cloned()
            .unwrap_or_else(|| self.weights.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_override() {
        let toml_str = r#"
[confidence.weights]
base = 0.4

[confidence.departments.fire]
risk_high = -0.2
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let fire = config.confidence.weights_for(Department::Fire);
        assert_eq!(fire.risk_high, -0.2);
        assert_eq!(fire.base, ConfidenceWeights::default().base);

        let water = config.confidence.weights_for(Department::Water);
        assert_eq!(water.base, 0.4);
    }
}
