//! Confidence scoring for pipeline decisions.
//!
//! The score starts at a base value and adds one signed term per factor:
//!
//! | Factor | Term |
//! |--------|------|
//! | `feasibility` | +0.25 feasible, -0.15 otherwise |
//! | `policy` | +0.20 compliant, -0.20 otherwise |
//! | `risk` | low +0.15, medium +0.05, high -0.10, critical -0.25 |
//! | `data_completeness` | +0.10 with >= 6 facts, +0.05 with >= 3, else -0.05 |
//! | `attempts` | +0.05 first try, 0 after one retry, -0.10 per further retry |
//! | `violations` | -0.05 per feasibility violation |
//! | `clamp` | whatever clamping to `[0, 1]` removed |
//!
//! `base + sum(factors)` always equals the returned value.

use crate::pipeline::PipelineState;
use crate::rules::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weights for each confidence term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub base: f64,
    pub feasible: f64,
    pub infeasible: f64,
    pub policy_ok: f64,
    pub policy_violation: f64,
    pub risk_low: f64,
    pub risk_medium: f64,
    pub risk_high: f64,
    pub risk_critical: f64,
    pub rich_data_min_facts: usize,
    pub rich_data: f64,
    pub partial_data_min_facts: usize,
    pub partial_data: f64,
    pub sparse_data: f64,
    pub first_attempt: f64,
    pub per_extra_retry: f64,
    pub per_violation: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            base: 0.5,
            feasible: 0.25,
            infeasible: -0.15,
            policy_ok: 0.20,
            policy_violation: -0.20,
            risk_low: 0.15,
            risk_medium: 0.05,
            risk_high: -0.10,
            risk_critical: -0.25,
            rich_data_min_facts: 6,
            rich_data: 0.10,
            partial_data_min_facts: 3,
            partial_data: 0.05,
            sparse_data: -0.05,
            first_attempt: 0.05,
            per_extra_retry: -0.10,
            per_violation: -0.05,
        }
    }
}

/// The signals the calculator reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceInputs {
    pub feasible: bool,
    pub policy_ok: bool,
    pub risk: RiskLevel,
    pub observation_count: usize,
    pub attempts: u32,
    pub feasibility_violations: usize,
}

impl From<&PipelineState> for ConfidenceInputs {
    fn from(state: &PipelineState) -> Self {
        Self {
            feasible: state.feasible,
            policy_ok: state.policy_ok,
            risk: state.risk_level.unwrap_or_default(),
            observation_count: state.observations.len(),
            attempts: state.attempts,
            feasibility_violations: state.feasibility_violation_count(),
        }
    }
}

/// A score together with the terms that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub value: f64,
    pub base: f64,
    pub factors: BTreeMap<String, f64>,
}

impl ConfidenceScore {
    /// `base + sum(factors)`.
    pub fn reconstructed(&self) -> f64 {
        self.base + self.factors.values().sum::<f64>()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfidenceCalculator {
    weights: ConfidenceWeights,
}

impl ConfidenceCalculator {
    pub fn new(weights: ConfidenceWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ConfidenceWeights {
        &self.weights
    }

    pub fn calculate(&self, inputs: &ConfidenceInputs) -> ConfidenceScore {
        let w = &self.weights;
        let mut factors = BTreeMap::new();

        factors.insert(
            "feasibility".to_string(),
            if inputs.feasible { w.feasible } else { w.infeasible },
        );
        factors.insert(
            "policy".to_string(),
            if inputs.policy_ok {
                w.policy_ok
            } else {
                w.policy_violation
            },
        );
        factors.insert(
            "risk".to_string(),
            match inputs.risk {
                RiskLevel::Low => w.risk_low,
                RiskLevel::Medium => w.risk_medium,
                RiskLevel::High => w.risk_high,
                RiskLevel::Critical => w.risk_critical,
            },
        );
        factors.insert(
            "data_completeness".to_string(),
            if inputs.observation_count >= w.rich_data_min_facts {
                w.rich_data
            } else if inputs.observation_count >= w.partial_data_min_facts {
                w.partial_data
            } else {
                w.sparse_data
            },
        );
        factors.insert(
            "attempts".to_string(),
            match inputs.attempts {
                0 => w.first_attempt,
                1 => 0.0,
                n => w.per_extra_retry * f64::from(n - 1),
            },
        );
        factors.insert(
            "violations".to_string(),
            w.per_violation * inputs.feasibility_violations as f64,
        );

        let raw = w.base + factors.values().sum::<f64>();
        let value = raw.clamp(0.0, 1.0);
        if value != raw {
            factors.insert("clamp".to_string(), value - raw);
        }

        ConfidenceScore {
            value,
            base: w.base,
            factors,
        }
    }
}
