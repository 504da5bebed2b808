//! Negotiation engine
//!
//! Settles conflicts the rule engine may not decide by asking the reasoning
//! oracle for a structured proposal. The answer is decoded strictly; when
//! the oracle is unreachable or its answer does not decode, the result is a
//! safe escalation to a human. This engine never fails.

use crate::config::OracleParams;
use crate::ports::reasoning_oracle::{OracleRequest, ReasoningOracle};
use crate::use_cases::shared::ask_oracle;
use chrono::Utc;
use civic_domain::{
    AgentDecision, Conflict, MonsoonPolicy, PromptTemplate, Resolution, parse_negotiation_response,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct NegotiationEngine {
    oracle: Option<Arc<dyn ReasoningOracle>>,
    params: OracleParams,
    monsoon: MonsoonPolicy,
    auto_approval_cost_limit: f64,
}

impl NegotiationEngine {
    pub fn new(
        oracle: Option<Arc<dyn ReasoningOracle>>,
        params: OracleParams,
        monsoon: MonsoonPolicy,
        auto_approval_cost_limit: f64,
    ) -> Self {
        Self {
            oracle,
            params,
            monsoon,
            auto_approval_cost_limit,
        }
    }

    pub async fn negotiate(&self, conflict: &Conflict, decisions: &[AgentDecision]) -> Resolution {
        let now = Utc::now();
        let Some(oracle) = &self.oracle else {
            warn!(conflict_id = %conflict.conflict_id, "No oracle configured, escalating");
            return Resolution::negotiation_failed(conflict.conflict_id, now);
        };

        let request = OracleRequest::new(
            PromptTemplate::negotiation_system(),
            PromptTemplate::negotiation_prompt(conflict, decisions, &self.constraints(now)),
            &self.params,
        );

        let text = match ask_oracle(oracle.as_ref(), &request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(conflict_id = %conflict.conflict_id, "Negotiation failed: {}", e);
                return Resolution::negotiation_failed(conflict.conflict_id, now);
            }
        };

        match parse_negotiation_response(conflict.conflict_id, &text, now) {
            Ok(resolution) => {
                debug!(
                    conflict_id = %conflict.conflict_id,
                    decision = %resolution.decision,
                    confidence = resolution.confidence,
                    "Negotiated resolution"
                );
                resolution
            }
            Err(e) => {
                warn!(conflict_id = %conflict.conflict_id, "Unusable negotiation response: {}", e);
                Resolution::fallback(
                    conflict.conflict_id,
                    format!("negotiation response unusable: {}", e),
                    now,
                )
            }
        }
    }

    fn constraints(&self, now: chrono::DateTime<Utc>) -> Vec<String> {
        let mut constraints = vec![format!(
            "Combined spend above {:.2} needs human approval",
            self.auto_approval_cost_limit
        )];
        if !self.monsoon.months.is_empty() {
            constraints.push(format!(
                "Monsoon months {}: no {} work ({})",
                self.monsoon
                    .months
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                self.monsoon.restricted_kinds.join(", "),
                if self.monsoon.is_monsoon(now) {
                    "in effect now"
                } else {
                    "not in effect now"
                }
            ));
        }
        constraints.push("Emergencies outrank routine work".to_string());
        constraints
    }
}
