//! Final verdict routing for department pipelines.

use crate::core::string::join_or;
use crate::pipeline::{FinalDecision, PipelineState};
use crate::rules::{CheckSeverity, Violation};
use serde::{Deserialize, Serialize};

/// The router's verdict with its explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingOutcome {
    pub decision: FinalDecision,
    pub reasoning: String,
    pub escalation_reason: Option<String>,
}

/// Combines feasibility, policy and confidence into a final verdict.
///
/// Precedence, first match wins:
/// 1. escalation already requested → escalate
/// 2. no feasible plan → escalate
/// 3. a blocking policy violation → reject
/// 4. any other policy violation → escalate
/// 5. confidence below threshold → escalate
/// 6. otherwise → approve
#[derive(Debug, Clone)]
pub struct DecisionRouter {
    confidence_threshold: f64,
}

impl DecisionRouter {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
        }
    }

    pub fn route(&self, state: &PipelineState) -> RoutingOutcome {
        let confidence = state.confidence.unwrap_or(0.0);

        if state.escalate {
            let reason = state
                .escalation_reason
                .clone()
                .unwrap_or_else(|| "escalation requested".to_string());
            return escalate(format!("Escalated: {}", reason), reason);
        }

        if !state.feasible {
            let reason = format!(
                "No feasible plan found after {} attempts: {}",
                state.plans_tried(),
                state.feasibility_reason
            );
            return escalate(reason.clone(), reason);
        }

        if !state.policy_ok {
            let listed = describe(&state.policy_violations);
            if state
                .policy_violations
                .iter()
                .any(|v| v.severity == CheckSeverity::Blocking)
            {
                return RoutingOutcome {
                    decision: FinalDecision::Reject,
                    reasoning: format!("Rejected on policy grounds: {}", listed),
                    escalation_reason: None,
                };
            }
            let reason = format!("Policy review required: {}", listed);
            return escalate(reason.clone(), reason);
        }

        if confidence < self.confidence_threshold {
            let reason = format!(
                "Confidence {:.2} below threshold {:.2}",
                confidence, self.confidence_threshold
            );
            return escalate(reason.clone(), reason);
        }

        let plan = state
            .plan
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("no plan");
        RoutingOutcome {
            decision: FinalDecision::Approve,
            reasoning: format!(
                "Approved plan '{}' ({}); policy compliant; confidence {:.2}",
                plan, state.feasibility_reason, confidence
            ),
            escalation_reason: None,
        }
    }
}

fn escalate(reasoning: String, reason: String) -> RoutingOutcome {
    RoutingOutcome {
        decision: FinalDecision::Escalate,
        reasoning,
        escalation_reason: Some(reason),
    }
}

fn describe(violations: &[Violation]) -> String {
    join_or(violations.iter().map(ToString::to_string), "unspecified violation")
}
