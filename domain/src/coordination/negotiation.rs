//! Decoding of oracle negotiation responses.
//!
//! The oracle is asked for a JSON object. The first balanced `{...}` block
//! is decoded against a strict schema:
//!
//! - a missing field takes a conservative default (`escalate`, `0.0`
//!   confidence, human review required)
//! - a present but invalid field (unknown decision, confidence outside
//!   `[0, 1]`, wrong type) is a parse error
//!
//! On a parse error the caller substitutes [`Resolution::fallback`].

use super::resolution::{ExecutionPlan, Resolution, ResolutionDecision, ResolutionMethod};
use crate::core::json::extract_first_object;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_RATIONALE: &str = "no rationale provided";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NegotiationParseError {
    #[error("no JSON object in negotiation response")]
    NoJson,

    #[error("negotiation response does not match schema: {0}")]
    Schema(String),

    #[error("confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

#[derive(Debug, Deserialize)]
struct NegotiationProposal {
    #[serde(default)]
    decision: Option<ResolutionDecision>,
    #[serde(default)]
    rationale: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    requires_human: Option<bool>,
    #[serde(default)]
    execution_plan: Option<ExecutionPlan>,
}

/// Decode `text` into an LLM-method [`Resolution`] for `conflict_id`.
pub fn parse_negotiation_response(
    conflict_id: Uuid,
    text: &str,
    now: DateTime<Utc>,
) -> Result<Resolution, NegotiationParseError> {
    let json = extract_first_object(text).ok_or(NegotiationParseError::NoJson)?;
    let proposal: NegotiationProposal =
        serde_json::from_str(json).map_err(|e| NegotiationParseError::Schema(e.to_string()))?;

    let confidence = proposal.confidence.unwrap_or(0.0);
    if !(0.0..=1.0).contains(&confidence) {
        return Err(NegotiationParseError::ConfidenceOutOfRange(confidence));
    }

    let rationale = proposal
        .rationale
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_RATIONALE.to_string());

    Ok(Resolution::new(
        conflict_id,
        ResolutionMethod::Llm,
        proposal.decision.unwrap_or(ResolutionDecision::Escalate),
        rationale,
        now,
    )
    .with_confidence(confidence)
    .with_requires_human(proposal.requires_human.unwrap_or(true))
    .with_execution_plan(proposal.execution_plan.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Resolution, NegotiationParseError> {
        parse_negotiation_response(Uuid::nil(), text, Utc::now())
    }

    #[test]
    fn test_full_response() {
        let text = r#"After weighing both positions:
```json
{"decision": "approve_partial", "rationale": "Water first, roads next week",
 "confidence": 0.8, "requires_human": false,
 "execution_plan": {"approved": ["water"], "deferred": ["engineering"]}}
```"#;
        let r = parse(text).unwrap();
        assert_eq!(r.decision, ResolutionDecision::ApprovePartial);
        assert_eq!(r.confidence, 0.8);
        assert!(!r.requires_human);
        assert_eq!(r.execution_plan.deferred, vec!["engineering"]);
        assert_eq!(r.method, ResolutionMethod::Llm);
    }

    #[test]
    fn test_missing_fields_take_conservative_defaults() {
        let r = parse(r#"{"rationale": "unsure"}"#).unwrap();
        assert_eq!(r.decision, ResolutionDecision::Escalate);
        assert_eq!(r.confidence, 0.0);
        assert!(r.requires_human);

        let r = parse(r#"{"decision": "defer"}"#).unwrap();
        assert_eq!(r.rationale, DEFAULT_RATIONALE);
    }

    #[test]
    fn test_unknown_decision_is_parse_error() {
        assert!(matches!(
            parse(r#"{"decision": "approve_some"}"#),
            Err(NegotiationParseError::Schema(_))
        ));
    }

    #[test]
    fn test_confidence_out_of_range() {
        assert_eq!(
            parse(r#"{"decision": "defer", "confidence": 1.5}"#).unwrap_err(),
            NegotiationParseError::ConfidenceOutOfRange(1.5)
        );
    }

    #[test]
    fn test_no_json() {
        assert_eq!(
            parse("I think water should go first.").unwrap_err(),
            NegotiationParseError::NoJson
        );
    }
}
