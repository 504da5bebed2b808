//! Named, data-driven checks over observed facts.
//!
//! Each [`NamedCheck`] pairs a name with a [`FactRule`]. Rules read facts
//! from the observation map first and from the request payload second, so a
//! requester can supply figures such as `trucks_required` directly. A fact
//! that is missing or not numeric fails its check.

use crate::core::facts::{Facts, fact_flag, fact_number};
use crate::pipeline::Plan;
use crate::request::Request;
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// What a check asserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FactRule {
    /// `fact >= min`
    Min { fact: String, min: f64 },
    /// `fact <= max`
    Max { fact: String, max: f64 },
    /// `fact >= reference`, both read from facts
    AtLeastFact { fact: String, reference: String },
    /// `fact <= reference`, both read from facts
    AtMostFact { fact: String, reference: String },
    /// `fact == expected`
    Flag { fact: String, expected: bool },
    /// `fact >= estimated cost` of the plan (or request)
    BudgetCoversCost { fact: String },
    /// estimated cost `<= max`
    CostAtMost { max: f64 },
    /// the request was not submitted in one of `months` (1-12)
    NotDuringMonths { months: Vec<u32> },
    /// the request names at least one resource
    ResourcesDeclared,
}

/// How the router treats a failed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckSeverity {
    /// A human may still approve; escalate.
    #[default]
    Advisory,
    /// Not approvable as submitted; reject.
    Blocking,
}

/// A failed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub check: String,
    pub message: String,
    pub severity: CheckSeverity,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.check, self.message)
    }
}

/// A check with a stable name and a severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCheck {
    pub name: String,
    #[serde(flatten)]
    pub rule: FactRule,
    #[serde(default)]
    pub severity: CheckSeverity,
}

impl NamedCheck {
    pub fn new(name: impl Into<String>, rule: FactRule) -> Self {
        Self {
            name: name.into(),
            rule,
            severity: CheckSeverity::Advisory,
        }
    }

    pub fn blocking(mut self) -> Self {
        self.severity = CheckSeverity::Blocking;
        self
    }

    /// Run the check. `None` means it passed.
    pub fn evaluate(
        &self,
        facts: &Facts,
        request: &Request,
        plan: Option<&Plan>,
    ) -> Option<Violation> {
        self.failure_message(facts, request, plan).map(|message| Violation {
            check: self.name.clone(),
            message,
            severity: self.severity,
        })
    }

    fn failure_message(
        &self,
        facts: &Facts,
        request: &Request,
        plan: Option<&Plan>,
    ) -> Option<String> {
        let number = |key: &str| {
            fact_number(facts, key).or_else(|| fact_number(&request.payload, key))
        };
        let missing = |key: &str| Some(format!("missing observation '{}'", key));
        let cost = plan
            .map(|p| p.estimated_cost)
            .unwrap_or(request.estimated_cost);

        match &self.rule {
            FactRule::Min { fact, min } => match number(fact) {
                None => missing(fact),
                Some(v) if v < *min => Some(format!("{} is {}, needs at least {}", fact, v, min)),
                Some(_) => None,
            },
            FactRule::Max { fact, max } => match number(fact) {
                None => missing(fact),
                Some(v) if v > *max => Some(format!("{} is {}, exceeds {}", fact, v, max)),
                Some(_) => None,
            },
            FactRule::AtLeastFact { fact, reference } => match (number(fact), number(reference)) {
                (None, _) => missing(fact),
                (_, None) => missing(reference),
                (Some(v), Some(r)) if v < r => {
                    Some(format!("{} ({}) is below {} ({})", fact, v, reference, r))
                }
                _ => None,
            },
            FactRule::AtMostFact { fact, reference } => match (number(fact), number(reference)) {
                (None, _) => missing(fact),
                (_, None) => missing(reference),
                (Some(v), Some(r)) if v > r => {
                    Some(format!("{} ({}) exceeds {} ({})", fact, v, reference, r))
                }
                _ => None,
            },
            FactRule::Flag { fact, expected } => {
                let value = fact_flag(facts, fact).or_else(|| fact_flag(&request.payload, fact));
                match value {
                    None => missing(fact),
                    Some(v) if v != *expected => {
                        Some(format!("{} is {}, expected {}", fact, v, expected))
                    }
                    Some(_) => None,
                }
            }
            FactRule::BudgetCoversCost { fact } => match number(fact) {
                None => missing(fact),
                Some(v) if v < cost => Some(format!(
                    "{} ({:.2}) does not cover estimated cost ({:.2})",
                    fact, v, cost
                )),
                Some(_) => None,
            },
            FactRule::CostAtMost { max } => (cost > *max)
                .then(|| format!("estimated cost {:.2} exceeds limit {:.2}", cost, max)),
            FactRule::NotDuringMonths { months } => {
                let month = request.submitted_at.month();
                months.contains(&month).then(|| {
                    format!("'{}' work is not permitted in month {}", request.kind, month)
                })
            }
            FactRule::ResourcesDeclared => {
                let declared = plan
                    .map(|p| !p.resources.is_empty())
                    .unwrap_or(!request.resources_needed.is_empty());
                (!declared).then(|| "no resources declared".to_string())
            }
        }
    }
}

/// Aggregate outcome of a rule-set: `(ok, reason, violations)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleVerdict {
    pub ok: bool,
    pub reason: String,
    pub checks_run: Vec<String>,
    pub violations: Vec<Violation>,
}

impl RuleVerdict {
    pub fn has_blocking(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity == CheckSeverity::Blocking)
    }
}

/// Run every check in order and collect the failures.
pub fn evaluate_checks(
    label: &str,
    checks: &[NamedCheck],
    facts: &Facts,
    request: &Request,
    plan: Option<&Plan>,
) -> RuleVerdict {
    let violations: Vec<Violation> = checks
        .iter()
        .filter_map(|c| c.evaluate(facts, request, plan))
        .collect();

    let reason = if violations.is_empty() {
        format!("all {} {} checks passed", checks.len(), label)
    } else {
        violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    };

    RuleVerdict {
        ok: violations.is_empty(),
        reason,
        checks_run: checks.iter().map(|c| c.name.clone()).collect(),
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Department;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn facts(pairs: &[(&str, serde_json::Value)]) -> Facts {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn request() -> Request {
        Request::new("r", Department::Sanitation, "garbage_collection", "ward-9")
            .with_cost(2_000.0)
            .submitted_at(Utc.with_ymd_and_hms(2024, 7, 10, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_at_least_fact() {
        let check = NamedCheck::new(
            "truck_availability",
            FactRule::AtLeastFact {
                fact: "trucks_available".to_string(),
                reference: "trucks_required".to_string(),
            },
        );
        let ok = facts(&[("trucks_available", json!(4)), ("trucks_required", json!(3))]);
        assert!(check.evaluate(&ok, &request(), None).is_none());

        let short = facts(&[("trucks_available", json!(2)), ("trucks_required", json!(3))]);
        let violation = check.evaluate(&short, &request(), None).unwrap();
        assert_eq!(violation.check, "truck_availability");
        assert!(violation.message.contains("below trucks_required"));
    }

    #[test]
    fn test_reference_from_payload() {
        let check = NamedCheck::new(
            "truck_availability",
            FactRule::AtLeastFact {
                fact: "trucks_available".to_string(),
                reference: "trucks_required".to_string(),
            },
        );
        let request = request().with_payload("trucks_required", 5);
        let observed = facts(&[("trucks_available", json!(4))]);
        assert!(check.evaluate(&observed, &request, None).is_some());
    }

    #[test]
    fn test_missing_fact_fails() {
        let check = NamedCheck::new(
            "crews",
            FactRule::Min {
                fact: "crews_available".to_string(),
                min: 1.0,
            },
        );
        let violation = check.evaluate(&Facts::new(), &request(), None).unwrap();
        assert_eq!(violation.message, "missing observation 'crews_available'");
    }

    #[test]
    fn test_budget_uses_plan_cost() {
        let check = NamedCheck::new(
            "budget",
            FactRule::BudgetCoversCost {
                fact: "budget_available".to_string(),
            },
        );
        let observed = facts(&[("budget_available", json!(2_500))]);
        assert!(check.evaluate(&observed, &request(), None).is_none());

        let pricey = Plan::new("contractor", "ward-9").with_cost(3_000.0);
        assert!(check.evaluate(&observed, &request(), Some(&pricey)).is_some());
    }

    #[test]
    fn test_not_during_months_reads_submission_date() {
        let check = NamedCheck::new(
            "monsoon",
            FactRule::NotDuringMonths {
                months: vec![6, 7, 8, 9],
            },
        )
        .blocking();
        let violation = check.evaluate(&Facts::new(), &request(), None).unwrap();
        assert_eq!(violation.severity, CheckSeverity::Blocking);

        let dry = request().submitted_at(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap());
        assert!(check.evaluate(&Facts::new(), &dry, None).is_none());
    }

    #[test]
    fn test_evaluate_checks_reason() {
        let checks = vec![
            NamedCheck::new("declared", FactRule::ResourcesDeclared),
            NamedCheck::new("cap", FactRule::CostAtMost { max: 10_000.0 }),
        ];
        let verdict = evaluate_checks("policy", &checks, &Facts::new(), &request(), None);
        assert!(!verdict.ok);
        assert_eq!(verdict.reason, "declared: no resources declared");
        assert_eq!(verdict.checks_run, vec!["declared", "cap"]);
        assert!(!verdict.has_blocking());

        let request = request().with_resource("compactor");
        let verdict = evaluate_checks("policy", &checks, &Facts::new(), &request, None);
        assert!(verdict.ok);
        assert_eq!(verdict.reason, "all 2 policy checks passed");
    }

    #[test]
    fn test_named_check_toml_shape() {
        let json = json!({"name": "pressure", "rule": "min", "fact": "psi", "min": 40.0});
        let check: NamedCheck = serde_json::from_value(json).unwrap();
        assert_eq!(check.severity, CheckSeverity::Advisory);
        assert_eq!(
            check.rule,
            FactRule::Min {
                fact: "psi".to_string(),
                min: 40.0
            }
        );
    }
}
