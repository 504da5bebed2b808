//! Per-department rule tables.

use super::check::NamedCheck;
use super::risk::RiskLevel;
use crate::pipeline::{Plan, PlanSet, PlanSource, PlanStep};
use crate::request::{Department, Request};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Payload flag that forces critical risk regardless of intent.
pub const PUBLIC_SAFETY_HAZARD: &str = "public_safety_hazard";

/// Intent name used when no profile claims a request kind.
pub const GENERAL_INTENT: &str = "general_request";

/// A reusable plan shape, instantiated against a concrete request.
///
/// String arguments may contain `{location}` and `{kind}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTemplate {
    pub name: String,
    pub steps: Vec<PlanStep>,
    /// Replaces the request's resources when set.
    #[serde(default)]
    pub resources: Option<BTreeSet<String>>,
    #[serde(default = "unit_factor")]
    pub cost_factor: f64,
    #[serde(default)]
    pub exclusive_site: bool,
    #[serde(default)]
    pub rationale: String,
}

fn unit_factor() -> f64 {
    1.0
}

impl PlanTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            resources: None,
            cost_factor: 1.0,
            exclusive_site: false,
            rationale: String::new(),
        }
    }

    pub fn step(mut self, tool: impl Into<String>, args: Value) -> Self {
        self.steps.push(PlanStep::new(tool).with_args(args));
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = Some(resources.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_cost_factor(mut self, factor: f64) -> Self {
        self.cost_factor = factor;
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive_site = true;
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    /// Build a concrete plan for `request`.
    pub fn instantiate(&self, request: &Request) -> Plan {
        let steps = self
            .steps
            .iter()
            .map(|s| PlanStep::new(s.tool.clone()).with_args(substitute(&s.args, request)))
            .collect();

        Plan {
            name: self.name.clone(),
            steps,
            location: request.location.clone(),
            resources: self
                .resources
                .clone()
                .unwrap_or_else(|| request.resources_needed.clone()),
            estimated_cost: request.estimated_cost * self.cost_factor,
            exclusive_site: self.exclusive_site || request.payload_flag("exclusive_site"),
            rationale: self.rationale.clone(),
            source: PlanSource::Template,
        }
    }
}

fn substitute(value: &Value, request: &Request) -> Value {
    match value {
        Value::String(s) => Value::String(
            s.replace("{location}", &request.location)
                .replace("{kind}", &request.kind),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, request)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, request)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Everything the pipeline needs to know about one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentProfile {
    pub intent: String,
    /// Request kinds that classify as this intent (case-insensitive).
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default)]
    pub base_risk: RiskLevel,
    /// Goal statement; `{location}` and `{kind}` are substituted.
    pub goal: String,
    #[serde(default)]
    pub feasibility: Vec<NamedCheck>,
    #[serde(default)]
    pub policy: Vec<NamedCheck>,
    /// Primary template first, then alternatives in preference order.
    #[serde(default)]
    pub templates: Vec<PlanTemplate>,
}

impl IntentProfile {
    pub fn new(intent: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            kinds: Vec::new(),
            base_risk: RiskLevel::Low,
            goal: goal.into(),
            feasibility: Vec::new(),
            policy: Vec::new(),
            templates: Vec::new(),
        }
    }

    pub fn kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    pub fn risk(mut self, risk: RiskLevel) -> Self {
        self.base_risk = risk;
        self
    }

    pub fn feasibility(mut self, check: NamedCheck) -> Self {
        self.feasibility.push(check);
        self
    }

    pub fn policy(mut self, check: NamedCheck) -> Self {
        self.policy.push(check);
        self
    }

    pub fn template(mut self, template: PlanTemplate) -> Self {
        self.templates.push(template);
        self
    }

    fn matches(&self, kind: &str) -> bool {
        let kind = kind.trim();
        self.intent.eq_ignore_ascii_case(kind) || self.kinds.iter().any(|k| k.eq_ignore_ascii_case(kind))
    }
}

/// The per-department strategy the generic pipeline is parameterized with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    pub department: Department,
    #[serde(default)]
    pub intents: Vec<IntentProfile>,
    pub default_profile: IntentProfile,
}

impl RuleTable {
    pub fn new(department: Department, default_profile: IntentProfile) -> Self {
        Self {
            department,
            intents: Vec::new(),
            default_profile,
        }
    }

    pub fn with_intent(mut self, profile: IntentProfile) -> Self {
        self.intents.push(profile);
        self
    }

    /// Map a request kind to its intent profile, or the default profile.
    pub fn classify(&self, kind: &str) -> &IntentProfile {
        self.intents
            .iter()
            .find(|p| p.matches(kind))
            .unwrap_or(&self.default_profile)
    }

    /// Look a profile up by intent name, falling back to the default.
    pub fn profile(&self, intent: &str) -> &IntentProfile {
        self.intents
            .iter()
            .find(|p| p.intent == intent)
            .unwrap_or(&self.default_profile)
    }

    pub fn feasibility_checks(&self, intent: &str) -> &[NamedCheck] {
        let profile = self.profile(intent);
        if profile.feasibility.is_empty() {
            &self.default_profile.feasibility
        } else {
            &profile.feasibility
        }
    }

    pub fn policy_checks(&self, intent: &str) -> &[NamedCheck] {
        let profile = self.profile(intent);
        if profile.policy.is_empty() {
            &self.default_profile.policy
        } else {
            &profile.policy
        }
    }

    /// Every tool any template in this table uses. Oracle plans may only
    /// call these.
    pub fn known_tools(&self) -> BTreeSet<String> {
        self.intents
            .iter()
            .chain(std::iter::once(&self.default_profile))
            .flat_map(|p| p.templates.iter())
            .flat_map(|t| t.steps.iter().map(|s| s.tool.clone()))
            .collect()
    }

    /// Deterministic plans for `intent`, used when the oracle cannot help.
    ///
    /// Returns `None` only if neither the intent nor the default profile
    /// defines a template.
    pub fn template_plans(&self, intent: &str, request: &Request) -> Option<PlanSet> {
        let profile = self.profile(intent);
        let templates = if profile.templates.is_empty() {
            &self.default_profile.templates
        } else {
            &profile.templates
        };

        let (primary, rest) = templates.split_first()?;
        Some(
            rest.iter()
                .fold(PlanSet::new(primary.instantiate(request)), |set, t| {
                    set.with_alternative(t.instantiate(request))
                }),
        )
    }

    /// Risk of acting on `request` under `profile`.
    ///
    /// Starts from the profile's base risk, raised one level when the cost
    /// exceeds `auto_approval_cost_limit`; a critical-priority request is at
    /// least `High`. Critical risk requires either the public-safety hazard
    /// flag or a critical-priority request on an already high-risk intent.
    pub fn assess_risk(
        &self,
        profile: &IntentProfile,
        request: &Request,
        auto_approval_cost_limit: f64,
    ) -> RiskLevel {
        let mut risk = profile.base_risk;
        if request.estimated_cost > auto_approval_cost_limit {
            risk = risk.raised();
        }
        if request.priority.is_emergency() {
            risk = risk.max(RiskLevel::High);
        }
        if request.payload_flag(PUBLIC_SAFETY_HAZARD)
            || (request.priority.is_emergency() && profile.base_risk >= RiskLevel::High)
        {
            risk = RiskLevel::Critical;
        }
        risk
    }

    pub fn goal_for(&self, profile: &IntentProfile, request: &Request) -> String {
        profile
            .goal
            .replace("{location}", &request.location)
            .replace("{kind}", &request.kind)
    }
}
