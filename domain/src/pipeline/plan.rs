//! Plans: ordered tool invocations plus the resources they commit.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, VecDeque};

/// A single tool invocation within a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub tool: String,
    #[serde(default = "empty_args")]
    pub args: Value,
}

fn empty_args() -> Value {
    Value::Object(Default::default())
}

impl PlanStep {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            args: empty_args(),
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }
}

/// Where a plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Oracle,
    #[default]
    Template,
}

impl PlanSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanSource::Oracle => "oracle",
            PlanSource::Template => "template",
        }
    }
}

impl std::fmt::Display for PlanSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A candidate course of action for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub steps: Vec<PlanStep>,
    pub location: String,
    #[serde(default)]
    pub resources: BTreeSet<String>,
    #[serde(default)]
    pub estimated_cost: f64,
    /// The plan needs the site to itself (road closure, excavation).
    #[serde(default)]
    pub exclusive_site: bool,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub source: PlanSource,
}

impl Plan {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            location: location.into(),
            resources: BTreeSet::new(),
            estimated_cost: 0.0,
            exclusive_site: false,
            rationale: String::new(),
            source: PlanSource::Template,
        }
    }

    pub fn with_step(mut self, step: PlanStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.estimated_cost = cost;
        self
    }

    pub fn with_exclusive_site(mut self, exclusive: bool) -> Self {
        self.exclusive_site = exclusive;
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_source(mut self, source: PlanSource) -> Self {
        self.source = source;
        self
    }

    /// Names of the tools this plan invokes, in order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.tool.as_str()).collect()
    }
}

/// A primary plan and its ranked alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSet {
    pub primary: Plan,
    pub alternatives: VecDeque<Plan>,
}

impl PlanSet {
    pub fn new(primary: Plan) -> Self {
        Self {
            primary,
            alternatives: VecDeque::new(),
        }
    }

    pub fn with_alternative(mut self, plan: Plan) -> Self {
        self.alternatives.push_back(plan);
        self
    }
}
