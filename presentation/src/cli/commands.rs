//! CLI command definitions

use civic_domain::{ConflictQuery, Department, Priority, Request};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable console output
    Text,
    /// JSON output
    Json,
}

/// Who settles coordination runs that need a human
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApprovalMode {
    /// Ask on the terminal
    Interactive,
    /// Approve every escalation (simulations only)
    AutoApprove,
    /// Reject every escalation
    AutoReject,
    /// Nobody answers; escalations stay unresolved
    None,
}

/// CLI arguments for civic-quorum
#[derive(Parser, Debug)]
#[command(name = "civic-quorum")]
#[command(author, version, about = "Municipal department agents with conflict-aware coordination")]
#[command(long_about = r#"
Civic Quorum runs one decision pipeline per municipal department and keeps
their plans from colliding.

Each request goes through context loading, intent analysis, planning,
an optional coordination checkpoint, tool execution, feasibility and policy
checks, and ends as approve, escalate or reject. Decisions at the same
location are then checked for resource, location, budget and priority
conflicts, which are settled by rules, negotiation or a human.

Configuration files are loaded from (in priority order):
1. CIVIC_* environment variables
2. --config <path>     Explicit config file
3. ./civic.toml        Project-level config
4. ~/.config/civic-quorum/config.toml   Global config

Example:
  civic-quorum --fixtures demos/city.toml decide -d water -k pipe_burst -l ward-3 --cost 8000
  civic-quorum --fixtures demos/city.toml simulate --approval auto-approve
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format (defaults to [output].format, then text)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Department data fixture file (overrides [data].fixtures)
    #[arg(long, global = true, value_name = "PATH")]
    pub fixtures: Option<PathBuf>,

    /// Write structured audit events to this JSONL file
    #[arg(long, global = true, value_name = "PATH")]
    pub audit_log: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one request through its department's pipeline
    Decide(RequestArgs),

    /// Run the fixture requests, then check a planned action against them
    CheckConflicts(CheckArgs),

    /// Run the fixture requests, then coordinate decisions per location
    Coordinate(CoordinateArgs),

    /// Run every fixture request concurrently, then coordinate
    Simulate(CoordinateArgs),

    /// Show configuration file locations and the effective settings
    ShowConfig,
}

/// A request described on the command line
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    #[arg(short, long)]
    pub department: Department,

    /// Request kind, e.g. pipe_burst or road_excavation
    #[arg(short, long)]
    pub kind: String,

    #[arg(short, long)]
    pub location: String,

    /// Resource the work needs (repeatable)
    #[arg(short, long = "resource", value_name = "NAME")]
    pub resources: Vec<String>,

    #[arg(long, default_value_t = 0.0)]
    pub cost: f64,

    #[arg(short, long, default_value = "medium")]
    pub priority: Priority,

    /// Extra request fact as key=value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub payload: Vec<(String, String)>,

    #[arg(long, default_value = "cli")]
    pub requester: String,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(short, long)]
    pub department: Department,

    #[arg(short, long)]
    pub location: String,

    #[arg(short, long, default_value = "")]
    pub kind: String,

    /// Resource the planned work needs (repeatable)
    #[arg(short, long = "resource", value_name = "NAME")]
    pub resources: Vec<String>,

    #[arg(long, default_value_t = 0.0)]
    pub cost: f64,

    #[arg(short, long, default_value = "medium")]
    pub priority: Priority,

    /// The work occupies the whole site
    #[arg(long)]
    pub exclusive: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CoordinateArgs {
    /// Who answers escalations
    #[arg(long, value_enum, default_value = "interactive")]
    pub approval: ApprovalMode,
}

impl RequestArgs {
    /// Build the domain request. Payload values that parse as JSON keep
    /// their type; anything else is a string.
    pub fn to_request(&self) -> Request {
        let mut request = Request::new(
            self.requester.as_str(),
            self.department,
            self.kind.as_str(),
            self.location.as_str(),
        )
        .with_cost(self.cost)
        .with_priority(self.priority);
        for resource in &self.resources {
            request = request.with_resource(resource.as_str());
        }
        for (key, raw) in &self.payload {
            let value = serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.clone()));
            request = request.with_payload(key.as_str(), value);
        }
        request
    }
}

impl CheckArgs {
    pub fn to_query(&self) -> ConflictQuery {
        let mut query = ConflictQuery::new(self.department, self.location.as_str())
            .with_cost(self.cost)
            .with_priority(self.priority)
            .with_exclusive_site(self.exclusive);
        for resource in &self.resources {
            query = query.with_resource(resource.as_str());
        }
        query.kind = self.kind.clone();
        query
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
