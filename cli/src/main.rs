//! CLI entrypoint for civic-quorum
//!
//! This is the main binary that wires together all layers using
//! dependency injection: configuration, department data fixtures, the
//! audit store, the optional reasoning oracle and one pipeline per
//! department.

use anyhow::{Context, Result, anyhow};
use civic_application::{
    AuditLogger, AutoApproveEscalations, AutoRejectEscalations, CheckPlanConflictsUseCase,
    CoordinateUseCase, CoordinationCheckpoint, CoordinationProgressNotifier, CoordinationResult,
    DecideOutput, DecideUseCase, DepartmentRouter, HumanApprovalPort, NoAuditLogger, NoProgress,
    PipelineProgressNotifier, ReasoningOracle,
};
use civic_domain::{Decision, Department, FinalDecision, Request, departments};
use civic_infrastructure::{
    ConfigLoader, FileConfig, FileOutputFormat, FixtureSet, InMemoryAuditStore, JsonlAuditLogger,
    oracle_from_config,
};
use civic_presentation::{
    ApprovalMode, Cli, Command, ConsoleFormatter, InteractiveHumanApproval, OutputFormat,
    ProgressReporter, SimpleProgress,
};
use clap::Parser;
use futures::future::join_all;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    if let Some(path) = &cli.fixtures {
        config.data.fixtures = Some(path.clone());
    }
    if let Some(path) = &cli.audit_log {
        config.logging.audit_log = Some(path.clone());
    }
    config.validate().context("Invalid configuration")?;

    let _log_guard = init_logging(cli.verbose, config.logging.log_dir_path());
    info!("Starting civic-quorum");

    if !config.output.color {
        colored::control::set_override(false);
    }

    if let Command::ShowConfig = cli.command {
        ConfigLoader::print_config_sources();
        println!();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let format = cli.output.unwrap_or(match config.output.format {
        Some(FileOutputFormat::Json) => OutputFormat::Json,
        _ => OutputFormat::Text,
    });

    // Ctrl-C stops pipelines that have not started and ends any human wait
    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                token.cancel();
            }
        });
    }

    let app = App::build(config, format, cli.quiet, token)?;

    match cli.command {
        Command::Decide(args) => {
            let output = app.router.decide(args.to_request()).await?;
            app.print_decision(&output);
        }
        Command::CheckConflicts(args) => {
            app.run_sequential(app.fixtures.requests.clone()).await?;
            let result = app.checkpoint.execute(&args.to_query()).await?;
            match app.format {
                OutputFormat::Text => println!("{}", ConsoleFormatter::format_check(&result)),
                OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&result)),
            }
        }
        Command::Coordinate(args) => {
            let decisions = app.run_sequential(app.fixtures.requests.clone()).await?;
            app.coordinate_by_location(decisions, args.approval).await?;
        }
        Command::Simulate(args) => {
            let decisions = app.run_concurrent(app.fixtures.requests.clone()).await?;
            app.coordinate_by_location(decisions, args.approval).await?;
        }
        Command::ShowConfig => {}
    }

    Ok(())
}

/// Initialize tracing: stderr at the requested verbosity, plus a daily
/// rolling file when `log_dir` is set. The guard must outlive `main`'s work.
fn init_logging(verbose: u8, log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "civic-quorum.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

/// Everything one invocation needs, built once from configuration.
struct App {
    config: FileConfig,
    format: OutputFormat,
    fixtures: FixtureSet,
    store: Arc<InMemoryAuditStore>,
    oracle: Option<Arc<dyn ReasoningOracle>>,
    audit: Arc<dyn AuditLogger>,
    checkpoint: Arc<CheckPlanConflictsUseCase>,
    router: DepartmentRouter,
    pipeline_progress: Arc<dyn PipelineProgressNotifier>,
    coordination_progress: Arc<dyn CoordinationProgressNotifier>,
    token: CancellationToken,
}

impl App {
    fn build(
        config: FileConfig,
        format: OutputFormat,
        quiet: bool,
        token: CancellationToken,
    ) -> Result<Self> {
        let fixtures = match &config.data.fixtures {
            Some(path) => FixtureSet::load(path)?,
            None => {
                warn!("No fixture file configured; departments have no data");
                FixtureSet::default()
            }
        };

        let audit: Arc<dyn AuditLogger> = match config.logging.audit_log_path() {
            Some(path) => Arc::new(
                JsonlAuditLogger::open(&path)
                    .with_context(|| format!("Failed to open audit log {}", path.display()))?,
            ),
            None => Arc::new(NoAuditLogger),
        };

        let oracle = oracle_from_config(&config.oracle);
        if oracle.is_none() {
            info!("No oracle endpoint configured; using templates and rules only");
        }

        let (pipeline_progress, coordination_progress): (
            Arc<dyn PipelineProgressNotifier>,
            Arc<dyn CoordinationProgressNotifier>,
        ) = if quiet || format == OutputFormat::Json {
            (Arc::new(NoProgress), Arc::new(NoProgress))
        } else if config.output.show_progress {
            let reporter = Arc::new(ProgressReporter::new());
            (reporter.clone(), reporter)
        } else {
            (Arc::new(SimpleProgress), Arc::new(SimpleProgress))
        };

        let store = Arc::new(InMemoryAuditStore::new());
        let checkpoint = Arc::new(CheckPlanConflictsUseCase::new(
            store.clone(),
            &config.coordination_params(),
        ));

        let mut app = Self {
            config,
            format,
            fixtures,
            store,
            oracle,
            audit,
            checkpoint,
            router: DepartmentRouter::new(),
            pipeline_progress,
            coordination_progress,
            token,
        };
        app.router = app.build_router();
        Ok(app)
    }

    fn build_router(&self) -> DepartmentRouter {
        let checkpoint: Arc<dyn CoordinationCheckpoint> = self.checkpoint.clone();
        Department::ALL
            .into_iter()
            .fold(DepartmentRouter::new(), |router, department| {
                let mut pipeline = DecideUseCase::new(
                    Arc::new(departments::builtin(department)),
                    Arc::new(self.fixtures.data_port(department)),
                    self.store.clone(),
                    self.config.pipeline_params(department),
                )
                .with_checkpoint(checkpoint.clone())
                .with_audit_logger(self.audit.clone())
                .with_progress(self.pipeline_progress.clone())
                .with_cancellation(self.token.clone());
                if let Some(oracle) = &self.oracle {
                    pipeline = pipeline.with_oracle(oracle.clone());
                }
                router.register(pipeline)
            })
    }

    /// Decide requests one after another so each sees its predecessors at
    /// the coordination checkpoint.
    async fn run_sequential(&self, requests: Vec<Request>) -> Result<Vec<Decision>> {
        if requests.is_empty() {
            warn!("Fixture file lists no requests");
        }
        let mut decisions = Vec::with_capacity(requests.len());
        for request in requests {
            let output = self.router.decide(request).await?;
            self.print_batch_decision(&output);
            decisions.push(output.decision);
        }
        Ok(decisions)
    }

    /// Decide every request at once, as departments would in the field.
    async fn run_concurrent(&self, requests: Vec<Request>) -> Result<Vec<Decision>> {
        if requests.is_empty() {
            warn!("Fixture file lists no requests");
        }
        let outputs = join_all(requests.into_iter().map(|r| self.router.decide(r))).await;
        let mut decisions = Vec::with_capacity(outputs.len());
        for output in outputs {
            let output = output?;
            self.print_batch_decision(&output);
            decisions.push(output.decision);
        }
        Ok(decisions)
    }

    /// Coordinate each location that has two or more live decisions.
    async fn coordinate_by_location(
        &self,
        decisions: Vec<Decision>,
        mode: ApprovalMode,
    ) -> Result<()> {
        let mut by_location: BTreeMap<String, Vec<Decision>> = BTreeMap::new();
        for decision in decisions
            .into_iter()
            .filter(|d| d.final_decision != FinalDecision::Reject)
        {
            by_location
                .entry(decision.request_snapshot.location.clone())
                .or_default()
                .push(decision);
        }

        let coordinator = self.coordinator(mode);
        let mut results: Vec<(String, CoordinationResult)> = Vec::new();
        for (location, group) in by_location {
            if group.len() < 2 {
                info!(%location, "Single decision, nothing to coordinate");
                continue;
            }
            let result = coordinator.execute(group).await?;
            if self.format == OutputFormat::Text {
                println!("Location: {}", location);
                println!("{}", ConsoleFormatter::format_coordination(&result));
            }
            results.push((location, result));
        }

        match self.format {
            OutputFormat::Json => {
                let runs: Vec<_> = results
                    .iter()
                    .map(|(location, r)| {
                        json!({
                            "location": location,
                            "record": r.record,
                            "state": r.state,
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    ConsoleFormatter::format_json(&json!({
                        "coordinations": runs,
                        "store": self.store.snapshot().await,
                    }))
                );
            }
            OutputFormat::Text if results.is_empty() => {
                println!("No location has more than one active decision.");
            }
            OutputFormat::Text => {}
        }
        Ok(())
    }

    fn coordinator(&self, mode: ApprovalMode) -> CoordinateUseCase {
        let approver: Option<Arc<dyn HumanApprovalPort>> = match mode {
            ApprovalMode::Interactive => Some(Arc::new(InteractiveHumanApproval::default())),
            ApprovalMode::AutoApprove => Some(Arc::new(AutoApproveEscalations)),
            ApprovalMode::AutoReject => Some(Arc::new(AutoRejectEscalations)),
            ApprovalMode::None => None,
        };

        let mut coordinator = CoordinateUseCase::new(
            self.store.clone(),
            self.oracle.clone(),
            self.config.coordination_params(),
        )
        .with_audit_logger(self.audit.clone())
        .with_progress(self.coordination_progress.clone())
        .with_cancellation(self.token.clone());
        if let Some(approver) = approver {
            coordinator = coordinator.with_approver(approver);
        }
        coordinator
    }

    /// Batch runs report their decisions inside the final JSON document.
    fn print_batch_decision(&self, output: &DecideOutput) {
        if self.format == OutputFormat::Text {
            self.print_decision(output);
        }
    }

    fn print_decision(&self, output: &DecideOutput) {
        match self.format {
            OutputFormat::Text => println!("{}", ConsoleFormatter::format_decision(output)),
            OutputFormat::Json => println!(
                "{}",
                ConsoleFormatter::format_json(&json!({
                    "decision": output.decision,
                    "state": output.state,
                }))
            ),
        }
    }
}
