//! Console output formatter for decisions, conflict checks and coordination runs

use civic_application::{CoordinationResult, DecideOutput};
use civic_domain::{
    ConflictCheckResult, ConflictSeverity, FinalDecision, ResolutionDecision, truncate,
};
use colored::{ColoredString, Colorize};
use serde::Serialize;

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format one department decision with its pipeline trace
    pub fn format_decision(output: &DecideOutput) -> String {
        let decision = &output.decision;
        let state = &output.state;
        let mut out = String::new();

        out.push_str(&Self::header(&format!(
            "{} Decision",
            decision.department.display_name()
        )));
        out.push('\n');

        let request = &decision.request_snapshot;
        out.push_str(&format!(
            "{} {} at {} ({} priority, cost {:.2})\n",
            "Request:".cyan().bold(),
            request.kind,
            request.location,
            request.priority,
            request.estimated_cost
        ));
        if let Some(intent) = &state.intent {
            out.push_str(&format!(
                "{} {} / risk {}\n",
                "Intent:".cyan().bold(),
                intent,
                state.risk_level.map(|r| r.as_str()).unwrap_or("unknown")
            ));
        }

        if let Some(plan) = &decision.plan_snapshot {
            out.push_str(&Self::section_header("Plan"));
            out.push_str(&format!(
                "{} ({}), attempt {} of {}\n",
                plan.name.yellow().bold(),
                plan.source,
                state.plans_tried(),
                state.max_attempts
            ));
            for step in &plan.steps {
                let status = match state.tool_results.get(&step.tool) {
                    Some(r) if r.is_success() => "v".green(),
                    Some(_) => "x".red(),
                    None => "-".dimmed(),
                };
                out.push_str(&format!("  {} {}\n", status, step.tool));
            }
        }

        if let Some(check) = &state.coordination_check
            && check.has_conflicts
        {
            out.push_str(&Self::section_header("Coordination"));
            out.push_str(&Self::format_conflict_lines(check));
        }
        if state.coordination_degraded {
            out.push_str(&format!(
                "\n{} coordination checkpoint unavailable, continued without it\n",
                "!".yellow()
            ));
        }

        out.push_str(&Self::section_header("Checks"));
        out.push_str(&format!(
            "Feasible: {}  {}\n",
            Self::yes_no(decision.feasible),
            state.feasibility_reason.dimmed()
        ));
        let policy = if decision.policy_evaluated {
            Self::yes_no(decision.policy_compliant)
        } else {
            "not evaluated".dimmed()
        };
        out.push_str(&format!("Policy:   {}\n", policy));
        for v in &state.policy_violations {
            out.push_str(&format!("  └─ {}\n", v));
        }

        out.push_str(&Self::section_header("Confidence"));
        out.push_str(&format!("{:.2}\n", decision.confidence));
        for (factor, value) in &decision.confidence_factors {
            out.push_str(&format!("  {:<12} {:+.2}\n", factor, value));
        }

        out.push_str(&format!(
            "\n{} {}\n{}\n",
            "Outcome:".bold(),
            Self::final_label(decision.final_decision),
            decision.reasoning
        ));
        if !state.notes.is_empty() {
            out.push_str(&format!("\n{}\n", "Notes:".dimmed()));
            for note in &state.notes {
                out.push_str(&format!("  * {}\n", note.dimmed()));
            }
        }
        out.push_str(&Self::footer());
        out
    }

    /// Format a conflict check
    pub fn format_check(result: &ConflictCheckResult) -> String {
        let mut out = Self::header("Conflict Check");
        out.push('\n');
        if !result.has_conflicts {
            out.push_str(&format!("{}\n", "No conflicts. Safe to proceed.".green()));
            out.push_str(&Self::footer());
            return out;
        }
        out.push_str(&Self::format_conflict_lines(result));
        out.push_str(&format!(
            "\nProceed: {}  Human review: {}\n",
            Self::yes_no(result.should_proceed),
            Self::yes_no(result.requires_human)
        ));
        if !result.recommendations.is_empty() {
            out.push_str(&format!("\n{}\n", "Recommendations:".cyan().bold()));
            for rec in &result.recommendations {
                out.push_str(&format!("  * {}\n", rec));
            }
        }
        out.push_str(&Self::footer());
        out
    }

    /// Format one coordination run
    pub fn format_coordination(result: &CoordinationResult) -> String {
        let state = &result.state;
        let record = &result.record;
        let mut out = Self::header("Coordination");
        out.push('\n');

        out.push_str(&format!(
            "{} {}\n",
            "Departments:".cyan().bold(),
            record
                .departments
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        if !state.conflicts_detected.is_empty() {
            out.push_str(&Self::section_header("Conflicts"));
            for c in &state.conflicts_detected {
                out.push_str(&format!(
                    "  [{}] {}: {}\n",
                    Self::severity_label(c.severity),
                    c.conflict_type,
                    truncate(&c.description, 100)
                ));
            }
        }

        if !state.resolutions.is_empty() {
            out.push_str(&Self::section_header("Resolutions"));
            for r in &state.resolutions {
                out.push_str(&format!(
                    "  {} via {} ({:.2}): {}\n",
                    r.decision.as_str().yellow(),
                    r.method,
                    r.confidence,
                    truncate(&r.rationale, 100)
                ));
            }
        }

        if let Some(verdict) = &state.human_verdict {
            out.push_str(&format!(
                "\n{} {} by {}: {}\n",
                "Human verdict:".magenta().bold(),
                verdict.decision,
                verdict.approver,
                verdict.rationale
            ));
        }

        out.push_str(&format!(
            "\n{} {}\n",
            "Outcome:".bold(),
            Self::resolution_label(record.final_decision, record.unresolved)
        ));
        if !record.execution_plan.approved.is_empty() {
            out.push_str(&format!(
                "  {} {}\n",
                "go:".green(),
                record.execution_plan.approved.join(", ")
            ));
        }
        if !record.execution_plan.deferred.is_empty() {
            out.push_str(&format!(
                "  {} {}\n",
                "wait:".yellow(),
                record.execution_plan.deferred.join(", ")
            ));
        }

        out.push_str(&format!("\n{}\n", "Workflow:".dimmed()));
        for entry in &state.workflow_log {
            out.push_str(&format!(
                "  {} {:<20} {}\n",
                entry.at.format("%H:%M:%S%.3f").to_string().dimmed(),
                entry.stage.display_name(),
                entry.message
            ));
        }
        out.push_str(&Self::footer());
        out
    }

    /// Pretty JSON for any serializable result
    pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_conflict_lines(result: &ConflictCheckResult) -> String {
        result
            .conflicts
            .iter()
            .map(|c| {
                format!(
                    "  [{}] {} with {}\n    └─ {}\n",
                    Self::severity_label(c.severity),
                    c.conflict_type,
                    c.agents_involved
                        .iter()
                        .map(|d| d.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    truncate(&c.description, 100).dimmed()
                )
            })
            .collect()
    }

    fn final_label(decision: FinalDecision) -> ColoredString {
        match decision {
            FinalDecision::Approve => "APPROVE".green().bold(),
            FinalDecision::Escalate => "ESCALATE".yellow().bold(),
            FinalDecision::Reject => "REJECT".red().bold(),
        }
    }

    fn resolution_label(decision: ResolutionDecision, unresolved: bool) -> ColoredString {
        if unresolved {
            return "UNRESOLVED (awaiting human)".red().bold();
        }
        match decision {
            ResolutionDecision::ApproveAll => "APPROVE ALL".green().bold(),
            ResolutionDecision::ApprovePartial => "APPROVE PARTIAL".green(),
            ResolutionDecision::Defer => "DEFER".yellow(),
            ResolutionDecision::Escalate => "ESCALATE".yellow().bold(),
            ResolutionDecision::Reject => "REJECT".red().bold(),
        }
    }

    fn severity_label(severity: ConflictSeverity) -> ColoredString {
        match severity {
            ConflictSeverity::High => "high".red().bold(),
            ConflictSeverity::Medium => "medium".yellow(),
            ConflictSeverity::Low => "low".normal(),
        }
    }

    fn yes_no(value: bool) -> ColoredString {
        if value { "yes".green() } else { "no".red() }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
