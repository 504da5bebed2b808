//! Progress reporting for department pipelines and coordination runs

use civic_application::{CoordinationProgressNotifier, PipelineProgressNotifier};
use civic_domain::{
    ConflictCheckResult, CoordinationStage, Decision, Department, EscalationRecord, FinalDecision,
    PipelineStage, Plan, Resolution, ToolResult,
};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress with one spinner per department and one for coordination
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<Department, ProgressBar>>,
    coordination_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            coordination_bar: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn new_spinner(&self, prefix: String) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix(prefix);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Run `f` on the department's spinner, creating it on first use
    fn with_bar(&self, department: Department, f: impl FnOnce(&ProgressBar)) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let pb = bars
            .entry(department)
            .or_insert_with(|| self.new_spinner(format!("{:<12}", department.display_name())));
        f(pb);
    }

    fn with_coordination_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let Ok(mut slot) = self.coordination_bar.lock() else {
            return;
        };
        let pb = slot.get_or_insert_with(|| self.new_spinner(format!("{:<12}", "Coordination")));
        f(pb);
    }

    fn outcome(decision: FinalDecision) -> colored::ColoredString {
        match decision {
            FinalDecision::Approve => "approved".green(),
            FinalDecision::Escalate => "escalated".yellow(),
            FinalDecision::Reject => "rejected".red(),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineProgressNotifier for ProgressReporter {
    fn on_stage_change(&self, department: Department, stage: PipelineStage) {
        self.with_bar(department, |pb| pb.set_message(stage.display_name()));
    }

    fn on_tool_result(&self, department: Department, result: &ToolResult) {
        let mark = if result.is_success() {
            "v".green()
        } else {
            "x".red()
        };
        self.with_bar(department, |pb| {
            pb.set_message(format!("{} {}", mark, result.tool))
        });
    }

    fn on_retry(&self, department: Department, attempt: u32, plan: &Plan) {
        self.with_bar(department, |pb| {
            pb.println(format!(
                "  {} {} trying {} (attempt {})",
                "↻".yellow(),
                department,
                plan.name,
                attempt + 1
            ))
        });
    }

    fn on_checkpoint_degraded(&self, department: Department, error: &str) {
        self.with_bar(department, |pb| {
            pb.println(format!(
                "  {} {} coordination check skipped: {}",
                "!".yellow(),
                department,
                error
            ))
        });
    }

    fn on_decision(&self, decision: &Decision) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        if let Some(pb) = bars.remove(&decision.department) {
            pb.finish_with_message(format!(
                "{} ({:.2})",
                Self::outcome(decision.final_decision),
                decision.confidence
            ));
        }
    }
}

impl CoordinationProgressNotifier for ProgressReporter {
    fn on_stage_change(&self, stage: CoordinationStage) {
        if stage == CoordinationStage::Finalize {
            if let Ok(mut slot) = self.coordination_bar.lock()
                && let Some(pb) = slot.take()
            {
                pb.finish_with_message("done".green().to_string());
            }
            return;
        }
        self.with_coordination_bar(|pb| pb.set_message(stage.display_name()));
    }

    fn on_conflicts_detected(&self, count: usize) {
        self.with_coordination_bar(|pb| pb.set_message(format!("{} conflict(s)", count)));
    }

    fn on_resolution(&self, resolution: &Resolution) {
        self.with_coordination_bar(|pb| {
            pb.set_message(format!("{} via {}", resolution.decision, resolution.method))
        });
    }

    fn on_human_wait(&self, _escalation: &EscalationRecord) {
        // The approval prompt owns the terminal while it waits
        if let Ok(mut slot) = self.coordination_bar.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_and_clear();
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl PipelineProgressNotifier for SimpleProgress {
    fn on_stage_change(&self, department: Department, stage: PipelineStage) {
        if stage == PipelineStage::Initialized {
            println!("{} {}", "->".cyan(), department.display_name().bold());
        }
    }

    fn on_tool_result(&self, department: Department, result: &ToolResult) {
        if result.is_success() {
            println!("  {} {} {}", "v".green(), department, result.tool);
        } else {
            println!(
                "  {} {} {} ({})",
                "x".red(),
                department,
                result.tool,
                result.error.as_deref().unwrap_or("failed")
            );
        }
    }

    fn on_retry(&self, department: Department, attempt: u32, plan: &Plan) {
        println!(
            "  {} {} retrying with {} (attempt {})",
            "↻".yellow(),
            department,
            plan.name,
            attempt + 1
        );
    }

    fn on_checkpoint(&self, department: Department, result: &ConflictCheckResult) {
        if result.has_conflicts {
            println!(
                "  {} {} {} conflict(s) at checkpoint",
                "!".yellow(),
                department,
                result.conflicts.len()
            );
        }
    }

    fn on_checkpoint_degraded(&self, department: Department, error: &str) {
        println!(
            "  {} {} coordination check skipped: {}",
            "!".yellow(),
            department,
            error
        );
    }

    fn on_escalation(&self, department: Department, reason: &str) {
        println!("  {} {} escalating: {}", "^".yellow(), department, reason);
    }

    fn on_decision(&self, decision: &Decision) {
        println!(
            "  {} {} {}",
            "=".cyan(),
            decision.department,
            ProgressReporter::outcome(decision.final_decision)
        );
    }
}

impl CoordinationProgressNotifier for SimpleProgress {
    fn on_stage_change(&self, stage: CoordinationStage) {
        println!("{} {}", "->".cyan(), stage.display_name().bold());
    }

    fn on_conflicts_detected(&self, count: usize) {
        println!("  {} conflict(s) detected", count);
    }

    fn on_resolution(&self, resolution: &Resolution) {
        println!(
            "  {} {} via {} ({:.2})",
            "v".green(),
            resolution.decision,
            resolution.method,
            resolution.confidence
        );
    }
}
