//! Interactive human approval for escalated coordination runs.
//!
//! When a run needs a person, the operator sees:
//!
//! ```text
//! ═══════════════════════════════════════════════════════════════
//!   Coordination Requires Human Approval
//! ═══════════════════════════════════════════════════════════════
//!
//! Reason: Total cost 180000.00 exceeds auto-approval limit 100000.00
//! Total cost: 180000.00   Deadline: 2026-10-18 09:00 UTC
//!
//! Conflicts:
//!   [high] budget_conflict at ward-3 (water, engineering)
//!
//! Proposed:
//!   approve_partial (llm, 0.80): water first, road works follow
//!
//! civic-hil>
//! ```
//!
//! # Commands
//!
//! | Command | Aliases | Verdict |
//! |---------|---------|---------|
//! | `/approve` | `approve`, `a` | approve everyone |
//! | `/partial water,fire` | `partial`, `p` | approve the listed departments, defer the rest |
//! | `/defer` | `defer`, `d` | defer everyone |
//! | `/reject` | `reject`, `r`, `q` | reject the proposals |

use async_trait::async_trait;
use civic_application::{HumanApprovalError, HumanApprovalPort};
use civic_domain::{
    Department, EscalationRecord, ExecutionPlan, HumanVerdict, ResolutionDecision, truncate,
};
use colored::Colorize;
use std::collections::BTreeSet;
use std::io::{self, Write};
use tracing::debug;

const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// What one line of operator input means.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Verdict(ResolutionDecision, ExecutionPlan),
    Retry(String),
    Empty,
}

/// Terminal-based approver reading verdicts from stdin.
pub struct InteractiveHumanApproval {
    approver: String,
}

impl InteractiveHumanApproval {
    pub fn new(approver: impl Into<String>) -> Self {
        Self {
            approver: approver.into(),
        }
    }

    fn display_prompt(escalation: &EscalationRecord) {
        println!();
        println!("{}", RULE.yellow().bold());
        println!("{}", "  Coordination Requires Human Approval".yellow().bold());
        println!("{}", RULE.yellow().bold());
        println!();
        println!("{} {}", "Reason:".cyan().bold(), escalation.reason);
        println!(
            "{} {:.2}   {} {}",
            "Total cost:".cyan().bold(),
            escalation.total_cost,
            "Deadline:".cyan().bold(),
            escalation.deadline.format("%Y-%m-%d %H:%M UTC")
        );
        println!();

        if !escalation.conflicts.is_empty() {
            println!("{}", "Conflicts:".cyan().bold());
            for c in &escalation.conflicts {
                let agents = c
                    .agents_involved
                    .iter()
                    .map(|d| d.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "  [{}] {} at {} ({})",
                    c.severity, c.conflict_type, c.location, agents
                );
                println!("    └─ {}", truncate(&c.description, 100).dimmed());
            }
            println!();
        }

        if !escalation.proposed_resolutions.is_empty() {
            println!("{}", "Proposed:".cyan().bold());
            for r in &escalation.proposed_resolutions {
                println!(
                    "  {} ({}, {:.2}): {}",
                    r.decision,
                    r.method,
                    r.confidence,
                    truncate(&r.rationale, 100)
                );
            }
            println!();
        }

        println!("{}", "Commands:".cyan().bold());
        println!("  {}                  - Approve every department", "/approve".green());
        println!("  {} <dept,...>       - Approve listed, defer the rest", "/partial".green());
        println!("  {}                    - Defer everyone", "/defer".yellow());
        println!("  {}                   - Reject the proposals", "/reject".red());
        println!();
    }

    fn read_line() -> Result<String, HumanApprovalError> {
        print!("{} ", "civic-hil>".magenta().bold());
        io::stdout()
            .flush()
            .map_err(|e| HumanApprovalError::Io(format!("Failed to flush stdout: {}", e)))?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .map_err(|e| HumanApprovalError::Io(format!("Failed to read input: {}", e)))?;
        if read == 0 {
            return Err(HumanApprovalError::Cancelled);
        }
        Ok(input.trim().to_string())
    }

    /// Interpret one input line against the departments under escalation.
    fn parse_command(input: &str, involved: &BTreeSet<Department>) -> Command {
        let mut words = input.splitn(2, char::is_whitespace);
        let head = words.next().unwrap_or_default().to_lowercase();
        let rest = words.next().unwrap_or_default().trim();
        let everyone = || involved.iter().map(|d| d.to_string()).collect::<Vec<_>>();

        match head.trim_start_matches('/') {
            "" => Command::Empty,
            "approve" | "a" => Command::Verdict(
                ResolutionDecision::ApproveAll,
                ExecutionPlan {
                    approved: everyone(),
                    deferred: Vec::new(),
                },
            ),
            "defer" | "d" => Command::Verdict(
                ResolutionDecision::Defer,
                ExecutionPlan {
                    approved: Vec::new(),
                    deferred: everyone(),
                },
            ),
            "reject" | "r" | "q" => Command::Verdict(
                ResolutionDecision::Reject,
                ExecutionPlan {
                    approved: Vec::new(),
                    deferred: everyone(),
                },
            ),
            "partial" | "p" => {
                let mut approved = Vec::new();
                for name in rest.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    match involved.iter().find(|d| d.as_str().eq_ignore_ascii_case(name)) {
                        Some(d) => approved.push(d.to_string()),
                        None => {
                            return Command::Retry(format!(
                                "{} is not part of this escalation",
                                name
                            ));
                        }
                    }
                }
                if approved.is_empty() {
                    return Command::Retry("name at least one department to approve".to_string());
                }
                let deferred = everyone()
                    .into_iter()
                    .filter(|d| !approved.contains(d))
                    .collect();
                Command::Verdict(
                    ResolutionDecision::ApprovePartial,
                    ExecutionPlan { approved, deferred },
                )
            }
            _ => Command::Retry(format!("Unknown command: {}", input)),
        }
    }

    fn run_dialog(approver: &str, escalation: &EscalationRecord) -> Result<HumanVerdict, HumanApprovalError> {
        Self::display_prompt(escalation);
        let involved: BTreeSet<Department> = escalation
            .conflicts
            .iter()
            .flat_map(|c| c.agents_involved.iter().copied())
            .collect();

        loop {
            let input = Self::read_line()?;
            match Self::parse_command(&input, &involved) {
                Command::Empty => continue,
                Command::Retry(message) => {
                    println!("{} {}", "!".yellow(), message);
                    println!("Available commands: /approve, /partial <dept,...>, /defer, /reject");
                }
                Command::Verdict(decision, plan) => {
                    println!();
                    println!("{} {}", "✓ Verdict recorded:".green(), decision);
                    debug!(approver, %decision, approved = plan.approved.len(), "Human verdict captured");
                    return Ok(HumanVerdict::new(decision, approver, format!("operator chose {}", decision))
                        .with_execution_plan(plan));
                }
            }
        }
    }
}

impl Default for InteractiveHumanApproval {
    fn default() -> Self {
        Self::new("operator")
    }
}

#[async_trait]
impl HumanApprovalPort for InteractiveHumanApproval {
    async fn request_decision(
        &self,
        escalation: &EscalationRecord,
    ) -> Result<HumanVerdict, HumanApprovalError> {
        let approver = self.approver.clone();
        let escalation = escalation.clone();
        // stdin blocks; keep it off the async workers so the timeout can fire
        tokio::task::spawn_blocking(move || Self::run_dialog(&approver, &escalation))
            .await
            .map_err(|e| HumanApprovalError::Unavailable(format!("approval prompt failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn involved() -> BTreeSet<Department> {
        [Department::Water, Department::Engineering].into_iter().collect()
    }

    #[test]
    fn test_approve_and_reject_cover_everyone() {
        match InteractiveHumanApproval::parse_command("/approve", &involved()) {
            Command::Verdict(decision, plan) => {
                assert_eq!(decision, ResolutionDecision::ApproveAll);
                assert_eq!(plan.approved, vec!["water", "engineering"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        match InteractiveHumanApproval::parse_command("q", &involved()) {
            Command::Verdict(decision, plan) => {
                assert_eq!(decision, ResolutionDecision::Reject);
                assert!(plan.approved.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_partial_defers_the_rest() {
        match InteractiveHumanApproval::parse_command("/partial Water", &involved()) {
            Command::Verdict(decision, plan) => {
                assert_eq!(decision, ResolutionDecision::ApprovePartial);
                assert_eq!(plan.approved, vec!["water"]);
                assert_eq!(plan.deferred, vec!["engineering"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bad_input_asks_again() {
        assert!(matches!(
            InteractiveHumanApproval::parse_command("/partial fire", &involved()),
            Command::Retry(_)
        ));
        assert!(matches!(
            InteractiveHumanApproval::parse_command("/partial", &involved()),
            Command::Retry(_)
        ));
        assert!(matches!(
            InteractiveHumanApproval::parse_command("maybe", &involved()),
            Command::Retry(_)
        ));
        assert_eq!(
            InteractiveHumanApproval::parse_command("", &involved()),
            Command::Empty
        );
    }
}
