//! Human-in-the-Loop gate for the Coordinate use case.

use super::CoordinateUseCase;
use super::types::HumanWait;
use crate::ports::audit_logger::AuditEvent;
use crate::ports::human_approval::HumanApprovalError;
use civic_domain::{CoordinationState, EscalationRecord};
use serde_json::json;
use tracing::{info, warn};

impl CoordinateUseCase {
    /// Whether the run must go to a person before it can finalize.
    pub(super) fn needs_human(&self, state: &CoordinationState) -> Option<String> {
        let flagged: Vec<String> = state
            .resolutions
            .iter()
            .filter(|r| r.requires_human)
            .map(|r| r.conflict_id.to_string())
            .collect();
        if !flagged.is_empty() {
            return Some(format!(
                "{} resolution(s) require human review",
                flagged.len()
            ));
        }

        let total = state.total_cost();
        if total > self.params.auto_approval_cost_limit {
            return Some(format!(
                "Total cost {:.2} exceeds auto-approval limit {:.2}",
                total, self.params.auto_approval_cost_limit
            ));
        }
        None
    }

    /// Persist the escalation, ask the approver and wait.
    ///
    /// The wait ends on the first of: a verdict, the human response timeout,
    /// or cancellation. Anything but a verdict leaves the run unresolved.
    pub(super) async fn escalate_to_human(&self, state: &mut CoordinationState, reason: String) {
        let timeout = self.params.human_response_timeout;
        let deadline = chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::days(1));
        let escalation = EscalationRecord::new(state, reason.clone(), deadline);

        if let Err(e) = self.store.insert_escalation(&escalation).await {
            warn!(escalation_id = %escalation.escalation_id, "Failed to persist escalation: {}", e);
        }
        self.audit_logger.log(AuditEvent::new(
            "escalation_created",
            json!({
                "escalation_id": escalation.escalation_id,
                "coordination_id": escalation.coordination_id,
                "reason": escalation.reason,
                "total_cost": escalation.total_cost,
                "deadline": escalation.deadline,
            }),
        ));
        info!(escalation_id = %escalation.escalation_id, "Escalated to human: {}", reason);
        state.log(format!("escalated: {}", reason));
        self.progress.on_human_wait(&escalation);

        let outcome = self.wait_for_verdict(&escalation, timeout).await;
        state.escalation = Some(escalation);

        match outcome {
            HumanWait::Verdict(verdict) => {
                info!(
                    approver = %verdict.approver,
                    decision = %verdict.decision,
                    "Human verdict received"
                );
                state.log(format!(
                    "human verdict from {}: {} ({})",
                    verdict.approver, verdict.decision, verdict.rationale
                ));
                state.human_verdict = Some(verdict);
            }
            HumanWait::TimedOut => leave_unresolved(state, format!("no verdict within {:?}", timeout)),
            HumanWait::Cancelled => leave_unresolved(state, "wait cancelled".to_string()),
            HumanWait::Failed(e) => leave_unresolved(state, format!("approver failed: {}", e)),
            HumanWait::NoApprover => leave_unresolved(state, "no approver configured".to_string()),
        }
    }

    async fn wait_for_verdict(
        &self,
        escalation: &EscalationRecord,
        timeout: std::time::Duration,
    ) -> HumanWait {
        let Some(approver) = &self.approver else {
            return HumanWait::NoApprover;
        };
        let token = self.cancellation_token.clone();
        let cancelled = async move {
            match token {
                Some(token) => token.cancelled_owned().await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = approver.request_decision(escalation) => match result {
                Ok(verdict) => HumanWait::Verdict(verdict),
                Err(HumanApprovalError::Cancelled) => HumanWait::Cancelled,
                Err(e) => HumanWait::Failed(e.to_string()),
            },
            _ = tokio::time::sleep(timeout) => HumanWait::TimedOut,
            _ = cancelled => HumanWait::Cancelled,
        }
    }
}

fn leave_unresolved(state: &mut CoordinationState, why: String) {
    warn!("Escalation left unresolved: {}", why);
    state.log(format!("unresolved: {}", why));
    state.unresolved = true;
}
