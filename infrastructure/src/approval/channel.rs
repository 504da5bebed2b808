//! Out-of-band human approval.
//!
//! Escalations are parked in a registry until someone calls
//! [`ChannelHumanApproval::submit`] with a verdict, for example from a web
//! handler or a chat bot. New escalations can be observed through
//! [`ChannelHumanApproval::subscribe`].

use async_trait::async_trait;
use civic_application::{HumanApprovalError, HumanApprovalPort};
use civic_domain::{EscalationRecord, HumanVerdict};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Default)]
pub struct ChannelHumanApproval {
    pending: Mutex<HashMap<Uuid, oneshot::Sender<HumanVerdict>>>,
    watchers: Mutex<Vec<mpsc::UnboundedSender<EscalationRecord>>>,
}

impl ChannelHumanApproval {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every escalation as it starts waiting.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<EscalationRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut watchers) = self.watchers.lock() {
            watchers.push(tx);
        }
        rx
    }

    /// Escalations still waiting for a verdict.
    pub fn pending(&self) -> Vec<Uuid> {
        self.pending
            .lock()
            .map(|p| p.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Deliver a verdict for a waiting escalation.
    pub fn submit(&self, escalation_id: Uuid, verdict: HumanVerdict) -> Result<(), HumanApprovalError> {
        let sender = self
            .pending
            .lock()
            .map_err(|_| HumanApprovalError::Unavailable("approval registry poisoned".to_string()))?
            .remove(&escalation_id)
            .ok_or_else(|| {
                HumanApprovalError::InvalidInput(format!(
                    "no escalation {} is waiting",
                    escalation_id
                ))
            })?;

        info!(%escalation_id, approver = %verdict.approver, decision = %verdict.decision, "Verdict submitted");
        sender
            .send(verdict)
            .map_err(|_| HumanApprovalError::Unavailable("escalation is no longer waiting".to_string()))
    }

    fn notify(&self, escalation: &EscalationRecord) {
        if let Ok(mut watchers) = self.watchers.lock() {
            watchers.retain(|w| w.send(escalation.clone()).is_ok());
        }
    }
}

/// Removes a registry entry when the wait ends, including when the caller
/// drops the future on timeout.
struct PendingGuard<'a> {
    pending: &'a Mutex<HashMap<Uuid, oneshot::Sender<HumanVerdict>>>,
    escalation_id: Uuid,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&self.escalation_id);
        }
    }
}

#[async_trait]
impl HumanApprovalPort for ChannelHumanApproval {
    async fn request_decision(
        &self,
        escalation: &EscalationRecord,
    ) -> Result<HumanVerdict, HumanApprovalError> {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .map_err(|_| HumanApprovalError::Unavailable("approval registry poisoned".to_string()))?
            .insert(escalation.escalation_id, tx);
        self.notify(escalation);

        let _guard = PendingGuard {
            pending: &self.pending,
            escalation_id: escalation.escalation_id,
        };
        rx.await.map_err(|_| {
            warn!(escalation_id = %escalation.escalation_id, "Approval channel closed");
            HumanApprovalError::Cancelled
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use civic_domain::ResolutionDecision;
    use std::sync::Arc;

    fn escalation() -> EscalationRecord {
        let now = Utc::now();
        EscalationRecord {
            escalation_id: Uuid::new_v4(),
            coordination_id: Uuid::new_v4(),
            reason: "Total cost exceeds auto-approval limit".to_string(),
            conflicts: Vec::new(),
            proposed_resolutions: Vec::new(),
            total_cost: 250_000.0,
            created_at: now,
            deadline: now + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_submit_delivers_verdict() {
        let approval = Arc::new(ChannelHumanApproval::new());
        let mut events = approval.subscribe();
        let record = escalation();

        let waiter = {
            let approval = approval.clone();
            let record = record.clone();
            tokio::spawn(async move { approval.request_decision(&record).await })
        };

        let seen = events.recv().await.unwrap();
        assert_eq!(seen.escalation_id, record.escalation_id);
        assert_eq!(approval.pending(), vec![record.escalation_id]);

        approval
            .submit(
                record.escalation_id,
                HumanVerdict::new(ResolutionDecision::Defer, "ops-lead", "wait for budget"),
            )
            .unwrap();

        let verdict = waiter.await.unwrap().unwrap();
        assert_eq!(verdict.decision, ResolutionDecision::Defer);
        assert!(approval.pending().is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_wait_is_cleared() {
        let approval = ChannelHumanApproval::new();
        let record = escalation();

        let wait = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            approval.request_decision(&record),
        )
        .await;

        assert!(wait.is_err());
        assert!(approval.pending().is_empty());
    }

    #[test]
    fn test_submit_unknown_escalation() {
        let approval = ChannelHumanApproval::new();
        let err = approval
            .submit(
                Uuid::new_v4(),
                HumanVerdict::new(ResolutionDecision::ApproveAll, "x", ""),
            )
            .unwrap_err();
        assert!(matches!(err, HumanApprovalError::InvalidInput(_)));
    }
}
