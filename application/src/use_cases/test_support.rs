//! Scripted port implementations shared by the use-case tests.

use crate::ports::audit_logger::{AuditEvent, AuditLogger};
use crate::ports::audit_store::{ActiveDecisionQuery, AuditStore, StoreError};
use crate::ports::coordination_checkpoint::{CoordinationCheckpoint, CoordinationError};
use crate::ports::department_data::{DataAccessError, DepartmentDataPort};
use crate::ports::reasoning_oracle::{OracleError, OracleRequest, ReasoningOracle};
use async_trait::async_trait;
use civic_domain::{
    Conflict, ConflictCheckResult, ConflictQuery, CoordinationRecord, Decision, Department,
    EscalationRecord, Facts, Resolution, ToolResult,
};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Oracle that replays scripted responses in order, then fails.
pub struct ScriptedOracle {
    responses: Mutex<VecDeque<Result<String, OracleError>>>,
    delay: Option<Duration>,
    pub prompts: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new(responses: Vec<Result<String, OracleError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    async fn complete(&self, request: &OracleRequest) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Transport("no scripted response".to_string())))
    }
}

/// Department data port backed by in-test maps.
pub struct MockDataPort {
    department: Department,
    context: Option<Facts>,
    tools: BTreeMap<String, ToolResult>,
    pub calls: Mutex<Vec<String>>,
}

impl MockDataPort {
    pub fn new(department: Department) -> Self {
        Self {
            department,
            context: Some(Facts::new()),
            tools: BTreeMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context
            .get_or_insert_with(Facts::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn with_failing_context(mut self) -> Self {
        self.context = None;
        self
    }

    pub fn with_tool(mut self, result: ToolResult) -> Self {
        self.tools.insert(result.tool.clone(), result);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DepartmentDataPort for MockDataPort {
    fn department(&self) -> Department {
        self.department
    }

    async fn fetch_context(&self, _location: &str) -> Result<Facts, DataAccessError> {
        self.context
            .clone()
            .ok_or_else(|| DataAccessError::Unavailable("context offline".to_string()))
    }

    async fn execute_tool(&self, name: &str, _args: &Value) -> Result<ToolResult, DataAccessError> {
        self.calls.lock().unwrap().push(name.to_string());
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| DataAccessError::UnknownTool(name.to_string()))
    }
}

/// Audit store keeping everything in memory.
#[derive(Default)]
pub struct MemoryStore {
    pub decisions: Mutex<Vec<Decision>>,
    pub conflicts: Mutex<Vec<Conflict>>,
    pub resolutions: Mutex<Vec<Resolution>>,
    pub escalations: Mutex<Vec<EscalationRecord>>,
    pub coordinations: Mutex<Vec<CoordinationRecord>>,
    pub fail_reads: bool,
}

impl MemoryStore {
    pub fn with_decisions(decisions: Vec<Decision>) -> Self {
        Self {
            decisions: Mutex::new(decisions),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn decision_count(&self) -> usize {
        self.decisions.lock().unwrap().len()
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn insert_decision(&self, decision: &Decision) -> Result<(), StoreError> {
        self.decisions.lock().unwrap().push(decision.clone());
        Ok(())
    }

    async fn insert_conflict(&self, conflict: &Conflict) -> Result<(), StoreError> {
        self.conflicts.lock().unwrap().push(conflict.clone());
        Ok(())
    }

    async fn insert_resolution(&self, resolution: &Resolution) -> Result<(), StoreError> {
        self.resolutions.lock().unwrap().push(resolution.clone());
        Ok(())
    }

    async fn insert_escalation(&self, escalation: &EscalationRecord) -> Result<(), StoreError> {
        self.escalations.lock().unwrap().push(escalation.clone());
        Ok(())
    }

    async fn insert_coordination(&self, record: &CoordinationRecord) -> Result<(), StoreError> {
        self.coordinations.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn query_active_decisions(
        &self,
        query: &ActiveDecisionQuery,
    ) -> Result<Vec<Decision>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        Ok(self
            .decisions
            .lock()
            .unwrap()
            .iter()
            .filter(|d| query.matches(d))
            .cloned()
            .collect())
    }
}

/// Checkpoint returning a fixed answer.
pub struct FixedCheckpoint {
    answer: Result<ConflictCheckResult, CoordinationError>,
    pub queries: Mutex<Vec<ConflictQuery>>,
}

impl FixedCheckpoint {
    pub fn clear() -> Self {
        Self::answering(Ok(ConflictCheckResult::clear()))
    }

    pub fn answering(answer: Result<ConflictCheckResult, CoordinationError>) -> Self {
        Self {
            answer,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl CoordinationCheckpoint for FixedCheckpoint {
    async fn check(&self, query: &ConflictQuery) -> Result<ConflictCheckResult, CoordinationError> {
        self.queries.lock().unwrap().push(query.clone());
        self.answer.clone()
    }
}

/// Audit logger recording event types.
#[derive(Default)]
pub struct RecordingLogger {
    pub events: Mutex<Vec<(&'static str, Value)>>,
}

impl RecordingLogger {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }
}

impl AuditLogger for RecordingLogger {
    fn log(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type, event.payload));
    }
}
