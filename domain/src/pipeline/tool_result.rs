//! Results of tool execution.

use crate::core::facts::Facts;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status reported by a data-access tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Available,
    Operational,
    WithinLimits,
    Success,
    Error,
    #[default]
    Unknown,
}

impl ToolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::Available => "available",
            ToolStatus::Operational => "operational",
            ToolStatus::WithinLimits => "within_limits",
            ToolStatus::Success => "success",
            ToolStatus::Error => "error",
            ToolStatus::Unknown => "unknown",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ToolStatus::Available
                | ToolStatus::Operational
                | ToolStatus::WithinLimits
                | ToolStatus::Success
        )
    }
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool: String,
    pub status: ToolStatus,
    #[serde(default)]
    pub fields: Facts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn new(tool: impl Into<String>, status: ToolStatus) -> Self {
        Self {
            tool: tool.into(),
            status,
            fields: Facts::new(),
            error: None,
        }
    }

    /// A failed invocation. Data-access errors become results, never aborts.
    pub fn error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            status: ToolStatus::Error,
            fields: Facts::new(),
            error: Some(message.into()),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_success() {
        assert!(ToolStatus::Available.is_success());
        assert!(ToolStatus::WithinLimits.is_success());
        assert!(!ToolStatus::Error.is_success());
        assert!(!ToolStatus::Unknown.is_success());
    }

    #[test]
    fn test_error_result() {
        let result = ToolResult::error("check_budget", "ledger offline");
        assert!(!result.is_success());
        assert_eq!(result.error.as_deref(), Some("ledger offline"));
        assert!(result.fields.is_empty());
    }

    #[test]
    fn test_status_serde() {
        let result = ToolResult::new("check_pressure", ToolStatus::WithinLimits)
            .with_field("water_pressure_psi", 55);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "within_limits");
        assert_eq!(json["fields"]["water_pressure_psi"], 55);
        assert!(json.get("error").is_none());
    }
}
