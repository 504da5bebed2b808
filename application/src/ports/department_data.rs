//! Department data access port
//!
//! Each department pipeline reads its operational context and runs its
//! data-fetch tools through a [`DepartmentDataPort`]. What sits behind it
//! (a database, a fixture file) is an infrastructure concern.

use async_trait::async_trait;
use civic_domain::{Department, Facts, ToolResult};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataAccessError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),
}

/// Read access to one department's operational data.
#[async_trait]
pub trait DepartmentDataPort: Send + Sync {
    /// Department this port serves
    fn department(&self) -> Department;

    /// Standing facts about `location` (crew rosters, budgets, ...)
    async fn fetch_context(&self, location: &str) -> Result<Facts, DataAccessError>;

    /// Run one named data-fetch tool
    async fn execute_tool(&self, name: &str, args: &Value) -> Result<ToolResult, DataAccessError>;
}
