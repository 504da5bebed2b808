//! Department data served from a TOML fixture file.
//!
//! A fixture file describes, per department, the standing context at each
//! location and the canned reading each tool returns. It may also list
//! requests for the `simulate` command.
//!
//! ```toml
//! [departments.water.context."*"]
//! budget_available = 500000
//!
//! [departments.water.context."ward-3"]
//! pressure_psi = 38
//!
//! [departments.water.tools.check_crew_availability]
//! status = "available"
//! crews_available = 3
//!
//! [departments.water.tools.check_crew_availability.locations."ward-7"]
//! crews_available = 0
//!
//! [[requests]]
//! requester_id = "ward-3-office"
//! department = "water"
//! kind = "pipe_burst"
//! location = "ward-3"
//! ```

use async_trait::async_trait;
use civic_application::{DataAccessError, DepartmentDataPort};
use civic_domain::{Department, Facts, Request, ToolResult, ToolStatus};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Context key that applies to every location.
const ANY_LOCATION: &str = "*";

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read fixture file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid fixture file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Canned output of one tool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ToolFixture {
    status: ToolStatus,
    /// Reported as a data-access failure instead of a reading
    error: Option<String>,
    /// Per-location overrides, matched on the `location` argument
    locations: BTreeMap<String, Facts>,
    #[serde(flatten)]
    fields: Facts,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct DepartmentFixture {
    /// The department's data source is down
    unavailable: bool,
    context: BTreeMap<String, Facts>,
    tools: BTreeMap<String, ToolFixture>,
}

/// Parsed contents of a fixture file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixtureSet {
    departments: BTreeMap<Department, DepartmentFixture>,
    pub requests: Vec<Request>,
}

impl FixtureSet {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let text = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| FixtureError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Departments the file describes.
    pub fn departments(&self) -> impl Iterator<Item = Department> + '_ {
        self.departments.keys().copied()
    }

    /// A data port for `department`. Departments the file does not describe
    /// get an empty context and no tools.
    pub fn data_port(&self, department: Department) -> FixtureDataAccess {
        FixtureDataAccess {
            department,
            fixture: Arc::new(self.departments.get(&department).cloned().unwrap_or_default()),
        }
    }
}

/// [`DepartmentDataPort`] backed by one department's fixture.
#[derive(Debug, Clone)]
pub struct FixtureDataAccess {
    department: Department,
    fixture: Arc<DepartmentFixture>,
}

impl FixtureDataAccess {
    fn check_available(&self) -> Result<(), DataAccessError> {
        if self.fixture.unavailable {
            return Err(DataAccessError::Unavailable(format!(
                "{} data source is offline",
                self.department
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DepartmentDataPort for FixtureDataAccess {
    fn department(&self) -> Department {
        self.department
    }

    async fn fetch_context(&self, location: &str) -> Result<Facts, DataAccessError> {
        self.check_available()?;
        let mut facts = Facts::new();
        for key in [ANY_LOCATION, location] {
            if let Some(entries) = self.fixture.context.get(key) {
                facts.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        Ok(facts)
    }

    async fn execute_tool(&self, name: &str, args: &Value) -> Result<ToolResult, DataAccessError> {
        self.check_available()?;
        let tool = self
            .fixture
            .tools
            .get(name)
            .ok_or_else(|| DataAccessError::UnknownTool(name.to_string()))?;

        if let Some(message) = &tool.error {
            return Err(DataAccessError::Query(message.clone()));
        }

        let mut result = ToolResult::new(name, tool.status);
        result.fields = tool.fields.clone();
        if let Some(overrides) = args
            .get("location")
            .and_then(Value::as_str)
            .and_then(|loc| tool.locations.get(loc))
        {
            result.fields.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        debug!(department = %self.department, tool = name, status = %result.status, "Fixture tool served");
        Ok(result)
    }
}
