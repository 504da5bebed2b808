//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
///
/// # Example
///
/// ```toml
/// [logging]
/// audit_log = "~/.local/share/civic-quorum/audit.jsonl"
/// log_dir = "~/.local/share/civic-quorum/logs"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving structured audit events
    pub audit_log: Option<PathBuf>,
    /// Directory for daily-rolling tracing logs
    pub log_dir: Option<PathBuf>,
}

impl FileLoggingConfig {
    pub fn audit_log_path(&self) -> Option<PathBuf> {
        self.audit_log.as_deref().map(expand_home)
    }

    pub fn log_dir_path(&self) -> Option<PathBuf> {
        self.log_dir.as_deref().map(expand_home)
    }
}

/// Replace a leading `~` with the home directory.
fn expand_home(path: &std::path::Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
