//! Department data configuration from TOML (`[data]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where department context and tool readings come from.
///
/// ```toml
/// [data]
/// fixtures = "demos/city.toml"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDataConfig {
    /// TOML fixture file served by the fixture data adapter
    pub fixtures: Option<PathBuf>,
}
