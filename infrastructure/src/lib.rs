//! Infrastructure layer for civic-quorum
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod approval;
pub mod config;
pub mod data;
pub mod logging;
pub mod oracle;
pub mod store;

// Re-export commonly used types
pub use approval::ChannelHumanApproval;
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileCoordinationConfig, FileOracleConfig,
    FileOutputConfig, FileOutputFormat, FilePipelineConfig,
};
pub use data::{FixtureDataAccess, FixtureError, FixtureSet};
pub use logging::JsonlAuditLogger;
pub use oracle::{HttpReasoningOracle, OfflineOracle, oracle_from_config};
pub use store::{AuditSnapshot, InMemoryAuditStore};
