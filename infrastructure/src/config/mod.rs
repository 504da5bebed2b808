//! Configuration file loading for civic-quorum
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CIVIC_` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./civic.toml` or `./.civic.toml`
//! 4. Global config: `<config dir>/civic-quorum/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfidenceConfig, FileConfig, FileCoordinationConfig,
    FileDataConfig, FileLoggingConfig, FileOracleConfig, FileOutputConfig, FileOutputFormat,
    FilePipelineConfig,
};
pub use loader::ConfigLoader;
