//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod confidence;
mod coordination;
mod data;
mod logging;
mod oracle;
mod output;
mod pipeline;

pub use confidence::FileConfidenceConfig;
pub use coordination::FileCoordinationConfig;
pub use data::FileDataConfig;
pub use logging::FileLoggingConfig;
pub use oracle::FileOracleConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use pipeline::FilePipelineConfig;

use civic_application::{CoordinationParams, PipelineParams};
use civic_domain::Department;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("{0} cannot be 0")]
    InvalidTimeout(&'static str),

    #[error("pipeline.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("pipeline.confidence_threshold must be between 0 and 1, got {0}")]
    ThresholdOutOfRange(f64),

    #[error("{0} cannot be negative")]
    NegativeAmount(&'static str),

    #[error("coordination.conflict_lookback_hours must be positive, got {0}")]
    InvalidLookback(i64),

    #[error("coordination.monsoon.months contains {0}, expected 1-12")]
    InvalidMonth(u32),

    #[error("oracle.model cannot be empty when an endpoint is set")]
    EmptyModelName,

    #[error("oracle.temperature must be between 0 and 2, got {0}")]
    TemperatureOutOfRange(f32),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Department pipeline settings
    pub pipeline: FilePipelineConfig,
    /// Conflict detection and resolution settings
    pub coordination: FileCoordinationConfig,
    /// Reasoning oracle endpoint and sampling
    pub oracle: FileOracleConfig,
    pub confidence: FileConfidenceConfig,
    /// Department data source
    pub data: FileDataConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Audit and tracing log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration.
    ///
    /// Sections are checked in file order and the first problem is returned.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.pipeline.validate()?;
        self.coordination.validate()?;
        self.oracle.validate()?;
        Ok(())
    }

    /// Pipeline parameters for one department.
    pub fn pipeline_params(&self, department: Department) -> PipelineParams {
        let base = PipelineParams::default()
            .with_oracle(self.oracle.to_params())
            .with_confidence_weights(self.confidence.weights_for(department));
        self.pipeline.apply(base)
    }

    pub fn coordination_params(&self) -> CoordinationParams {
        let base = CoordinationParams::default()
            .with_oracle(self.oracle.to_params())
            .with_auto_approval_cost_limit(self.pipeline.auto_approval_cost_limit);
        self.coordination.apply(base)
    }
}
