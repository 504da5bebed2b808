//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`PipelineParams`]: department pipeline control (retries, thresholds, checkpoint)
//! - [`CoordinationParams`]: conflict lookback, budget ceiling, human gate
//! - [`OracleParams`]: reasoning oracle timeout and sampling

pub mod coordination_params;
pub mod oracle_params;
pub mod pipeline_params;

pub use coordination_params::CoordinationParams;
pub use oracle_params::OracleParams;
pub use pipeline_params::PipelineParams;
