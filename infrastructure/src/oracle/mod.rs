//! Reasoning oracle adapters

mod http;
mod offline;

pub use http::HttpReasoningOracle;
pub use offline::OfflineOracle;

use crate::config::FileOracleConfig;
use civic_application::ReasoningOracle;
use std::sync::Arc;

/// Build the oracle described by `[oracle]`, or `None` when no endpoint is set.
pub fn oracle_from_config(config: &FileOracleConfig) -> Option<Arc<dyn ReasoningOracle>> {
    config.endpoint.as_ref().map(|endpoint| {
        Arc::new(
            HttpReasoningOracle::new(endpoint.as_str(), config.model.as_str())
                .with_api_key(config.api_key()),
        ) as Arc<dyn ReasoningOracle>
    })
}
