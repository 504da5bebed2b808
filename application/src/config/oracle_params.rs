//! Reasoning oracle call parameters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters applied to every oracle call a use case makes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleParams {
    /// Upper bound on a single oracle call. Expiry counts as a parse failure.
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

impl OracleParams {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
