//! Reasoning oracle configuration from TOML (`[oracle]` section)

use super::ConfigValidationError;
use civic_application::OracleParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw oracle configuration from TOML
///
/// Leaving `endpoint` unset runs every department on its rule templates.
///
/// # Example
///
/// ```toml
/// [oracle]
/// endpoint = "http://localhost:11434/v1"
/// model = "llama3.1"
/// api_key_env = "CIVIC_ORACLE_API_KEY"
/// timeout_seconds = 30
/// temperature = 0.2
/// max_tokens = 1024
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOracleConfig {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: Option<String>,
    pub model: String,
    /// Environment variable holding the bearer token
    pub api_key_env: Option<String>,
    pub timeout_seconds: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for FileOracleConfig {
    fn default() -> Self {
        let params = OracleParams::default();
        Self {
            endpoint: None,
            model: "gpt-4o-mini".to_string(),
            api_key_env: None,
            timeout_seconds: params.timeout.as_secs(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        }
    }
}

impl FileOracleConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout("oracle.timeout_seconds"));
        }
        if self.endpoint.is_some() && self.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigValidationError::TemperatureOutOfRange(self.temperature));
        }
        Ok(())
    }

    pub fn to_params(&self) -> OracleParams {
        OracleParams::default()
            .with_timeout(Duration::from_secs(self.timeout_seconds))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }

    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_defaults_are_offline() {
        let config = FileOracleConfig::default();
        assert!(config.endpoint.is_none());
        assert_eq!(config.to_params().timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_model_with_endpoint_rejected() {
        let config = FileOracleConfig {
            endpoint: Some("http://localhost:8080/v1".to_string()),
            model: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::EmptyModelName)
        ));
    }
}
