//! Reasoning oracle port
//!
//! Defines the interface for the external text-completion service used by
//! the planner, the observer and the negotiation engine. Every caller treats
//! the answer as untrusted text and has a deterministic fallback.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::OracleParams;

/// Errors that can occur during an oracle call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// One prompt sent to the oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl OracleRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, params: &OracleParams) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            timeout: params.timeout,
        }
    }
}

/// Gateway to the reasoning oracle.
///
/// Implementations (adapters) live in the infrastructure layer. Callers wrap
/// every call in their own timeout, so adapters need not enforce
/// [`OracleRequest::timeout`] themselves.
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    /// Send the prompt and return the raw completion text.
    async fn complete(&self, request: &OracleRequest) -> Result<String, OracleError>;

    /// Short label for logs.
    fn name(&self) -> &str {
        "oracle"
    }
}
