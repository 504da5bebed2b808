use async_trait::async_trait;
use civic_application::{OracleError, OracleRequest, ReasoningOracle};

/// Oracle for running without a model: every call fails with a transport
/// error, so planners use their templates and negotiation escalates.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineOracle;

#[async_trait]
impl ReasoningOracle for OfflineOracle {
    async fn complete(&self, _request: &OracleRequest) -> Result<String, OracleError> {
        Err(OracleError::Transport("oracle is offline".to_string()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_application::OracleParams;

    #[tokio::test]
    async fn test_offline_always_fails() {
        let request = OracleRequest::new("s", "u", &OracleParams::default());
        assert_eq!(
            OfflineOracle.complete(&request).await,
            Err(OracleError::Transport("oracle is offline".to_string()))
        );
    }
}
