//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use civic_application::{OracleError, OracleRequest, ReasoningOracle};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reasoning oracle backed by any server speaking the OpenAI
/// `/chat/completions` protocol (OpenAI, vLLM, Ollama, llama.cpp).
#[derive(Debug, Clone)]
pub struct HttpReasoningOracle {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpReasoningOracle {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn body<'a>(&'a self, request: &'a OracleRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the first choice's text out of a completion response body.
fn parse_completion(body: &str) -> Result<String, OracleError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| OracleError::InvalidResponse(format!("malformed completion: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| OracleError::InvalidResponse("completion has no content".to_string()))
}

#[async_trait]
impl ReasoningOracle for HttpReasoningOracle {
    async fn complete(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let mut builder = self
            .client
            .post(self.endpoint())
            .timeout(request.timeout)
            .json(&self.body(request));

        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout(request.timeout)
            } else {
                OracleError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(OracleError::Transport(format!(
                "oracle returned {}: {}",
                status,
                civic_domain::truncate(&body, 200)
            )));
        }

        debug!(model = %self.model, bytes = body.len(), "Oracle completion received");
        parse_completion(&body)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
