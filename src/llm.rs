//! Abstract LLM boundary: a vendor-agnostic completion interface.
//!
//! The IAP generator depends on `Completer`, never on a vendor SDK.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, MatchResult};

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_message: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: TokenUsage,
}

#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> MatchResult<CompletionResponse>;
}

/// Production completer backed by a generic JSON chat-completion endpoint.
/// Carries a per-request timeout via `Client::builder().timeout(...)`.
pub struct ReqwestCompleter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ReqwestCompleter {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> MatchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MatchError::ExternalDependencyFailure {
                dependency: "reqwest client build".to_string(),
                detail: e.to_string(),
            })?;
        Ok(ReqwestCompleter { client, endpoint: endpoint.into(), api_key: api_key.into() })
    }
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    text: String,
    usage: ChatUsage,
}

#[derive(Deserialize)]
struct ChatUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait]
impl Completer for ReqwestCompleter {
    async fn complete(&self, request: CompletionRequest) -> MatchResult<CompletionResponse> {
        let body = ChatRequestBody {
            model: &request.model,
            system: &request.system_prompt,
            messages: vec![ChatMessage { role: "user", content: &request.user_message }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MatchError::ExternalDependencyFailure {
                dependency: "llm completion request".to_string(),
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(MatchError::ExternalDependencyFailure {
                dependency: "llm completion request".to_string(),
                detail: format!("status {}", resp.status()),
            });
        }

        let parsed: ChatResponseBody = resp.json().await.map_err(|e| MatchError::ExternalDependencyFailure {
            dependency: "llm completion response".to_string(),
            detail: e.to_string(),
        })?;

        Ok(CompletionResponse {
            text: parsed.text,
            usage: TokenUsage { input_tokens: parsed.usage.input_tokens, output_tokens: parsed.usage.output_tokens },
        })
    }
}

/// Always fails. Useful when an operator disables the LLM entirely but
/// code still wants to call through the `Completer` trait.
pub struct NullCompleter;

#[async_trait]
impl Completer for NullCompleter {
    async fn complete(&self, _request: CompletionRequest) -> MatchResult<CompletionResponse> {
        Err(MatchError::ExternalDependencyFailure {
            dependency: "llm".to_string(),
            detail: "no completer configured".to_string(),
        })
    }
}

/// Test double returning a canned response, for IAP generator tests.
pub struct StaticCompleter {
    pub response_text: String,
}

#[async_trait]
impl Completer for StaticCompleter {
    async fn complete(&self, _request: CompletionRequest) -> MatchResult<CompletionResponse> {
        Ok(CompletionResponse {
            text: self.response_text.clone(),
            usage: TokenUsage { input_tokens: 100, output_tokens: 50 },
        })
    }
}
