//! AI provider client
//!
//! The gateway only decides when to call the provider, bounds the payload it
//! sends, and triages the response; prompt design and provider behavior are
//! owned elsewhere. Failed calls surface immediately and are never retried
//! here, so callers see the provider's real latency and error profile.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::core::errors::{GatewayError, Result};
use crate::core::models::ChatMessage;

/// One completion request to the provider
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model id
    pub model: String,
    /// System + history + user messages, in order
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f64,
    /// Completion-token cap
    pub max_tokens: u32,
}

/// Text-generation collaborator behind the gateway
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run one completion and return the assistant's text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// [`LanguageModel`] implementation over an OpenAI-style chat-completions API
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client with a request-level timeout
    pub fn new(endpoint: &str, api_key: &str, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = serde_json::json!({
            "model": request.model,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "messages": request.messages,
        });

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable {
                status: 0,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamUnavailable {
                status: status.as_u16(),
                detail,
            });
        }

        let json: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| GatewayError::MalformedUpstreamOutput {
                    detail: e.to_string(),
                })?;

        let content = json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .ok_or_else(|| GatewayError::MalformedUpstreamOutput {
                detail: "no assistant content in response".to_string(),
            })?;

        Ok(content.to_string())
    }
}

/// Bound a conversation history for the provider's context window
///
/// Keeps the trailing `max_messages` messages and truncates each message to
/// its last `max_chars` characters.
pub fn bound_history(
    history: Vec<ChatMessage>,
    max_messages: usize,
    max_chars: usize,
) -> Vec<ChatMessage> {
    let skip = history.len().saturating_sub(max_messages);
    history
        .into_iter()
        .skip(skip)
        .map(|mut message| {
            let len = message.content.chars().count();
            if len > max_chars {
                message.content = message.content.chars().skip(len - max_chars).collect();
            }
            message
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_history_keeps_tail() {
        let history: Vec<ChatMessage> = (0..50)
            .map(|i| ChatMessage::user(format!("msg-{}", i)))
            .collect();

        let bounded = bound_history(history, 40, 20000);
        assert_eq!(bounded.len(), 40);
        assert_eq!(bounded[0].content, "msg-10");
        assert_eq!(bounded[39].content, "msg-49");
    }

    #[test]
    fn test_bound_history_truncates_long_messages() {
        let history = vec![ChatMessage::user("a".repeat(30))];
        let bounded = bound_history(history, 40, 10);
        assert_eq!(bounded[0].content.len(), 10);
    }

    #[test]
    fn test_bound_history_truncation_keeps_tail_chars() {
        let history = vec![ChatMessage::user("abcdefghij")];
        let bounded = bound_history(history, 40, 4);
        assert_eq!(bounded[0].content, "ghij");
    }

    #[test]
    fn test_bound_history_multibyte_safe() {
        let history = vec![ChatMessage::user("héllo wörld")];
        let bounded = bound_history(history, 40, 5);
        assert_eq!(bounded[0].content, "wörld");
    }

    #[test]
    fn test_bound_history_short_untouched() {
        let history = vec![ChatMessage::user("salam")];
        let bounded = bound_history(history.clone(), 40, 20000);
        assert_eq!(bounded, history);
    }
}
