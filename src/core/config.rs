//! Configuration management

use serde::{Deserialize, Serialize};

use crate::core::errors::{GatewayError, Result};

/// Configuration for the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// API key for the AI provider
    pub ai_api_key: String,
    /// Chat-completions endpoint of the AI provider
    pub ai_endpoint: String,
    /// Model used for translation / dictionary lookups
    pub translate_model: String,
    /// Model used for the chat assistant
    pub chat_model: String,
    /// Base URL of the PostgREST-style backend store
    pub backend_url: String,
    /// Service key for the backend store
    pub backend_key: String,
    /// Daily free-plan translation allowance
    pub translate_daily_limit: u32,
    /// Daily free-plan chat allowance
    pub chat_daily_limit: u32,
    /// Trailing-window size for chat history, in messages
    pub history_max_messages: usize,
    /// Per-message character cap for chat history
    pub history_max_chars: usize,
    /// Sampling temperature for AI requests
    pub temperature: f64,
    /// Completion-token cap for translate requests
    pub translate_max_tokens: u32,
    /// Completion-token cap for chat requests
    pub chat_max_tokens: u32,
    /// AI request timeout in milliseconds
    pub timeout_ms: u64,
    /// Cookie carrying the session token
    pub session_cookie: String,
    /// Cookie carrying the anonymous translator id
    pub anon_cookie: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            ai_endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            translate_model: "gpt-4.1-mini".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            backend_url: std::env::var("BACKEND_URL").unwrap_or_default(),
            backend_key: std::env::var("BACKEND_SERVICE_KEY").unwrap_or_default(),
            translate_daily_limit: 15,
            chat_daily_limit: 10,
            history_max_messages: 40,
            history_max_chars: 20000,
            temperature: 0.2,
            translate_max_tokens: 800,
            chat_max_tokens: 900,
            timeout_ms: 30000,
            session_cookie: "idarija_session".to_string(),
            anon_cookie: "idarija_translator_anon".to_string(),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw.parse::<T>().map_err(|_| GatewayError::ConfigError {
            message: format!("{} must be a valid value, got '{}'", name, raw),
        }),
        Err(_) => Ok(default),
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let ai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| GatewayError::ConfigError {
            message: "OPENAI_API_KEY environment variable is required".to_string(),
        })?;

        let backend_url = std::env::var("BACKEND_URL").map_err(|_| GatewayError::ConfigError {
            message: "BACKEND_URL environment variable is required".to_string(),
        })?;

        let backend_key =
            std::env::var("BACKEND_SERVICE_KEY").map_err(|_| GatewayError::ConfigError {
                message: "BACKEND_SERVICE_KEY environment variable is required".to_string(),
            })?;

        Ok(Self {
            ai_api_key,
            ai_endpoint: std::env::var("AI_ENDPOINT").unwrap_or(defaults.ai_endpoint),
            translate_model: std::env::var("TRANSLATE_MODEL").unwrap_or(defaults.translate_model),
            chat_model: std::env::var("CHAT_MODEL").unwrap_or(defaults.chat_model),
            backend_url,
            backend_key,
            translate_daily_limit: env_or("TRANSLATE_DAILY_LIMIT", defaults.translate_daily_limit)?,
            chat_daily_limit: env_or("CHAT_DAILY_LIMIT", defaults.chat_daily_limit)?,
            history_max_messages: env_or("HISTORY_MAX_MESSAGES", defaults.history_max_messages)?,
            history_max_chars: env_or("HISTORY_MAX_CHARS", defaults.history_max_chars)?,
            temperature: env_or("AI_TEMPERATURE", defaults.temperature)?,
            translate_max_tokens: env_or("TRANSLATE_MAX_TOKENS", defaults.translate_max_tokens)?,
            chat_max_tokens: env_or("CHAT_MAX_TOKENS", defaults.chat_max_tokens)?,
            timeout_ms: env_or("REQUEST_TIMEOUT_MS", defaults.timeout_ms)?,
            session_cookie: defaults.session_cookie,
            anon_cookie: defaults.anon_cookie,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.ai_api_key.is_empty() {
            return Err(GatewayError::ConfigError {
                message: "AI API key is required".to_string(),
            });
        }

        if self.ai_endpoint.is_empty() {
            return Err(GatewayError::ConfigError {
                message: "AI endpoint is required".to_string(),
            });
        }

        if self.backend_url.is_empty() || self.backend_key.is_empty() {
            return Err(GatewayError::ConfigError {
                message: "Backend store URL and key are required".to_string(),
            });
        }

        if self.translate_daily_limit == 0 || self.chat_daily_limit == 0 {
            return Err(GatewayError::ConfigError {
                message: "Daily limits must be greater than 0".to_string(),
            });
        }

        if self.history_max_messages == 0 {
            return Err(GatewayError::ConfigError {
                message: "history_max_messages must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            ai_api_key: "test_key".to_string(),
            backend_url: "https://backend.test".to_string(),
            backend_key: "service_key".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_missing_key() {
        let config = GatewayConfig {
            ai_api_key: "".to_string(),
            ..test_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_limit() {
        let config = GatewayConfig {
            translate_daily_limit: 0,
            ..test_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_limits() {
        let config = GatewayConfig::default();
        assert_eq!(config.translate_daily_limit, 15);
        assert_eq!(config.chat_daily_limit, 10);
        assert_eq!(config.history_max_messages, 40);
    }
}
