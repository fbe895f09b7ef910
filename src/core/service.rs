//! Request orchestration for the translate and chat operations
//!
//! The flow order is load-bearing. Translate: quota is consulted and
//! consumed before the cache lookup, so a cache hit still costs one unit of
//! the daily allowance. Chat has no request-level cache and consumes one
//! unit per request. Premium identities skip quota entirely and leave no
//! usage records behind.

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::cache::{cache_key, MemoryResultCache, ResultCache};
use crate::core::client::{bound_history, CompletionRequest, LanguageModel, OpenAiClient};
use crate::core::config::GatewayConfig;
use crate::core::errors::{GatewayError, Result};
use crate::core::identity::Identity;
use crate::core::models::{
    ChatHistory, ChatMessage, ChatQuery, ChatReply, DictionaryEntry, TranslateMode,
    TranslateOutcome, TranslateQuery, TranslationEntry, UsageSnapshot,
};
use crate::core::normalize::canonicalize;
use crate::core::prompts::{chat_system_prompt, translate_user_message, TRANSLATE_SYSTEM_PROMPT};
use crate::core::quota::{QuotaDecision, QuotaTracker};
use crate::core::store::{BackendStore, RestStore};

/// Rows fetched from the message log before the context-window bound applies
const HISTORY_FETCH_LIMIT: usize = 60;

/// Row cap when replaying a full conversation to the client
const HISTORY_REPLAY_LIMIT: usize = 500;

/// The gateway's request-handling core
#[derive(Clone)]
pub struct GatewayService {
    config: Arc<GatewayConfig>,
    model: Arc<dyn LanguageModel>,
    store: Arc<dyn BackendStore>,
    cache: Arc<dyn ResultCache>,
    translate_quota: QuotaTracker,
    chat_quota: QuotaTracker,
}

impl GatewayService {
    /// Assemble a service from its collaborators
    pub fn new(
        config: GatewayConfig,
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn BackendStore>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        let translate_quota = QuotaTracker::in_memory(config.translate_daily_limit);
        let chat_quota = QuotaTracker::in_memory(config.chat_daily_limit);
        Self {
            config: Arc::new(config),
            model,
            store,
            cache,
            translate_quota,
            chat_quota,
        }
    }

    /// Wire up the production collaborators from configuration
    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        config.validate()?;

        let model = Arc::new(OpenAiClient::new(
            &config.ai_endpoint,
            &config.ai_api_key,
            config.timeout_ms,
        )?);
        let store = Arc::new(RestStore::new(
            &config.backend_url,
            &config.backend_key,
            config.timeout_ms,
        )?);
        let cache = Arc::new(MemoryResultCache::new());

        Ok(Self::new(config, model, store, cache))
    }

    /// The service configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The backend row store, for identity resolution at the HTTP edge
    pub fn store(&self) -> Arc<dyn BackendStore> {
        Arc::clone(&self.store)
    }

    /// Translate or dictionary-look-up a piece of text
    ///
    /// Quota is consumed before the cache is consulted; see the module docs.
    pub async fn translate(
        &self,
        identity: &Identity,
        query: &TranslateQuery,
    ) -> Result<TranslateOutcome> {
        if query.text.trim().is_empty() {
            return Err(GatewayError::InvalidInput {
                message: "text is required".to_string(),
            });
        }

        if let Some(key) = identity.usage_key() {
            if let QuotaDecision::Denied { limit, used } =
                self.translate_quota.try_consume(&key).await
            {
                return Err(GatewayError::LimitExceeded { limit, used });
            }
        }

        let canonical = canonicalize(&query.text);
        let key = cache_key(
            query.mode,
            query.source_lang(),
            query.target_lang(),
            &canonical,
        );

        if let Some(hit) = self.cache.get(&key).await {
            debug!(key = %key, "translate cache hit");
            return Ok(hit);
        }

        let request = CompletionRequest {
            model: self.config.translate_model.clone(),
            messages: vec![
                ChatMessage::system(TRANSLATE_SYSTEM_PROMPT),
                ChatMessage::user(translate_user_message(query, &canonical)),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.translate_max_tokens,
        };

        let raw = self.model.complete(&request).await?;
        let outcome = parse_outcome(query.mode, &raw)?;
        self.cache.put(&key, outcome.clone()).await;
        Ok(outcome)
    }

    /// One turn of the chat assistant; requires an authenticated caller
    pub async fn chat(&self, identity: &Identity, query: &ChatQuery) -> Result<ChatReply> {
        let Some(user_id) = identity.user_id() else {
            return Err(GatewayError::Unauthenticated);
        };
        let user_id = user_id.to_string();

        let message = query.message.trim();
        if message.is_empty() {
            return Err(GatewayError::InvalidInput {
                message: "message is required".to_string(),
            });
        }

        if let Some(key) = identity.usage_key() {
            if let QuotaDecision::Denied { limit, used } = self.chat_quota.try_consume(&key).await {
                return Err(GatewayError::LimitExceeded { limit, used });
            }
        }

        let lang: String = query.lang.as_deref().unwrap_or("en").chars().take(5).collect();

        // Remember the caller's first explicit language selection
        if identity.preferred_language().is_none() {
            if let Some(hint) = &query.lang {
                if let Err(e) = self.store.set_preferred_language(&user_id, hint).await {
                    warn!("failed to save preferred language: {}", e);
                }
            }
        }

        let history = match &query.conversation_id {
            Some(conversation_id) => self
                .store
                .conversation_history(conversation_id, HISTORY_FETCH_LIMIT)
                .await
                .unwrap_or_default(),
            None => Vec::new(),
        };
        let history = bound_history(
            history,
            self.config.history_max_messages,
            self.config.history_max_chars,
        );

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(chat_system_prompt(&lang)));
        messages.extend(history);
        messages.push(ChatMessage::user(message));

        let request = CompletionRequest {
            model: self.config.chat_model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.chat_max_tokens,
        };
        let assistant = self.model.complete(&request).await?;

        let conversation_id = match &query.conversation_id {
            Some(id) => id.clone(),
            None => {
                let id = Uuid::new_v4().to_string();
                self.store.create_conversation(&id, &user_id).await?;
                id
            }
        };

        self.store
            .append_message(&conversation_id, &user_id, "user", message)
            .await?;
        self.store
            .append_message(&conversation_id, &user_id, "assistant", &assistant)
            .await?;

        Ok(ChatReply {
            assistant,
            conversation_id,
        })
    }

    /// Translate-quota snapshot for the caller
    pub async fn usage(&self, identity: &Identity) -> UsageSnapshot {
        let used = match identity.usage_key() {
            Some(key) => self.translate_quota.current_usage(&key).await,
            None => 0,
        };
        UsageSnapshot {
            limit: self.translate_quota.limit(),
            used,
            premium: identity.is_premium(),
        }
    }

    /// Replay a conversation's messages; newest conversation when unspecified
    pub async fn history(
        &self,
        identity: &Identity,
        conversation_id: Option<&str>,
    ) -> Result<ChatHistory> {
        let Some(user_id) = identity.user_id() else {
            return Err(GatewayError::Unauthenticated);
        };

        let conversation_id = match conversation_id {
            Some(id) => Some(id.to_string()),
            None => self.store.latest_conversation(user_id).await?,
        };

        let Some(conversation_id) = conversation_id else {
            return Ok(ChatHistory {
                messages: Vec::new(),
                conversation_id: None,
            });
        };

        let messages = self
            .store
            .conversation_history(&conversation_id, HISTORY_REPLAY_LIMIT)
            .await?;

        Ok(ChatHistory {
            messages,
            conversation_id: Some(conversation_id),
        })
    }
}

/// Parse the provider's raw text into a typed outcome for `mode`
///
/// Strict: a response that is not the expected JSON shape is a
/// [`GatewayError::MalformedUpstreamOutput`], never a partially-filled value.
fn parse_outcome(mode: TranslateMode, raw: &str) -> Result<TranslateOutcome> {
    match mode {
        TranslateMode::Translate => serde_json::from_str::<TranslationEntry>(raw)
            .map(TranslateOutcome::Translation)
            .map_err(|e| GatewayError::MalformedUpstreamOutput {
                detail: format!("model did not return valid translation JSON: {}", e),
            }),
        TranslateMode::Dictionary => serde_json::from_str::<DictionaryEntry>(raw)
            .map(TranslateOutcome::Dictionary)
            .map_err(|e| GatewayError::MalformedUpstreamOutput {
                detail: format!("model did not return valid dictionary JSON: {}", e),
            }),
    }
}
