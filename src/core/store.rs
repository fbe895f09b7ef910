//! Backend row-store client
//!
//! The gateway does not own persistence; sessions, users, conversations and
//! chat messages live in an external PostgREST-style service reached over
//! plain REST. Only the row shapes the gateway reads are modeled here.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

use crate::core::errors::{GatewayError, Result};
use crate::core::models::{ChatMessage, UserProfile};

/// Row-lookup capability the gateway calls into
#[async_trait]
pub trait BackendStore: Send + Sync {
    /// User behind a session token; `None` for unknown tokens and for read
    /// failures, which deliberately degrade to the anonymous path
    async fn user_from_session(&self, token: &str) -> Option<UserProfile>;

    /// Oldest-first messages of a conversation, capped at `limit` rows
    async fn conversation_history(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>>;

    /// The user's most recently created conversation id, if any
    async fn latest_conversation(&self, user_id: &str) -> Result<Option<String>>;

    /// Create a conversation row
    async fn create_conversation(&self, conversation_id: &str, user_id: &str) -> Result<()>;

    /// Append one message to a conversation's log
    async fn append_message(
        &self,
        conversation_id: &str,
        user_id: &str,
        role: &str,
        content: &str,
    ) -> Result<()>;

    /// Persist the user's preferred reply language
    async fn set_preferred_language(&self, user_id: &str, lang: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct SessionRow {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ConversationRow {
    id: String,
}

/// [`BackendStore`] implementation over a PostgREST-style REST endpoint
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl RestStore {
    /// Create a store client against `base_url` with a service key
    pub fn new(base_url: &str, service_key: &str, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.service_key) {
            headers.insert("apikey", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.service_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let response = self
            .client
            .get(self.table_url(table))
            .headers(self.headers())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::StoreError {
                message: format!("{} read failed with status {}", table, status.as_u16()),
            });
        }

        Ok(response.json::<Vec<T>>().await?)
    }

    async fn insert_row(&self, table: &str, body: serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(self.table_url(table))
            .headers(self.headers())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::StoreError {
                message: format!("{} insert failed with status {}", table, status.as_u16()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BackendStore for RestStore {
    async fn user_from_session(&self, token: &str) -> Option<UserProfile> {
        let sessions: Vec<SessionRow> = match self
            .fetch_rows(
                "sessions",
                &[
                    ("select", "user_id".to_string()),
                    ("token", format!("eq.{}", token)),
                    ("limit", "1".to_string()),
                ],
            )
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("session lookup failed: {}", e);
                return None;
            }
        };

        let user_id = sessions.into_iter().next()?.user_id;

        let users: Vec<UserProfile> = match self
            .fetch_rows(
                "users",
                &[
                    ("select", "id,is_premium,preferred_language".to_string()),
                    ("id", format!("eq.{}", user_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("user lookup failed: {}", e);
                return None;
            }
        };

        users.into_iter().next()
    }

    async fn conversation_history(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>> {
        self.fetch_rows(
            "chat_messages",
            &[
                ("select", "role,content".to_string()),
                ("conversation_id", format!("eq.{}", conversation_id)),
                ("order", "created_at.asc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn latest_conversation(&self, user_id: &str) -> Result<Option<String>> {
        let rows: Vec<ConversationRow> = self
            .fetch_rows(
                "conversations",
                &[
                    ("select", "id".to_string()),
                    ("user_id", format!("eq.{}", user_id)),
                    ("order", "created_at.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(|r| r.id))
    }

    async fn create_conversation(&self, conversation_id: &str, user_id: &str) -> Result<()> {
        self.insert_row(
            "conversations",
            json!({ "id": conversation_id, "user_id": user_id }),
        )
        .await
    }

    async fn append_message(
        &self,
        conversation_id: &str,
        user_id: &str,
        role: &str,
        content: &str,
    ) -> Result<()> {
        self.insert_row(
            "chat_messages",
            json!({
                "conversation_id": conversation_id,
                "user_id": user_id,
                "role": role,
                "content": content,
            }),
        )
        .await
    }

    async fn set_preferred_language(&self, user_id: &str, lang: &str) -> Result<()> {
        let response = self
            .client
            .patch(self.table_url("users"))
            .headers(self.headers())
            .query(&[("id", format!("eq.{}", user_id))])
            .json(&json!({ "preferred_language": lang }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::StoreError {
                message: format!("users update failed with status {}", status.as_u16()),
            });
        }
        Ok(())
    }
}
