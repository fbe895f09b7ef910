//! Core data models for the gateway

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mode of a translate request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslateMode {
    /// Full-phrase translation
    #[default]
    Translate,
    /// Single-word dictionary lookup
    Dictionary,
}

impl fmt::Display for TranslateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateMode::Translate => write!(f, "translate"),
            TranslateMode::Dictionary => write!(f, "dictionary"),
        }
    }
}

/// Incoming translate request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateQuery {
    /// Raw user-entered text
    pub text: String,
    /// Source language code, `auto` when absent
    #[serde(default, alias = "sourceLang")]
    pub source_lang: Option<String>,
    /// Target language code, `darija` when absent
    #[serde(default, alias = "targetLang")]
    pub target_lang: Option<String>,
    /// Translate or dictionary mode
    #[serde(default)]
    pub mode: TranslateMode,
}

impl TranslateQuery {
    /// Build a translate-mode query
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_lang: None,
            target_lang: None,
            mode: TranslateMode::Translate,
        }
    }

    /// Source language, defaulted
    pub fn source_lang(&self) -> &str {
        self.source_lang.as_deref().unwrap_or("auto")
    }

    /// Target language, defaulted
    pub fn target_lang(&self) -> &str {
        self.target_lang.as_deref().unwrap_or("darija")
    }
}

/// Structured translation produced by the AI provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One sense of a dictionary entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryMeaning {
    pub sense: String,
    pub english: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub darija_example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub english_example: Option<String>,
}

/// Structured dictionary lookup produced by the AI provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    pub meanings: Vec<DictionaryMeaning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Tagged outcome of a translate request, as stored in the response cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslateOutcome {
    /// Translate-mode result
    Translation(TranslationEntry),
    /// Dictionary-mode result
    Dictionary(DictionaryEntry),
}

/// A single chat message, as exchanged with the AI provider and the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// System-role message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// User-role message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Assistant-role message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Incoming chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatQuery {
    /// The user's message
    pub message: String,
    /// Conversation to continue, a new one is created when absent
    #[serde(default, alias = "conversationId")]
    pub conversation_id: Option<String>,
    /// Reply-language hint selected in the client
    #[serde(default)]
    pub lang: Option<String>,
}

/// Chat response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub assistant: String,
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
}

/// Read-back of a conversation's message log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    pub messages: Vec<ChatMessage>,
    #[serde(rename = "conversationId")]
    pub conversation_id: Option<String>,
}

/// Registered-user row as read from the backend store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub preferred_language: Option<String>,
}

/// Current quota snapshot for a caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub limit: u32,
    pub used: u32,
    pub premium: bool,
}
