//! Darija Gateway - quota-enforcing, caching API gateway
//!
//! This library fronts an external AI provider and an external row store for
//! the iDarija translator and chat assistant, enforcing per-identity daily
//! quotas and caching canonical translate requests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod server;

// Re-export key types for convenience
pub use self::core::{
    cache::{cache_key, MemoryResultCache, ResultCache},
    client::{LanguageModel, OpenAiClient},
    config::GatewayConfig,
    errors::GatewayError,
    identity::Identity,
    models::{ChatQuery, ChatReply, TranslateMode, TranslateOutcome, TranslateQuery},
    normalize::{apply_overrides, canonicalize, normalize},
    quota::{MemoryUsageStore, QuotaDecision, QuotaTracker, UsageStore},
    service::GatewayService,
    store::{BackendStore, RestStore},
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
