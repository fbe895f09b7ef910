//! Caller identity resolution
//!
//! Every request acts as exactly one identity: a registered user looked up
//! through its session cookie, or an anonymous pseudo-identity carried in a
//! long-lived client cookie. The quota tracker only keys state by the
//! resulting usage key; it never creates identities itself.

use std::collections::HashMap;
use uuid::Uuid;

use crate::core::store::BackendStore;

/// Lifetime of the anonymous-id cookie, one year in seconds
pub const ANON_COOKIE_MAX_AGE: u32 = 31_536_000;

/// The resolved caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Registered user resolved from a session token
    User {
        id: String,
        premium: bool,
        preferred_language: Option<String>,
    },
    /// Cookie-derived pseudo-identity; `fresh` when the id was minted on this
    /// request and the response must set the cookie
    Anonymous {
        id: String,
        fresh: bool,
    },
}

impl Identity {
    /// Quota key for this identity; premium users are exempt and have none
    pub fn usage_key(&self) -> Option<String> {
        match self {
            Identity::User { premium: true, .. } => None,
            Identity::User { id, .. } => Some(format!("u:{}", id)),
            Identity::Anonymous { id, .. } => Some(format!("a:{}", id)),
        }
    }

    /// Preferred reply language stored on the user's profile, if any
    pub fn preferred_language(&self) -> Option<&str> {
        match self {
            Identity::User {
                preferred_language, ..
            } => preferred_language.as_deref(),
            Identity::Anonymous { .. } => None,
        }
    }

    /// Whether the caller is exempt from quota enforcement
    pub fn is_premium(&self) -> bool {
        matches!(self, Identity::User { premium: true, .. })
    }

    /// Registered-user id, if any
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::User { id, .. } => Some(id),
            Identity::Anonymous { .. } => None,
        }
    }

    /// Anonymous id to persist in a cookie, when freshly minted
    pub fn fresh_anon_id(&self) -> Option<&str> {
        match self {
            Identity::Anonymous { id, fresh: true } => Some(id),
            _ => None,
        }
    }
}

/// Parse a request `Cookie` header into name/value pairs
pub fn parse_cookies(header: Option<&str>) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let Some(header) = header else {
        return out;
    };

    for pair in header.split(';') {
        let mut parts = pair.splitn(2, '=');
        let Some(name) = parts.next() else { continue };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = parts.next().unwrap_or("").trim();
        out.insert(name.to_string(), value.to_string());
    }
    out
}

/// Resolve the caller from its cookies
///
/// A session token that fails to resolve (missing, expired, or a backend
/// read failure) degrades to the anonymous path rather than erroring.
pub async fn resolve(
    store: &dyn BackendStore,
    cookie_header: Option<&str>,
    session_cookie: &str,
    anon_cookie: &str,
) -> Identity {
    let cookies = parse_cookies(cookie_header);

    if let Some(token) = cookies.get(session_cookie).filter(|t| !t.is_empty()) {
        if let Some(user) = store.user_from_session(token).await {
            return Identity::User {
                id: user.id,
                premium: user.is_premium,
                preferred_language: user.preferred_language,
            };
        }
    }

    match cookies.get(anon_cookie).filter(|v| !v.is_empty()) {
        Some(id) => Identity::Anonymous {
            id: id.clone(),
            fresh: false,
        },
        None => Identity::Anonymous {
            id: Uuid::new_v4().to_string(),
            fresh: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::Result;
    use crate::core::models::{ChatMessage, UserProfile};
    use async_trait::async_trait;

    struct SingleUserStore;

    #[async_trait]
    impl BackendStore for SingleUserStore {
        async fn user_from_session(&self, token: &str) -> Option<UserProfile> {
            (token == "tok-1").then(|| UserProfile {
                id: "u1".to_string(),
                is_premium: true,
                preferred_language: None,
            })
        }

        async fn conversation_history(&self, _: &str, _: usize) -> Result<Vec<ChatMessage>> {
            Ok(Vec::new())
        }

        async fn latest_conversation(&self, _: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn create_conversation(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }

        async fn append_message(&self, _: &str, _: &str, _: &str, _: &str) -> Result<()> {
            Ok(())
        }

        async fn set_preferred_language(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_resolve_session_user() {
        let identity = resolve(
            &SingleUserStore,
            Some("idarija_session=tok-1"),
            "idarija_session",
            "idarija_translator_anon",
        )
        .await;
        assert_eq!(
            identity,
            Identity::User {
                id: "u1".to_string(),
                premium: true,
                preferred_language: None,
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_existing_anon_cookie() {
        let identity = resolve(
            &SingleUserStore,
            Some("idarija_translator_anon=anon-9"),
            "idarija_session",
            "idarija_translator_anon",
        )
        .await;
        assert_eq!(
            identity,
            Identity::Anonymous {
                id: "anon-9".to_string(),
                fresh: false,
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_mints_fresh_anon_id() {
        let identity = resolve(&SingleUserStore, None, "idarija_session", "idarija_translator_anon")
            .await;
        match identity {
            Identity::Anonymous { id, fresh } => {
                assert!(fresh);
                assert!(!id.is_empty());
            }
            Identity::User { .. } => panic!("expected anonymous identity"),
        }
    }

    #[tokio::test]
    async fn test_resolve_unknown_session_degrades_to_anon() {
        let identity = resolve(
            &SingleUserStore,
            Some("idarija_session=expired; idarija_translator_anon=anon-9"),
            "idarija_session",
            "idarija_translator_anon",
        )
        .await;
        assert_eq!(
            identity,
            Identity::Anonymous {
                id: "anon-9".to_string(),
                fresh: false,
            }
        );
    }

    #[test]
    fn test_parse_cookies() {
        let cookies = parse_cookies(Some("a=1; idarija_session=tok-123 ;empty="));
        assert_eq!(cookies.get("a").map(String::as_str), Some("1"));
        assert_eq!(
            cookies.get("idarija_session").map(String::as_str),
            Some("tok-123")
        );
        assert_eq!(cookies.get("empty").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_cookies_missing_header() {
        assert!(parse_cookies(None).is_empty());
    }

    #[test]
    fn test_usage_keys() {
        let user = Identity::User {
            id: "42".to_string(),
            premium: false,
            preferred_language: None,
        };
        assert_eq!(user.usage_key().as_deref(), Some("u:42"));

        let premium = Identity::User {
            id: "42".to_string(),
            premium: true,
            preferred_language: None,
        };
        assert_eq!(premium.usage_key(), None);
        assert!(premium.is_premium());

        let anon = Identity::Anonymous {
            id: "abc".to_string(),
            fresh: true,
        };
        assert_eq!(anon.usage_key().as_deref(), Some("a:abc"));
        assert_eq!(anon.fresh_anon_id(), Some("abc"));
    }
}
