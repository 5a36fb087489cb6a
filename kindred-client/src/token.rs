//! Token lifecycle manager.
//!
//! One in-memory credential slot per client instance. The slot itself does
//! no expiry bookkeeping; validity is judged lazily by the recovery
//! orchestrator. Injected wherever it is needed rather than living in a
//! process-wide global.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use kindred_core::demo;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Demo,
    Provider,
}

#[derive(Debug, Clone)]
pub struct TokenStatus {
    pub present: bool,
    pub kind: Option<TokenKind>,
    /// Truncated form for diagnostics; never the full token.
    pub preview: Option<String>,
}

#[derive(Debug, Default)]
pub struct TokenManager {
    slot: Mutex<Option<String>>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_access_token(&self, token: Option<String>) {
        let mut slot = self.slot.lock().unwrap_or_else(|poison| poison.into_inner());
        *slot = token;
    }

    pub fn access_token(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    pub fn status(&self) -> TokenStatus {
        match self.access_token() {
            Some(token) => TokenStatus {
                present: true,
                kind: Some(if demo::is_demo_token(&token) {
                    TokenKind::Demo
                } else {
                    TokenKind::Provider
                }),
                preview: Some(preview(&token)),
            },
            None => TokenStatus {
                present: false,
                kind: None,
                preview: None,
            },
        }
    }

    /// Age of the held demo token in hours; `None` when the slot is empty
    /// or holds a provider token.
    pub fn demo_token_age_hours(&self, now: DateTime<Utc>) -> Option<f64> {
        let token = self.access_token()?;
        let ts = demo::parse_timestamp(&token, demo::DEMO_TOKEN_PREFIX).ok()?;
        Some(demo::age_hours(ts, now))
    }
}

fn preview(token: &str) -> String {
    if token.len() <= 12 {
        token.to_string()
    } else {
        format!("{}...", &token[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot() {
        let tokens = TokenManager::new();
        let status = tokens.status();
        assert!(!status.present);
        assert!(status.kind.is_none());
        assert!(status.preview.is_none());
    }

    #[test]
    fn test_demo_token_classification() {
        let tokens = TokenManager::new();
        let ts = Utc::now().timestamp_millis();
        tokens.set_access_token(Some(format!("demo-token-{}", ts)));

        let status = tokens.status();
        assert!(status.present);
        assert_eq!(status.kind, Some(TokenKind::Demo));
        let preview = status.preview.unwrap();
        assert!(preview.starts_with("demo-token-"));
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), 15);

        let age = tokens.demo_token_age_hours(Utc::now()).unwrap();
        assert!(age.abs() < 0.01);
    }

    #[test]
    fn test_provider_token_classification() {
        let tokens = TokenManager::new();
        tokens.set_access_token(Some("eyJhbGciOiJIUzI1NiJ9.opaque".to_string()));

        let status = tokens.status();
        assert_eq!(status.kind, Some(TokenKind::Provider));
        assert!(tokens.demo_token_age_hours(Utc::now()).is_none());
    }

    #[test]
    fn test_replace_and_clear() {
        let tokens = TokenManager::new();
        tokens.set_access_token(Some("a".to_string()));
        tokens.set_access_token(Some("b".to_string()));
        assert_eq!(tokens.access_token().as_deref(), Some("b"));

        tokens.set_access_token(None);
        assert!(tokens.access_token().is_none());
    }
}
