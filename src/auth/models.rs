/// Domain types for the token lifecycle engine.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identity record owned by the external user store. Read-only here.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
}

/// Kind of a persisted credential record.
///
/// Access tokens are stateless and never stored, so only refresh
/// tokens appear in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Refresh => "refresh",
        }
    }

    pub fn parse(value: &str) -> Option<TokenKind> {
        match value {
            "refresh" => Some(TokenKind::Refresh),
            _ => None,
        }
    }
}

/// Persisted refresh-credential record.
///
/// Deletion is the only mutation: once the row is gone (rotated or
/// revoked), the id must never validate again.
#[derive(Debug, Clone)]
pub struct Token {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TokenKind,
    pub created_at: DateTime<Utc>,
    pub request_id: Option<String>,
}

impl Token {
    /// Build a fresh refresh-token record for `user_id`.
    pub fn refresh(user_id: Uuid, request_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind: TokenKind::Refresh,
            created_at: Utc::now(),
            request_id,
        }
    }
}

/// Freshly minted access + refresh credentials. Returned to the caller,
/// never persisted as a unit.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
