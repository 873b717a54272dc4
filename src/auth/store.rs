/// Store Ports and Postgres Implementations
///
/// The engine talks to its user and token stores through these traits.
/// All token mutations are single store operations the backend can make
/// atomic; in particular `delete_if_present` is a conditional delete,
/// never a read-then-delete from the caller's side.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::models::{Token, TokenKind, User};
use crate::error::StorageError;

/// Read-only access to user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StorageError>;
}

/// Persistence for refresh-token records.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a freshly issued refresh-token record.
    async fn create(&self, token: &Token) -> Result<(), StorageError>;

    async fn find(&self, id: Uuid) -> Result<Option<Token>, StorageError>;

    /// Atomic conditional delete: returns whether a record was removed.
    /// When two callers race on the same id, exactly one observes `true`.
    async fn delete_if_present(&self, id: Uuid) -> Result<bool, StorageError>;

    /// Remove every token owned by `user_id` (logout everywhere).
    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<(), StorageError>;
}

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, bool)>(
            "SELECT id, username, password_hash, is_active FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, username, password_hash, is_active)| User {
            id,
            username,
            password_hash,
            is_active,
        }))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, bool)>(
            "SELECT id, username, password_hash, is_active FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, username, password_hash, is_active)| User {
            id,
            username,
            password_hash,
            is_active,
        }))
    }
}

pub struct PostgresTokenStore {
    pool: PgPool,
}

impl PostgresTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PostgresTokenStore {
    async fn create(&self, token: &Token) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, kind, created_at, request_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(token.kind.as_str())
        .bind(token.created_at)
        .bind(&token.request_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Token>, StorageError> {
        let row = sqlx::query_as::<_, (Uuid, Uuid, String, DateTime<Utc>, Option<String>)>(
            "SELECT id, user_id, kind, created_at, request_id FROM refresh_tokens WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, user_id, kind, created_at, request_id)) = row else {
            return Ok(None);
        };

        // A row with an unknown kind never validates: fail closed.
        let Some(kind) = TokenKind::parse(&kind) else {
            tracing::warn!(token_id = %id, kind = %kind, "token record has unknown kind");
            return Ok(None);
        };

        Ok(Some(Token {
            id,
            user_id,
            kind,
            created_at,
            request_id,
        }))
    }

    async fn delete_if_present(&self, id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
