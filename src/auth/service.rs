/// Token Lifecycle Engine
///
/// Composes credential verification, token-pair issuance, single-use
/// refresh rotation, and revocation into the login, refresh, and
/// logout flows. Fails closed: any ambiguity rejects.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::events::{AuthEvent, AuthEventSink};
use crate::auth::jwt::{generate_access_token, generate_refresh_token, validate_refresh_token};
use crate::auth::models::{Token, TokenPair, User};
use crate::auth::password::verify_password;
use crate::auth::store::{TokenStore, UserStore};
use crate::configuration::JwtSettings;
use crate::error::AuthFlowError;

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    events: Arc<dyn AuthEventSink>,
    jwt: JwtSettings,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        events: Arc<dyn AuthEventSink>,
        jwt: JwtSettings,
    ) -> Self {
        Self {
            users,
            tokens,
            events,
            jwt,
        }
    }

    /// Check a username/password pair against the user store.
    ///
    /// Unknown usernames, wrong passwords, and deactivated accounts all
    /// fail with `InvalidCredentials`: the caller must not be able to
    /// enumerate users.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, AuthFlowError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AuthFlowError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthFlowError::InvalidCredentials);
        }

        if !verify_password(password, &user.password_hash) {
            return Err(AuthFlowError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Mint an access/refresh pair for `user`.
    ///
    /// The backing record is persisted before the refresh token is
    /// signed, so a presented refresh token always has a record to
    /// validate against. A storage failure aborts the whole issuance.
    pub async fn issue_token_pair(
        &self,
        user: &User,
        request_id: Option<String>,
    ) -> Result<TokenPair, AuthFlowError> {
        let record = Token::refresh(user.id, request_id);
        self.tokens.create(&record).await?;

        let access_token = generate_access_token(&user.id, &user.username, &self.jwt)?;
        let refresh_token = generate_refresh_token(&user.id, &record.id, &self.jwt)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a fresh pair, consuming it.
    ///
    /// The backing record is removed with an atomic conditional delete
    /// before the new pair is issued: the old token is already unusable
    /// by the time a new one exists, and when two requests race on the
    /// same token id at most one wins.
    pub async fn rotate_refresh_token(
        &self,
        presented: &str,
        request_id: Option<String>,
    ) -> Result<TokenPair, AuthFlowError> {
        let claims = validate_refresh_token(presented, &self.jwt)
            .map_err(|_| AuthFlowError::InvalidRefreshToken)?;
        let token_id = claims
            .token_id()
            .map_err(|_| AuthFlowError::InvalidRefreshToken)?;
        let subject = claims
            .user_id()
            .map_err(|_| AuthFlowError::InvalidRefreshToken)?;

        // A structurally valid token with no backing record has already
        // been consumed or revoked: likely replay.
        let record = match self.tokens.find(token_id).await? {
            Some(record) => record,
            None => {
                tracing::warn!(token_id = %token_id, "refresh token has no backing record");
                return Err(AuthFlowError::InvalidRefreshToken);
            }
        };

        if record.user_id != subject {
            tracing::warn!(token_id = %token_id, "refresh token subject does not own the record");
            return Err(AuthFlowError::UserMismatch);
        }

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AuthFlowError::InvalidRefreshToken)?;

        // Consume before reissuing. The conditional delete is the
        // linearization point: the loser of a race observes `false`.
        if !self.tokens.delete_if_present(token_id).await? {
            tracing::warn!(token_id = %token_id, "refresh token was consumed concurrently");
            return Err(AuthFlowError::InvalidRefreshToken);
        }

        self.issue_token_pair(&user, request_id).await
    }

    /// Invalidate a single refresh token.
    ///
    /// Idempotent: revoking an id that is already gone is a success.
    pub async fn revoke_token(&self, token_id: Uuid) -> Result<(), AuthFlowError> {
        self.tokens.delete_if_present(token_id).await?;
        Ok(())
    }

    /// Invalidate every refresh token owned by `user_id`.
    pub async fn revoke_all_tokens(&self, user_id: Uuid) -> Result<(), AuthFlowError> {
        self.tokens.delete_all_for_user(user_id).await?;
        Ok(())
    }

    /// Login flow: verify credentials, issue a pair, publish `LoggedIn`.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        request_id: Option<String>,
    ) -> Result<TokenPair, AuthFlowError> {
        let user = self.verify_credentials(username, password).await?;
        let pair = self.issue_token_pair(&user, request_id).await?;

        self.events.publish(AuthEvent::LoggedIn { user_id: user.id });

        Ok(pair)
    }

    /// Refresh flow: rotate the presented token. Not audited.
    pub async fn refresh(
        &self,
        presented: &str,
        request_id: Option<String>,
    ) -> Result<TokenPair, AuthFlowError> {
        self.rotate_refresh_token(presented, request_id).await
    }

    /// Logout flow: best-effort revocation of the presented refresh
    /// token. Never fails outward. `LoggedOut` is published only when
    /// the caller had a resolvable identity.
    pub async fn logout(&self, identity: Option<Uuid>, presented_refresh: Option<&str>) {
        if let Some(presented) = presented_refresh {
            if let Ok(claims) = validate_refresh_token(presented, &self.jwt) {
                if let Ok(token_id) = claims.token_id() {
                    if let Err(e) = self.revoke_token(token_id).await {
                        tracing::error!(
                            token_id = %token_id,
                            error = %e,
                            "failed to revoke refresh token on logout"
                        );
                    }
                }
            }
        }

        if let Some(user_id) = identity {
            self.events.publish(AuthEvent::LoggedOut { user_id });
        }
    }
}
