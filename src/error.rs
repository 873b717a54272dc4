/// Error Handling Module
///
/// Failures inside the token lifecycle engine are kept as narrow
/// domain enums so the flows can branch on them. At the HTTP boundary
/// every login/refresh failure is collapsed into a single 401 response:
/// an unknown user, a wrong password, a replayed refresh token, and a
/// storage outage must all look identical to the caller. Storage
/// outages still reach operators through the error log.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// Signed-token codec failures.
///
/// Tampering and natural expiry share one variant: callers of the codec
/// must not be able to tell which occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCodecError {
    InvalidSignatureOrExpiry,
    SigningFailed(String),
}

impl fmt::Display for TokenCodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenCodecError::InvalidSignatureOrExpiry => {
                write!(f, "token signature invalid or expired")
            }
            TokenCodecError::SigningFailed(msg) => write!(f, "token signing failed: {}", msg),
        }
    }
}

impl StdError for TokenCodecError {}

/// User/token store failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    Unavailable(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {}", msg),
        }
    }
}

impl StdError for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}

/// Failures inside the login, refresh, and logout flows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFlowError {
    InvalidCredentials,
    InvalidRefreshToken,
    UserMismatch,
    Codec(TokenCodecError),
    Storage(StorageError),
}

impl fmt::Display for AuthFlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFlowError::InvalidCredentials => write!(f, "invalid credentials"),
            AuthFlowError::InvalidRefreshToken => write!(f, "invalid refresh token"),
            AuthFlowError::UserMismatch => write!(f, "refresh token owner mismatch"),
            AuthFlowError::Codec(e) => write!(f, "{}", e),
            AuthFlowError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for AuthFlowError {}

impl From<TokenCodecError> for AuthFlowError {
    fn from(err: TokenCodecError) -> Self {
        AuthFlowError::Codec(err)
    }
}

impl From<StorageError> for AuthFlowError {
    fn from(err: StorageError) -> Self {
        AuthFlowError::Storage(err)
    }
}

impl AuthFlowError {
    /// Collapse an internal flow failure into the single outward 401.
    ///
    /// Storage and signing failures are logged at error level so that
    /// outages are visible operationally; everything else is an
    /// expected rejection and logs at warn level.
    pub fn collapse(self, flow: &str, request_id: &str) -> AppError {
        match &self {
            AuthFlowError::Storage(e) => {
                tracing::error!(
                    request_id = request_id,
                    flow = flow,
                    error = %e,
                    "storage failure during auth flow"
                );
            }
            AuthFlowError::Codec(TokenCodecError::SigningFailed(msg)) => {
                tracing::error!(
                    request_id = request_id,
                    flow = flow,
                    error = %msg,
                    "token signing failure during auth flow"
                );
            }
            other => {
                tracing::warn!(
                    request_id = request_id,
                    flow = flow,
                    error = %other,
                    "auth flow rejected"
                );
            }
        }
        AppError::Unauthorized
    }
}

/// HTTP-boundary error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Unauthorized,
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthorized => write!(f, "unauthorized"),
            AppError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking (request ID or trace ID)
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (code, message) = match self {
            AppError::Unauthorized => ("UNAUTHORIZED", "Invalid credentials or token"),
            AppError::Internal(_) => ("INTERNAL_ERROR", "Internal server error"),
        };

        let body = ErrorResponse::new(
            uuid::Uuid::new_v4().to_string(),
            message.to_string(),
            code.to_string(),
            self.status_code().as_u16(),
        );

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Per-request correlation context for logging and token records
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
        }
    }
}
