/// Authentication Flow Handlers
///
/// Decodes login/refresh/logout requests, moves the refresh token in
/// and out of its cookie carrier, and maps engine failures to the
/// single outward 401. All lifecycle decisions live in the engine.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{validate_access_token, AuthService, TokenPair};
use crate::configuration::JwtSettings;
use crate::error::{AppError, ErrorContext};

/// Cookie that carries the refresh token between calls.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh request (body fallback for non-browser clients)
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authentication response with access and refresh tokens
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// POST /auth/login
///
/// Authenticate with username and password. Returns a token pair and
/// sets the refresh cookie on success.
///
/// # Errors
/// - 401: any failure — credential mismatch, unknown user, and internal
///   errors are indistinguishable to the caller
pub async fn login(
    form: web::Json<LoginRequest>,
    service: web::Data<AuthService>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let pair = service
        .login(
            &form.username,
            &form.password,
            Some(context.request_id.clone()),
        )
        .await
        .map_err(|e| e.collapse("login", &context.request_id))?;

    tracing::info!(
        request_id = %context.request_id,
        "User logged in successfully"
    );

    Ok(token_pair_response(pair, &jwt_config))
}

/// POST /auth/refresh
///
/// Exchange a refresh token for a new pair. The old token is consumed
/// before the new pair is handed out; presenting it again fails.
///
/// The token is read from the refresh cookie, falling back to the JSON
/// body for non-browser clients.
///
/// # Errors
/// - 401: missing, invalid, expired, or already-consumed refresh token
pub async fn refresh(
    request: HttpRequest,
    form: Option<web::Json<RefreshRequest>>,
    service: web::Data<AuthService>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let presented = request
        .cookie(REFRESH_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| form.map(|form| form.into_inner().refresh_token))
        .ok_or(AppError::Unauthorized)?;

    let pair = service
        .refresh(&presented, Some(context.request_id.clone()))
        .await
        .map_err(|e| e.collapse("refresh", &context.request_id))?;

    tracing::info!(
        request_id = %context.request_id,
        "Token refreshed successfully"
    );

    Ok(token_pair_response(pair, &jwt_config))
}

/// POST /auth/logout
///
/// Always clears the refresh cookie and returns 204, authenticated or
/// not. When the caller's identity is resolvable from the bearer token,
/// the presented refresh token is revoked and the logout is audited.
pub async fn logout(
    request: HttpRequest,
    service: web::Data<AuthService>,
    jwt_config: web::Data<JwtSettings>,
) -> HttpResponse {
    let identity = bearer_identity(&request, &jwt_config);
    let presented = request
        .cookie(REFRESH_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string());

    service.logout(identity, presented.as_deref()).await;

    let mut removal = Cookie::new(REFRESH_COOKIE_NAME, "");
    removal.set_path("/auth");
    removal.make_removal();

    HttpResponse::NoContent().cookie(removal).finish()
}

/// Resolve the caller's identity from the Authorization header, if any.
fn bearer_identity(request: &HttpRequest, jwt_config: &JwtSettings) -> Option<Uuid> {
    let header = request.headers().get("Authorization")?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    let claims = validate_access_token(token, jwt_config).ok()?;
    claims.user_id().ok()
}

fn token_pair_response(pair: TokenPair, jwt_config: &JwtSettings) -> HttpResponse {
    let cookie = refresh_cookie(pair.refresh_token.clone(), jwt_config.refresh_token_expiry);

    HttpResponse::Ok().cookie(cookie).json(AuthResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry,
    })
}

fn refresh_cookie(value: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE_NAME, value)
        .path("/auth")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::seconds(max_age_seconds))
        .finish()
}
