/// Authentication token lifecycle engine
///
/// Credential verification, access/refresh token issuance, single-use
/// refresh rotation with replay detection, and revocation on logout.

mod claims;
mod events;
mod jwt;
mod models;
mod password;
mod service;
mod store;

pub use claims::Claims;
pub use claims::RefreshClaims;
pub use events::{AuthEvent, AuthEventSink, TracingEventSink};
pub use jwt::generate_access_token;
pub use jwt::generate_refresh_token;
pub use jwt::validate_access_token;
pub use jwt::validate_refresh_token;
pub use models::{Token, TokenKind, TokenPair, User};
pub use password::hash_password;
pub use password::verify_password;
pub use service::AuthService;
pub use store::{PostgresTokenStore, PostgresUserStore, TokenStore, UserStore};
