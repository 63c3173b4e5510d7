/// Authentication module
///
/// Password hashing, JWT issuance/validation, refresh-token storage and
/// rotation, the per-request auth gate, and the session lifecycle built on
/// top of them.

mod claims;
mod gate;
mod jwt;
mod password;
mod refresh_token;
mod rotation;
mod service;

pub use claims::{AccessClaims, RefreshClaims};
pub use gate::{extract_access_token, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use jwt::{TokenIssuer, TokenPair};
pub use password::{hash_password, verify_password};
pub use refresh_token::{hash_token, SessionStore};
pub use service::{AuthService, LoginInput, LoginOutput, RegisterInput};
