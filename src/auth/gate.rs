/// Auth Gate
///
/// Resolves a presented access token to the sanitized identity it names.

use crate::auth::jwt::TokenIssuer;
use crate::error::{AppError, AuthError};
use crate::store::{PublicUser, UserStore};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Picks the access token from the cookie, falling back to an
/// `Authorization: Bearer <token>` header. Empty values count as absent.
pub fn extract_access_token(cookie: Option<&str>, authorization: Option<&str>) -> Option<String> {
    cookie
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .or_else(|| {
            authorization
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
        })
        .map(str::to_string)
}

pub async fn authenticate(
    issuer: &TokenIssuer,
    store: &dyn UserStore,
    presented: Option<&str>,
) -> Result<PublicUser, AppError> {
    let token = presented.ok_or(AuthError::MissingToken)?;
    let claims = issuer.decode_access(token)?;
    let user_id = claims.user_id()?;

    let user = store
        .find_profile(user_id)
        .await?
        .ok_or(AuthError::UnknownSubject)?;

    Ok(user)
}
