/// Token Rotation
///
/// Exchanges a valid refresh token for a brand-new access/refresh pair and
/// invalidates the presented token by overwriting it. Every way a refresh can
/// fail surfaces as the same unauthorized outcome.

use crate::auth::jwt::{TokenIssuer, TokenPair};
use crate::auth::refresh_token::{hash_token, SessionStore};
use crate::error::{AppError, AuthError};
use crate::store::UserStore;

pub async fn rotate(
    issuer: &TokenIssuer,
    store: &dyn UserStore,
    sessions: &SessionStore,
    incoming: Option<&str>,
) -> Result<TokenPair, AppError> {
    let presented = incoming
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let claims = issuer.decode_refresh(presented)?;
    let user_id = claims.user_id()?;

    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UnknownSubject)?;

    let stored = sessions.get_refresh_token(user.id).await?;
    if stored.as_deref() != Some(hash_token(presented).as_str()) {
        tracing::warn!(user_id = %user.id, "Refresh token does not match stored session");
        return Err(AuthError::RefreshTokenMismatch.into());
    }

    let pair = issuer.issue_pair(&user.to_public())?;

    // Another rotation may have consumed the same token since the check above.
    if !sessions
        .replace_refresh_token(user.id, presented, &pair.refresh_token)
        .await?
    {
        tracing::warn!(user_id = %user.id, "Refresh token consumed by a concurrent rotation");
        return Err(AuthError::RefreshTokenMismatch.into());
    }

    tracing::info!(user_id = %user.id, "Refresh token rotated");
    Ok(pair)
}
