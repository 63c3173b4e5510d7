/// Session Routes
///
/// Register, login, logout and refresh-token. Tokens travel both in the
/// response body and as `httpOnly`, `secure` cookies.

use actix_multipart::Multipart;
use actix_web::{
    cookie::Cookie,
    http::StatusCode,
    web::{self, ReqData},
    Either, HttpRequest, HttpResponse,
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use super::multipart::read_form;
use super::ApiResponse;
use crate::auth::{
    AuthService, LoginInput, RegisterInput, TokenPair, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::error::AppError;
use crate::store::PublicUser;
use crate::telemetry::RequestContext;

/// Login body, accepted as JSON or urlencoded form
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    user: PublicUser,
    access_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenData {
    access_token: String,
    refresh_token: String,
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(true)
        .finish()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = session_cookie(name, String::new());
    cookie.make_removal();
    cookie
}

/// POST /api/v1/users/register
///
/// Multipart form with `fullName`, `email`, `username`, `password`, a
/// required `avatar` file and an optional `coverImage` file.
///
/// # Errors
/// - 400: missing or invalid field, missing avatar, avatar upload failed
/// - 409: email or username already taken
pub async fn register(
    payload: Multipart,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = RequestContext::new("user_registration");

    async move {
        let mut form = read_form(payload).await?;
        let input = RegisterInput {
            full_name: form.fields.remove("fullName"),
            email: form.fields.remove("email"),
            username: form.fields.remove("username"),
            password: form.fields.remove("password"),
            avatar: form.files.remove("avatar"),
            cover_image: form.files.remove("coverImage"),
        };

        let user = auth.register(input).await?;

        Ok(HttpResponse::Created().json(ApiResponse::new(
            StatusCode::CREATED,
            "User registered successfully",
            user,
        )))
    }
    .instrument(context.span())
    .await
}

/// POST /api/v1/users/login
///
/// Either `email` or `username` identifies the account. Failures for an
/// unknown account and a wrong password are indistinguishable.
pub async fn login(
    body: Either<web::Json<LoginRequest>, web::Form<LoginRequest>>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = RequestContext::new("user_login");
    let body = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };

    async move {
        let output = auth
            .login(LoginInput {
                email: body.email,
                username: body.username,
                password: body.password,
            })
            .await?;
        let TokenPair {
            access_token,
            refresh_token,
        } = output.tokens;

        Ok(HttpResponse::Ok()
            .cookie(session_cookie(ACCESS_TOKEN_COOKIE, access_token.clone()))
            .cookie(session_cookie(REFRESH_TOKEN_COOKIE, refresh_token.clone()))
            .json(ApiResponse::new(
                StatusCode::OK,
                "User logged in successfully",
                LoginData {
                    user: output.user,
                    access_token,
                    refresh_token,
                },
            )))
    }
    .instrument(context.span())
    .await
}

/// POST /api/v1/users/logout (auth gate)
pub async fn logout(
    user: ReqData<PublicUser>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = RequestContext::new("user_logout");

    async move {
        auth.logout(user.id).await?;

        Ok(HttpResponse::Ok()
            .cookie(removal_cookie(ACCESS_TOKEN_COOKIE))
            .cookie(removal_cookie(REFRESH_TOKEN_COOKIE))
            .json(ApiResponse::new(
                StatusCode::OK,
                "User logged out",
                serde_json::json!({}),
            )))
    }
    .instrument(context.span())
    .await
}

/// POST /api/v1/users/refresh-token
///
/// The `refreshToken` cookie wins over a `refreshToken` body field, sent
/// as JSON or urlencoded form. A successful call invalidates the
/// presented token.
pub async fn refresh_token(
    req: HttpRequest,
    body: Option<Either<web::Json<RefreshRequest>, web::Form<RefreshRequest>>>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = RequestContext::new("token_refresh");

    let incoming = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            body.and_then(|body| match body {
                Either::Left(json) => json.into_inner().refresh_token,
                Either::Right(form) => form.into_inner().refresh_token,
            })
        });

    async move {
        let TokenPair {
            access_token,
            refresh_token,
        } = auth.refresh(incoming.as_deref()).await?;

        Ok(HttpResponse::Ok()
            .cookie(session_cookie(ACCESS_TOKEN_COOKIE, access_token.clone()))
            .cookie(session_cookie(REFRESH_TOKEN_COOKIE, refresh_token.clone()))
            .json(ApiResponse::new(
                StatusCode::OK,
                "Access token refreshed",
                TokenData {
                    access_token,
                    refresh_token,
                },
            )))
    }
    .instrument(context.span())
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_is_http_only_and_secure() {
        let cookie = session_cookie(ACCESS_TOKEN_COOKIE, "abc".to_string());

        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = removal_cookie(REFRESH_TOKEN_COOKIE);

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age().map(|age| age.whole_seconds()), Some(0));
    }
}
