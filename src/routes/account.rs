/// Account Routes
///
/// Everything here sits behind the auth gate, which has already attached
/// the caller's `PublicUser` to the request.

use actix_multipart::Multipart;
use actix_web::{
    http::StatusCode,
    web::{self, ReqData},
    HttpResponse,
};
use serde::Deserialize;
use tracing::Instrument;

use super::multipart::read_form;
use super::ApiResponse;
use crate::auth::AuthService;
use crate::error::AppError;
use crate::store::PublicUser;
use crate::telemetry::RequestContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// GET /api/v1/users/current-user
pub async fn current_user(user: ReqData<PublicUser>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        "User fetched successfully",
        user.into_inner(),
    ))
}

/// POST /api/v1/users/change-password
///
/// The current refresh token stays valid after a password change.
pub async fn change_password(
    user: ReqData<PublicUser>,
    body: web::Json<ChangePasswordRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = RequestContext::new("change_password");

    auth.change_password(
        user.id,
        body.old_password.as_deref(),
        body.new_password.as_deref(),
    )
    .instrument(context.span())
    .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        "Password changed successfully",
        serde_json::json!({}),
    )))
}

/// PATCH /api/v1/users/update-account
pub async fn update_account(
    user: ReqData<PublicUser>,
    body: web::Json<UpdateAccountRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let updated = auth
        .update_account(user.id, body.full_name.as_deref(), body.email.as_deref())
        .await?;

    tracing::info!(user_id = %updated.id, "Account details updated");
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        "Account details updated successfully",
        updated,
    )))
}

/// PATCH /api/v1/users/update-avatar (multipart field `avatar`)
pub async fn update_avatar(
    user: ReqData<PublicUser>,
    payload: Multipart,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let mut form = read_form(payload).await?;
    let updated = auth
        .update_avatar(user.id, form.files.remove("avatar"))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        "Avatar image updated successfully",
        updated,
    )))
}

/// PATCH /api/v1/users/update-cover-image (multipart field `coverImage`)
pub async fn update_cover_image(
    user: ReqData<PublicUser>,
    payload: Multipart,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let mut form = read_form(payload).await?;
    let updated = auth
        .update_cover_image(user.id, form.files.remove("coverImage"))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        "Cover image updated successfully",
        updated,
    )))
}
