mod account;
mod health_check;
mod multipart;
mod users;

pub use account::{change_password, current_user, update_account, update_avatar, update_cover_image};
pub use health_check::health_check;
pub use users::{login, logout, refresh_token, register};

use actix_web::http::StatusCode;
use serde::Serialize;

/// Success envelope shared by every endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, message: &str, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            success: true,
            message: message.to_string(),
            data,
        }
    }
}
