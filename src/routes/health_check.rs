use actix_web::{http::StatusCode, HttpResponse};

use super::ApiResponse;

/// Liveness probe; touches no dependencies
pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        "OK",
        serde_json::json!({ "status": "healthy" }),
    ))
}
