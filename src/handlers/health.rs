use axum::{Json, response::IntoResponse};

use crate::models::HealthResponse;

pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::healthy())
}
