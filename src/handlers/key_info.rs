use axum::{Extension, Json, extract::State};

use crate::error::AuthError;
use crate::models::{KeyContext, KeyInfoResponse};
use crate::state::AppState;

// Caller's tier and current-window usage (this request included)
pub async fn key_info_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<KeyContext>,
) -> Result<Json<KeyInfoResponse>, AuthError> {
    // key may have been revoked since the middleware ran
    let usage = state
        .limiter
        .usage(&caller.api_key)
        .ok_or(AuthError::UnknownKey)?;

    Ok(Json(KeyInfoResponse {
        success: true,
        key_info: usage,
    }))
}
