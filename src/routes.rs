use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::auth::require_api_key;
use crate::handlers::{health_handler, key_info_handler, metrics_handler};
use crate::state::AppState;

// Public routes plus the key-protected API behind the limiter
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/key-info", get(key_info_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
