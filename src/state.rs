use std::sync::Arc;

use crate::rate_limit::RateLimiter;

// app's shared state
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}
