mod health;
mod metrics;
mod key_info;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use key_info::key_info_handler;
