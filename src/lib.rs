//! API key authentication and tiered, fixed-window rate limiting for the
//! forecast API.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod registry;
pub mod routes;
pub mod state;
pub mod sweeper;
pub mod tier;

pub use rate_limit::{CheckOutcome, Decision, Denial, Grant, RateLimiter, Reason, Usage};
pub use registry::{KeyRegistry, TierResolver};
pub use tier::Tier;
