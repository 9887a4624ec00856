use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::rate_limit::RateLimiter;

// Default inactivity threshold before a key's window is dropped
pub const DEFAULT_IDLE_AFTER: Duration = Duration::from_secs(600);

// Background sweep - evicts idle rate windows every `sweep_every`.
// Abort the returned handle to stop it.
pub fn spawn_idle_sweeper(
    limiter: Arc<RateLimiter>,
    sweep_every: Duration,
    idle_after: Duration,
) -> JoinHandle<()> {
    tracing::info!(
        interval_secs = sweep_every.as_secs(),
        idle_after_secs = idle_after.as_secs(),
        "Idle window sweeper started"
    );

    tokio::spawn(async move {
        let mut ticker = interval(sweep_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick fires immediately, nothing to sweep yet
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let evicted = limiter.evict_idle(idle_after);
            if evicted > 0 {
                tracing::info!(
                    evicted = evicted,
                    remaining = limiter.tracked_keys(),
                    "Evicted idle rate windows"
                );
            } else {
                tracing::debug!(tracked = limiter.tracked_keys(), "No idle rate windows");
            }
        }
    })
}
