use clap::Parser;
use std::time::Duration;

use crate::error::ConfigError;
use crate::registry::{KeyRegistry, parse_key_spec};
use crate::sweeper::DEFAULT_IDLE_AFTER;
use crate::tier::Tier;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "forecast-gateway")]
#[command(about = "API key authentication and tiered rate limiting for the forecast API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Seconds without a request before a key's window is evicted
    #[arg(long, default_value_t = DEFAULT_IDLE_AFTER.as_secs())]
    pub idle_timeout: u64,

    // Seconds between eviction sweeps
    #[arg(long, default_value_t = 60)]
    pub sweep_interval: u64,

    // Extra API keys, repeatable
    // Example: --key acme-prod=pro --key acme-ci=starter
    #[arg(short = 'k', long = "key", value_name = "KEY=TIER", value_parser = parse_key_spec)]
    pub keys: Vec<(String, Tier)>,

    // Skip the built-in demo keys
    #[arg(long)]
    pub no_demo_keys: bool,
}

impl Args {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle_timeout == 0 {
            return Err(ConfigError::ZeroDuration("--idle-timeout"));
        }
        if self.sweep_interval == 0 {
            return Err(ConfigError::ZeroDuration("--sweep-interval"));
        }
        Ok(())
    }

    pub fn idle_after(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }

    pub fn sweep_every(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    // Key table built from the demo keys plus every --key flag
    pub fn registry(&self) -> KeyRegistry {
        let registry = if self.no_demo_keys {
            KeyRegistry::new()
        } else {
            KeyRegistry::with_demo_keys()
        };
        for (key, tier) in &self.keys {
            registry.insert(key.clone(), *tier);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DEMO_FREE_KEY, TierResolver};

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["forecast-gateway"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.idle_after(), DEFAULT_IDLE_AFTER);
        assert_eq!(args.sweep_every(), Duration::from_secs(60));
        assert!(args.keys.is_empty());
        assert!(args.validate().is_ok());
        assert_eq!(args.registry().len(), 2);
    }

    #[test]
    fn extra_keys_are_registered() {
        let args = Args::try_parse_from([
            "forecast-gateway",
            "--key",
            "acme=enterprise",
            "-k",
            "ci=starter",
            "--no-demo-keys",
        ])
        .unwrap();

        let registry = args.registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve_tier("acme"), Some(Tier::Enterprise));
        assert_eq!(registry.resolve_tier("ci"), Some(Tier::Starter));
        assert_eq!(registry.resolve_tier(DEMO_FREE_KEY), None);
    }

    #[test]
    fn malformed_key_is_rejected() {
        assert!(Args::try_parse_from(["forecast-gateway", "--key", "acme"]).is_err());
        assert!(Args::try_parse_from(["forecast-gateway", "--key", "acme=gold"]).is_err());
    }

    #[test]
    fn zero_durations_fail_validation() {
        let args = Args::try_parse_from(["forecast-gateway", "--sweep-interval", "0"]).unwrap();
        assert!(matches!(
            args.validate(),
            Err(ConfigError::ZeroDuration("--sweep-interval"))
        ));

        let args = Args::try_parse_from(["forecast-gateway", "--idle-timeout", "0"]).unwrap();
        assert!(args.validate().is_err());
    }
}
