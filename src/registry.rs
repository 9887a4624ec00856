use dashmap::DashMap;

use crate::error::ConfigError;
use crate::tier::Tier;

pub const DEMO_FREE_KEY: &str = "demo-free-key-2026";
pub const DEMO_PRO_KEY: &str = "demo-pro-key-2026";

/// Lookup from API key to tier.
///
/// The limiter depends on this seam only; the backing store (in-memory table,
/// database, cache) is the host's choice.
pub trait TierResolver: Send + Sync {
    fn resolve_tier(&self, api_key: &str) -> Option<Tier>;
}

// In-memory key -> tier table
#[derive(Debug, Default)]
pub struct KeyRegistry {
    keys: DashMap<String, Tier>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Registry preloaded with the always-available demo keys
    pub fn with_demo_keys() -> Self {
        let registry = Self::new();
        registry.insert(DEMO_FREE_KEY, Tier::Free);
        registry.insert(DEMO_PRO_KEY, Tier::Pro);
        registry
    }

    // Insert or re-tier a key. Returns the previous tier if there was one
    pub fn insert(&self, api_key: impl Into<String>, tier: Tier) -> Option<Tier> {
        self.keys.insert(api_key.into(), tier)
    }

    pub fn remove(&self, api_key: &str) -> Option<Tier> {
        self.keys.remove(api_key).map(|(_, tier)| tier)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl TierResolver for KeyRegistry {
    fn resolve_tier(&self, api_key: &str) -> Option<Tier> {
        self.keys.get(api_key).map(|entry| *entry.value())
    }
}

/// Parse a `KEY=TIER` pair as given on the command line.
pub fn parse_key_spec(spec: &str) -> Result<(String, Tier), ConfigError> {
    let (key, tier) = spec
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidKeySpec(spec.to_string()))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::InvalidKeySpec(spec.to_string()));
    }

    Ok((key.to_string(), tier.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_keys_resolve() {
        let registry = KeyRegistry::with_demo_keys();
        assert_eq!(registry.resolve_tier(DEMO_FREE_KEY), Some(Tier::Free));
        assert_eq!(registry.resolve_tier(DEMO_PRO_KEY), Some(Tier::Pro));
        assert_eq!(registry.resolve_tier("nope"), None);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn insert_retiers_existing_key() {
        let registry = KeyRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.insert("k", Tier::Free), None);
        assert_eq!(registry.insert("k", Tier::Enterprise), Some(Tier::Free));
        assert_eq!(registry.resolve_tier("k"), Some(Tier::Enterprise));

        assert_eq!(registry.remove("k"), Some(Tier::Enterprise));
        assert_eq!(registry.resolve_tier("k"), None);
    }

    #[test]
    fn parses_key_specs() {
        let (key, tier) = parse_key_spec("acme-key=starter").unwrap();
        assert_eq!(key, "acme-key");
        assert_eq!(tier, Tier::Starter);

        assert!(matches!(
            parse_key_spec("no-separator"),
            Err(ConfigError::InvalidKeySpec(_))
        ));
        assert!(matches!(
            parse_key_spec("=pro"),
            Err(ConfigError::InvalidKeySpec(_))
        ));
        assert!(matches!(
            parse_key_spec("k=gold"),
            Err(ConfigError::InvalidTier(_))
        ));
    }
}
