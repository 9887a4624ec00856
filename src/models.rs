use serde::Serialize;
use std::collections::BTreeMap;

use crate::rate_limit::Usage;
use crate::tier::Tier;

// Resolved caller, attached to the request once the limiter lets it through
#[derive(Debug, Clone)]
pub struct KeyContext {
    pub api_key: String,
    pub tier: Tier,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub pricing: BTreeMap<&'static str, String>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            service: "Forecast Gateway",
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Utc::now().to_rfc3339(),
            pricing: Tier::ALL
                .into_iter()
                .map(|tier| (tier.as_str(), tier.pricing()))
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct KeyInfoResponse {
    pub success: bool,
    pub key_info: Usage,
}
