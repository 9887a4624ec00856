use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseTierError;

// Pricing tier attached to every API key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Starter,
    Pro,
    Enterprise,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Free, Tier::Starter, Tier::Pro, Tier::Enterprise];

    pub fn requests_per_minute(self) -> u64 {
        match self {
            Tier::Free => 10,
            Tier::Starter => 60,
            Tier::Pro => 300,
            Tier::Enterprise => 1000,
        }
    }

    // Monthly price in whole dollars
    pub fn monthly_price(self) -> u32 {
        match self {
            Tier::Free => 0,
            Tier::Starter => 29,
            Tier::Pro => 99,
            Tier::Enterprise => 499,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Starter => "starter",
            Tier::Pro => "pro",
            Tier::Enterprise => "enterprise",
        }
    }

    // Human readable line for the pricing table, e.g. "60 req/min - $29/mo"
    pub fn pricing(self) -> String {
        match self.monthly_price() {
            0 => format!("{} req/min - $0", self.requests_per_minute()),
            price => format!("{} req/min - ${}/mo", self.requests_per_minute(), price),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseTierError(s.to_string()))
    }
}
