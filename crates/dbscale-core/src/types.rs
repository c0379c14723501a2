//! Domain types shared across dbscale crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the sentinel tier the autoscaler starts from.
pub const UNKNOWN_TIER: &str = "Unknown";

/// A named, discrete capacity level with a connection-handling limit.
///
/// The name doubles as the scale label sent to the capacity store. Two
/// tiers are equal when their names are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityTier {
    #[serde(rename = "Scale", alias = "scale", alias = "name")]
    name: String,
    #[serde(
        rename = "ConnectionLimit",
        alias = "connectionLimit",
        alias = "connection_limit"
    )]
    connection_limit: u64,
}

impl CapacityTier {
    pub fn new(name: impl Into<String>, connection_limit: u64) -> Self {
        Self {
            name: name.into(),
            connection_limit,
        }
    }

    /// The "Unknown" tier with a zero limit. Any fitted tier compares as
    /// an upscale (or a lateral move) from here.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_TIER, 0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection_limit(&self) -> u64 {
        self.connection_limit
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_TIER
    }
}

impl PartialEq for CapacityTier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CapacityTier {}

impl fmt::Display for CapacityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} connections)", self.name, self.connection_limit)
    }
}
