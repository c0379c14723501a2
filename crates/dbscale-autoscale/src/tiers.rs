//! Capacity tier catalogue.
//!
//! Built once at startup and never mutated. Tiers are kept sorted by
//! connection limit (stable, so equal limits keep configuration order)
//! so fitting is a lower-bound binary search.

use std::collections::HashMap;

use dbscale_core::config::parse_tier_catalogue;
use dbscale_core::{CapacityTier, ConfigResult};

/// An immutable, ascending catalogue of capacity tiers.
#[derive(Debug, Clone)]
pub struct CapacityTierSet {
    sorted: Vec<CapacityTier>,
    by_name: HashMap<String, CapacityTier>,
}

impl CapacityTierSet {
    /// Build a tier set from tiers in configuration order.
    ///
    /// When two tiers share a name, the later one wins the name lookup.
    pub fn build(tiers: Vec<CapacityTier>) -> Self {
        let by_name = tiers
            .iter()
            .map(|t| (t.name().to_string(), t.clone()))
            .collect();

        let mut sorted = tiers;
        sorted.sort_by_key(CapacityTier::connection_limit);

        Self { sorted, by_name }
    }

    /// Parse a JSON catalogue and build a tier set from it.
    pub fn parse(json: &str) -> ConfigResult<Self> {
        Ok(Self::build(parse_tier_catalogue(json)?))
    }

    /// The smallest tier whose limit covers `demand`, or `None` when demand
    /// exceeds every tier.
    pub fn fit(&self, demand: u64) -> Option<&CapacityTier> {
        let index = self
            .sorted
            .partition_point(|t| t.connection_limit() < demand);
        self.sorted.get(index)
    }

    /// The configured limit of a named tier, or zero if the name is unknown.
    pub fn limit_of(&self, name: &str) -> u64 {
        self.get(name).map_or(0, CapacityTier::connection_limit)
    }

    /// Look a tier up by name.
    pub fn get(&self, name: &str) -> Option<&CapacityTier> {
        self.by_name.get(name)
    }

    /// Diagnostic rendering: element count plus the sorted tiers as JSON.
    pub fn describe(&self) -> String {
        let json = serde_json::to_string(&self.sorted).unwrap_or_else(|_| "[]".to_string());
        format!("({} elements) {json}", self.sorted.len())
    }

    /// Tiers in ascending limit order.
    pub fn iter(&self) -> impl Iterator<Item = &CapacityTier> {
        self.sorted.iter()
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// The tier with the largest limit.
    pub fn largest(&self) -> Option<&CapacityTier> {
        self.sorted.last()
    }
}
