//! Runtime configuration for the autoscaler.
//!
//! Values arrive as plain strings and integers (CLI flags or environment
//! variables, see `dbscaled`). Everything here is checked once at startup;
//! a `ConfigError` aborts the process before the first cycle.

use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::types::CapacityTier;

/// Validated autoscaler configuration.
#[derive(Debug, Clone)]
pub struct AutoscalerConfig {
    /// Constant added to observed connection usage.
    pub headroom: u64,
    /// Tier catalogue in configuration order (not yet sorted).
    pub tiers: Vec<CapacityTier>,
    /// Label selector for the workload pods that report usage.
    pub pods_selector: String,
    /// Timeout handed to the capacity store; also bounds pod listing.
    pub operation_timeout: Duration,
    /// Minimum time after a change before a downscale is allowed.
    pub downscale_forbidden_window: Duration,
    /// Idle delay between the end of one cycle and the start of the next.
    pub sync_interval: Duration,
    /// Identifier of the database cluster being scaled.
    pub db_identifier: String,
}

impl AutoscalerConfig {
    /// Assemble and validate a configuration from raw values.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw(
        headroom: u64,
        scalings_set: &str,
        pods_selector: &str,
        operation_timeout_secs: u64,
        db_identifier: &str,
        downscale_forbidden_window_secs: u64,
        sync_interval_secs: u64,
    ) -> ConfigResult<Self> {
        let config = Self {
            headroom,
            tiers: parse_tier_catalogue(scalings_set)?,
            pods_selector: pods_selector.to_string(),
            operation_timeout: Duration::from_secs(operation_timeout_secs),
            downscale_forbidden_window: Duration::from_secs(downscale_forbidden_window_secs),
            sync_interval: Duration::from_secs(sync_interval_secs),
            db_identifier: db_identifier.to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.tiers.is_empty() {
            return Err(ConfigError::TierCatalogue(
                "catalogue must contain at least one tier".to_string(),
            ));
        }
        if let Some(tier) = self.tiers.iter().find(|t| t.name().trim().is_empty()) {
            return Err(ConfigError::TierCatalogue(format!(
                "tier with limit {} has an empty name",
                tier.connection_limit()
            )));
        }
        if self.operation_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "operation timeout",
                reason: "must be at least one second".to_string(),
            });
        }
        if self.sync_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "sync interval",
                reason: "must be at least one second".to_string(),
            });
        }
        if self.db_identifier.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "db identifier",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse a JSON tier catalogue, e.g.
/// `[{"Scale":"1","ConnectionLimit":100},{"Scale":"2","ConnectionLimit":500}]`.
pub fn parse_tier_catalogue(json: &str) -> ConfigResult<Vec<CapacityTier>> {
    serde_json::from_str(json).map_err(|e| ConfigError::TierCatalogue(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOGUE: &str =
        r#"[{"Scale":"1","ConnectionLimit":100},{"Scale":"2","ConnectionLimit":500}]"#;

    #[test]
    fn from_raw_builds_durations() {
        let config = AutoscalerConfig::from_raw(50, CATALOGUE, "app=api", 30, "db-1", 600, 15)
            .unwrap();
        assert_eq!(config.headroom, 50);
        assert_eq!(config.tiers.len(), 2);
        assert_eq!(config.operation_timeout, Duration::from_secs(30));
        assert_eq!(config.downscale_forbidden_window, Duration::from_secs(600));
        assert_eq!(config.sync_interval, Duration::from_secs(15));
    }

    #[test]
    fn malformed_catalogue_is_config_error() {
        let err = AutoscalerConfig::from_raw(0, "not json", "", 30, "db-1", 0, 15).unwrap_err();
        assert!(matches!(err, ConfigError::TierCatalogue(_)));
    }

    #[test]
    fn empty_catalogue_is_rejected() {
        let err = AutoscalerConfig::from_raw(0, "[]", "", 30, "db-1", 0, 15).unwrap_err();
        assert!(err.to_string().contains("at least one tier"));
    }

    #[test]
    fn blank_tier_name_is_rejected() {
        let err = AutoscalerConfig::from_raw(
            0,
            r#"[{"Scale":" ","ConnectionLimit":10}]"#,
            "",
            30,
            "db-1",
            0,
            15,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::TierCatalogue(_)));
    }

    #[test]
    fn zero_sync_interval_is_rejected() {
        let err = AutoscalerConfig::from_raw(0, CATALOGUE, "", 30, "db-1", 0, 0).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "sync interval", .. }
        ));
    }

    #[test]
    fn missing_db_identifier_is_rejected() {
        let err = AutoscalerConfig::from_raw(0, CATALOGUE, "", 30, "", 0, 15).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "db identifier", .. }
        ));
    }

    #[test]
    fn zero_downscale_window_is_allowed() {
        assert!(AutoscalerConfig::from_raw(0, CATALOGUE, "", 30, "db-1", 0, 15).is_ok());
    }
}
