//! dbscale-core — shared types for the dbscale database autoscaler.
//!
//! Holds the pieces every other crate agrees on:
//! - `CapacityTier`, the named capacity level the autoscaler picks from
//! - the error taxonomy (`ConfigError` is fatal at startup,
//!   `CommunicationError` is confined to one reconciliation cycle)
//! - `AutoscalerConfig`, the validated runtime configuration
//! - the `WorkloadLister` and `CapacityApplier` traits implemented by
//!   the Kubernetes and RDS adapter crates

pub mod collaborators;
pub mod config;
pub mod error;
pub mod types;

pub use collaborators::{CapacityApplier, WorkloadInstance, WorkloadLister};
pub use config::AutoscalerConfig;
pub use error::{CommunicationError, ConfigError, ConfigResult};
pub use types::CapacityTier;
