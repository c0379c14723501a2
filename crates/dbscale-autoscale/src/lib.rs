//! dbscale-autoscale — connection-driven database capacity scaling.
//!
//! Sums per-pod connection usage, fits the result to the smallest capacity
//! tier that can hold it, and applies the change unless a recent change
//! makes a downscale premature.
//!
//! # Scaling Algorithm
//!
//! ```text
//! demand  = headroom + Σ pod.annotations["rds-autoscaler/connections-usage"]
//! desired = first tier (ascending by limit) with limit >= demand
//!
//! if desired is none:                      Saturated, no action
//! if desired == current:                   Unchanged
//! if desired.limit < current.limit
//!    and now - last_change < window:       CooldownBlocked
//! otherwise:                               apply(desired.scale)
//!                                          on success: current = desired,
//!                                                      last_change = now
//! ```
//!
//! Upscales are never delayed. All state lives in one `ScalingState`
//! owned by the reconciliation loop and is lost on restart.

pub mod hysteresis;
pub mod reconciler;
pub mod tiers;
pub mod usage;

pub use hysteresis::{Decision, Direction, HysteresisController, ScalingState};
pub use reconciler::{CycleOutcome, Reconciler};
pub use tiers::CapacityTierSet;
pub use usage::{Demand, ParseWarning, USAGE_ANNOTATION, UsageAggregator};
