//! dbscale-rds — capacity appliers for Aurora Serverless clusters.
//!
//! `RdsApiApplier` calls `ModifyCurrentDBClusterCapacity` through the AWS
//! SDK with `ForceApplyCapacityChange`, so a scaling point that cannot be
//! found within the timeout is forced through. Credentials and region come
//! from the usual AWS environment (`AWS_ACCESS_KEY_ID`,
//! `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`, profiles, instance roles).
//!
//! `DryRunApplier` only logs what would have been applied.

pub mod dry_run;
pub mod rds_api;

pub use dry_run::DryRunApplier;
pub use rds_api::{RdsApiApplier, validate_scale_labels};
