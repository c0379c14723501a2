//! Capacity applier selected at startup.

use dbscale_core::{CapacityApplier, CommunicationError};
use dbscale_rds::{DryRunApplier, RdsApiApplier};

pub enum Applier {
    Rds(RdsApiApplier),
    DryRun(DryRunApplier),
}

impl Applier {
    pub fn kind(&self) -> &'static str {
        match self {
            Applier::Rds(_) => "rds-api",
            Applier::DryRun(_) => "dry-run",
        }
    }
}

impl CapacityApplier for Applier {
    async fn apply(&self, scale: &str, timeout_secs: u64) -> Result<(), CommunicationError> {
        match self {
            Applier::Rds(a) => a.apply(scale, timeout_secs).await,
            Applier::DryRun(a) => a.apply(scale, timeout_secs).await,
        }
    }
}
