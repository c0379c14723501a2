//! Applier that changes nothing.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use dbscale_core::{CapacityApplier, CommunicationError};

/// Logs each requested change and reports success.
#[derive(Debug, Default)]
pub struct DryRunApplier {
    db_identifier: String,
    requests: AtomicU64,
}

impl DryRunApplier {
    pub fn new(db_identifier: impl Into<String>) -> Self {
        Self {
            db_identifier: db_identifier.into(),
            requests: AtomicU64::new(0),
        }
    }

    /// Number of changes requested so far.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

impl CapacityApplier for DryRunApplier {
    async fn apply(&self, scale: &str, timeout_secs: u64) -> Result<(), CommunicationError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        info!(
            db = %self.db_identifier,
            capacity = %scale,
            timeout_secs,
            "dry run: would modify cluster capacity"
        );
        Ok(())
    }
}
