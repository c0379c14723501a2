//! Interfaces to the systems the autoscaler talks to.
//!
//! The decision engine only ever sees these traits. `dbscale-kube`
//! implements `WorkloadLister` against the Kubernetes API and
//! `dbscale-rds` implements `CapacityApplier` against Aurora Serverless.

use std::collections::HashMap;
use std::future::Future;

use crate::error::CommunicationError;

/// One workload instance (pod) and its annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadInstance {
    pub name: String,
    pub annotations: HashMap<String, String>,
}

impl WorkloadInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: HashMap::new(),
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

/// Lists workload instances matching a label selector.
///
/// Returns an empty vec when nothing matches. Transport and authorization
/// failures are `CommunicationError`s.
pub trait WorkloadLister: Send + Sync {
    fn list(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<WorkloadInstance>, CommunicationError>> + Send;
}

/// Applies a capacity change to the database cluster.
///
/// `scale` is the tier's scale label. The change must force through any
/// in-progress change once `timeout_secs` elapses.
pub trait CapacityApplier: Send + Sync {
    fn apply(
        &self,
        scale: &str,
        timeout_secs: u64,
    ) -> impl Future<Output = Result<(), CommunicationError>> + Send;
}
