//! Usage aggregator — turns per-pod connection usage into one demand figure.
//!
//! Each workload pod may report its current connection usage in the
//! `rds-autoscaler/connections-usage` annotation. Missing annotations
//! contribute nothing; unparseable ones are logged and skipped so that
//! one misbehaving pod cannot stall scaling for the whole fleet.

use std::time::Duration;

use tracing::{debug, warn};

use dbscale_core::{CommunicationError, WorkloadInstance, WorkloadLister};

/// Annotation key carrying a pod's connection usage.
pub const USAGE_ANNOTATION: &str = "rds-autoscaler/connections-usage";

/// A usage annotation that was present but not a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub instance: String,
    pub value: String,
}

/// Aggregated connection demand for one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demand {
    /// Headroom plus all parsed usage values.
    pub total: u64,
    pub headroom: u64,
    /// Instances returned by the lister.
    pub instances: usize,
    /// Instances whose usage was counted.
    pub reporting: usize,
    pub skipped: Vec<ParseWarning>,
}

/// Computes current demand from the workload lister.
pub struct UsageAggregator<L> {
    lister: L,
    selector: String,
    headroom: u64,
    list_timeout: Option<Duration>,
}

impl<L: WorkloadLister> UsageAggregator<L> {
    pub fn new(lister: L, selector: impl Into<String>, headroom: u64) -> Self {
        Self {
            lister,
            selector: selector.into(),
            headroom,
            list_timeout: None,
        }
    }

    /// Bound each listing call. A listing that runs past this is a
    /// `CommunicationError::Timeout`.
    pub fn with_list_timeout(mut self, timeout: Duration) -> Self {
        self.list_timeout = Some(timeout);
        self
    }

    /// List matching instances and sum their usage with the headroom.
    pub async fn current_demand(&self) -> Result<Demand, CommunicationError> {
        let listing = self.lister.list(&self.selector);
        let instances = match self.list_timeout {
            Some(timeout) => tokio::time::timeout(timeout, listing).await.map_err(|_| {
                CommunicationError::Timeout {
                    operation: "workload listing",
                    secs: timeout.as_secs(),
                }
            })??,
            None => listing.await?,
        };

        if instances.is_empty() {
            warn!(selector = %self.selector, "no pods found for label selector");
        }

        Ok(aggregate(self.headroom, &instances))
    }
}

/// Sum headroom and every parseable usage annotation.
pub fn aggregate(headroom: u64, instances: &[WorkloadInstance]) -> Demand {
    let mut demand = Demand {
        total: headroom,
        headroom,
        instances: instances.len(),
        reporting: 0,
        skipped: Vec::new(),
    };

    for instance in instances {
        let raw = match instance.annotations.get(USAGE_ANNOTATION) {
            Some(raw) if !raw.is_empty() => raw,
            _ => continue,
        };

        match raw.parse::<u64>() {
            Ok(usage) => {
                debug!(instance = %instance.name, usage, "counted connection usage");
                demand.total = demand.total.saturating_add(usage);
                demand.reporting += 1;
            }
            Err(_) => {
                warn!(
                    instance = %instance.name,
                    annotation = USAGE_ANNOTATION,
                    value = %raw,
                    "ignoring invalid connection usage"
                );
                demand.skipped.push(ParseWarning {
                    instance: instance.name.clone(),
                    value: raw.clone(),
                });
            }
        }
    }

    demand
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn pod(name: &str, usage: Option<&str>) -> WorkloadInstance {
        let instance = WorkloadInstance::new(name);
        match usage {
            Some(u) => instance.with_annotation(USAGE_ANNOTATION, u),
            None => instance,
        }
    }

    struct StaticLister {
        result: Mutex<Option<Result<Vec<WorkloadInstance>, CommunicationError>>>,
        seen_selector: Mutex<Option<String>>,
    }

    impl StaticLister {
        fn returning(result: Result<Vec<WorkloadInstance>, CommunicationError>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                seen_selector: Mutex::new(None),
            }
        }
    }

    impl WorkloadLister for StaticLister {
        async fn list(&self, selector: &str) -> Result<Vec<WorkloadInstance>, CommunicationError> {
            *self.seen_selector.lock().unwrap() = Some(selector.to_string());
            self.result.lock().unwrap().take().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    struct HangingLister;

    impl WorkloadLister for HangingLister {
        async fn list(&self, _selector: &str) -> Result<Vec<WorkloadInstance>, CommunicationError> {
            std::future::pending().await
        }
    }

    #[test]
    fn sums_headroom_and_usage() {
        let demand = aggregate(50, &[pod("a", Some("120")), pod("b", Some("80"))]);
        assert_eq!(demand.total, 250);
        assert_eq!(demand.instances, 2);
        assert_eq!(demand.reporting, 2);
        assert!(demand.skipped.is_empty());
    }

    #[test]
    fn missing_and_empty_annotations_contribute_zero() {
        let demand = aggregate(10, &[pod("a", None), pod("b", Some("")), pod("c", Some("5"))]);
        assert_eq!(demand.total, 15);
        assert_eq!(demand.reporting, 1);
        assert!(demand.skipped.is_empty());
    }

    #[test]
    fn invalid_values_are_skipped_with_warning() {
        let demand = aggregate(
            0,
            &[
                pod("ok", Some("30")),
                pod("word", Some("lots")),
                pod("negative", Some("-4")),
                pod("float", Some("2.5")),
            ],
        );
        assert_eq!(demand.total, 30);
        assert_eq!(demand.reporting, 1);
        assert_eq!(demand.skipped.len(), 3);
        assert_eq!(
            demand.skipped[0],
            ParseWarning {
                instance: "word".to_string(),
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn other_annotations_are_ignored() {
        let instance = WorkloadInstance::new("a").with_annotation("prometheus.io/port", "9090");
        assert_eq!(aggregate(7, &[instance]).total, 7);
    }

    #[test]
    fn sum_saturates() {
        let demand = aggregate(u64::MAX - 1, &[pod("a", Some("10"))]);
        assert_eq!(demand.total, u64::MAX);
    }

    #[tokio::test]
    async fn current_demand_uses_selector() {
        let lister = StaticLister::returning(Ok(vec![pod("a", Some("120")), pod("b", Some("80"))]));
        let aggregator = UsageAggregator::new(lister, "app=api", 50);

        let demand = aggregator.current_demand().await.unwrap();
        assert_eq!(demand.total, 250);
        assert_eq!(
            aggregator.lister.seen_selector.lock().unwrap().as_deref(),
            Some("app=api")
        );
    }

    #[tokio::test]
    async fn no_matching_pods_yields_headroom() {
        let aggregator = UsageAggregator::new(StaticLister::returning(Ok(Vec::new())), "app=none", 50);
        let demand = aggregator.current_demand().await.unwrap();
        assert_eq!(demand.total, 50);
        assert_eq!(demand.instances, 0);
    }

    #[tokio::test]
    async fn listing_failure_propagates() {
        let lister = StaticLister::returning(Err(CommunicationError::List("forbidden".into())));
        let aggregator = UsageAggregator::new(lister, "app=api", 50);
        assert!(matches!(
            aggregator.current_demand().await,
            Err(CommunicationError::List(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn listing_timeout_is_communication_error() {
        let aggregator = UsageAggregator::new(HangingLister, "app=api", 50)
            .with_list_timeout(Duration::from_secs(30));
        let err = aggregator.current_demand().await.unwrap_err();
        assert!(matches!(
            err,
            CommunicationError::Timeout { operation: "workload listing", secs: 30 }
        ));
    }
}
