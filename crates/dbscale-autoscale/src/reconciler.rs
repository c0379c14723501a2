//! Reconciler — one measure → fit → decide → apply pass per cycle.
//!
//! Every failure short of bad configuration stops at the cycle boundary:
//! `reconcile` always returns a `CycleOutcome`, and the `ScalingState` is
//! only touched after the capacity store confirms a change.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use dbscale_core::{CapacityApplier, CapacityTier, WorkloadLister};

use crate::hysteresis::{Decision, HysteresisController, ScalingState};
use crate::tiers::CapacityTierSet;
use crate::usage::UsageAggregator;

/// What a single reconciliation cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The capacity store accepted the change and state was updated.
    Applied {
        from: CapacityTier,
        to: CapacityTier,
        demand: u64,
    },
    /// Already at the fitted tier.
    Unchanged { tier: CapacityTier, demand: u64 },
    /// Downscale suppressed by the forbidden window.
    CooldownBlocked {
        current: CapacityTier,
        desired: CapacityTier,
        remaining: Duration,
        demand: u64,
    },
    /// Demand exceeds every configured tier.
    Saturated { current: CapacityTier, demand: u64 },
    /// Listing workloads failed; nothing else ran.
    UsageUnavailable { error: String },
    /// The capacity store rejected or did not answer the change.
    ApplyFailed {
        desired: CapacityTier,
        demand: u64,
        error: String,
    },
}

impl CycleOutcome {
    /// Whether the cycle changed the cluster capacity.
    pub fn is_applied(&self) -> bool {
        matches!(self, CycleOutcome::Applied { .. })
    }
}

/// Drives the autoscaler cycle against a lister and an applier.
pub struct Reconciler<L, A> {
    usage: UsageAggregator<L>,
    tiers: CapacityTierSet,
    hysteresis: HysteresisController,
    applier: A,
    operation_timeout: Duration,
}

impl<L, A> Reconciler<L, A>
where
    L: WorkloadLister,
    A: CapacityApplier,
{
    pub fn new(
        usage: UsageAggregator<L>,
        tiers: CapacityTierSet,
        hysteresis: HysteresisController,
        applier: A,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            usage,
            tiers,
            hysteresis,
            applier,
            operation_timeout,
        }
    }

    /// Run one cycle against `state`.
    pub async fn reconcile(&self, state: &mut ScalingState) -> CycleOutcome {
        let demand = match self.usage.current_demand().await {
            Ok(demand) => demand,
            Err(e) => {
                warn!(error = %e, "could not compute connection usage, skipping cycle");
                return CycleOutcome::UsageUnavailable {
                    error: e.to_string(),
                };
            }
        };
        info!(
            demand = demand.total,
            headroom = demand.headroom,
            pods = demand.instances,
            reporting = demand.reporting,
            skipped = demand.skipped.len(),
            "current connection usage"
        );

        let current = state.current_tier().clone();
        let Some(desired) = self.tiers.fit(demand.total) else {
            warn!(
                demand = demand.total,
                current = %current.name(),
                largest_limit = self.tiers.largest().map_or(0, CapacityTier::connection_limit),
                "demand exceeds every tier, cannot scale up any more"
            );
            return CycleOutcome::Saturated {
                current,
                demand: demand.total,
            };
        };
        debug!(tier = %desired.name(), limit = desired.connection_limit(), "fitted tier");

        let decision = self.hysteresis.decide(state, desired, Instant::now());
        let direction = match decision {
            Decision::Unchanged => {
                info!(tier = %current.name(), demand = demand.total, "will not scale: {decision}");
                return CycleOutcome::Unchanged {
                    tier: current,
                    demand: demand.total,
                };
            }
            Decision::Blocked { remaining } => {
                info!(
                    current = %current.name(),
                    desired = %desired.name(),
                    remaining_secs = remaining.as_secs(),
                    window_secs = self.hysteresis.downscale_window().as_secs(),
                    "will not scale: {decision}"
                );
                return CycleOutcome::CooldownBlocked {
                    current,
                    desired: desired.clone(),
                    remaining,
                    demand: demand.total,
                };
            }
            Decision::Apply(direction) => direction,
        };

        info!(
            from = %current.name(),
            to = %desired.name(),
            ?direction,
            "need scaling"
        );

        if let Err(e) = self
            .applier
            .apply(desired.name(), self.operation_timeout.as_secs())
            .await
        {
            warn!(
                desired = %desired.name(),
                error = %e,
                "failed to change database capacity"
            );
            return CycleOutcome::ApplyFailed {
                desired: desired.clone(),
                demand: demand.total,
                error: e.to_string(),
            };
        }

        state.commit(desired.clone(), Instant::now());
        info!(tier = %desired.name(), "new capacity successfully applied");

        CycleOutcome::Applied {
            from: current,
            to: desired.clone(),
            demand: demand.total,
        }
    }

    /// Run the reconciliation loop until `shutdown` fires.
    ///
    /// Cycles run back to back with `interval` of idle time between the
    /// end of one cycle and the start of the next. Returns the final state.
    pub async fn run(
        &self,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> ScalingState {
        info!(interval_secs = interval.as_secs(), "autoscaler started");
        let mut state = ScalingState::new();
        let mut watching = true;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = self.reconcile(&mut state).await;
            debug!(?outcome, "cycle finished");

            if idle(interval, &mut shutdown, &mut watching).await {
                break;
            }
        }

        info!(tier = %state.current_tier().name(), "autoscaler shutting down");
        state
    }
}

/// Sleep for `interval`. Returns true when shutdown was requested meanwhile.
///
/// A closed channel stops the watch but not the loop.
async fn idle(interval: Duration, shutdown: &mut watch::Receiver<bool>, watching: &mut bool) -> bool {
    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = shutdown.changed(), if *watching => match changed {
                Ok(()) if *shutdown.borrow_and_update() => return true,
                Ok(()) => {}
                Err(_) => {
                    warn!("shutdown channel closed, running until the task is dropped");
                    *watching = false;
                }
            },
        }
    }
}
