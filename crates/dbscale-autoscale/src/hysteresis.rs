//! Hysteresis controller — decides whether a fitted tier is applied now.
//!
//! Only downscales are gated. After any successful change, a downscale
//! must wait out the forbidden window; upscales go through immediately
//! because running short of connections is worse than paying for an
//! extra tier for a while.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use dbscale_core::CapacityTier;

/// The autoscaler's view of the cluster: the last tier it applied and
/// when. Starts at the "Unknown" tier with no change recorded.
#[derive(Debug, Clone)]
pub struct ScalingState {
    current: CapacityTier,
    last_change_at: Option<Instant>,
}

impl ScalingState {
    pub fn new() -> Self {
        Self {
            current: CapacityTier::unknown(),
            last_change_at: None,
        }
    }

    pub fn current_tier(&self) -> &CapacityTier {
        &self.current
    }

    pub fn last_change_at(&self) -> Option<Instant> {
        self.last_change_at
    }

    /// Record a confirmed, successfully applied change.
    pub(crate) fn commit(&mut self, tier: CapacityTier, at: Instant) {
        self.current = tier;
        self.last_change_at = Some(at);
    }
}

impl Default for ScalingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction of an applied change, by connection limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    /// Different tier, same limit.
    Lateral,
}

/// Outcome of a hysteresis check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Desired tier is already the current tier.
    Unchanged,
    /// Downscale inside the forbidden window.
    Blocked { remaining: Duration },
    /// Go ahead and apply.
    Apply(Direction),
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Unchanged => write!(f, "desired tier equals current tier"),
            Decision::Blocked { remaining } => write!(
                f,
                "still within the downscale forbidden window ({}s remaining)",
                remaining.as_secs()
            ),
            Decision::Apply(Direction::Up) => write!(f, "scaling up"),
            Decision::Apply(Direction::Down) => write!(f, "scaling down"),
            Decision::Apply(Direction::Lateral) => write!(f, "switching to an equal-limit tier"),
        }
    }
}

/// Applies the downscale cooldown.
#[derive(Debug, Clone, Copy)]
pub struct HysteresisController {
    downscale_window: Duration,
}

impl HysteresisController {
    pub fn new(downscale_window: Duration) -> Self {
        Self { downscale_window }
    }

    pub fn downscale_window(&self) -> Duration {
        self.downscale_window
    }

    /// Decide whether `desired` should be applied at `now`.
    pub fn decide(&self, state: &ScalingState, desired: &CapacityTier, now: Instant) -> Decision {
        let current = state.current_tier();
        if desired == current {
            return Decision::Unchanged;
        }

        let direction = match desired.connection_limit().cmp(&current.connection_limit()) {
            std::cmp::Ordering::Less => Direction::Down,
            std::cmp::Ordering::Greater => Direction::Up,
            std::cmp::Ordering::Equal => Direction::Lateral,
        };

        if direction == Direction::Down
            && let Some(remaining) = self.cooldown_remaining(state, now)
        {
            return Decision::Blocked { remaining };
        }

        Decision::Apply(direction)
    }

    /// Time left before a downscale is allowed, or `None` if it already is.
    /// With no change on record the window counts as elapsed.
    pub fn cooldown_remaining(&self, state: &ScalingState, now: Instant) -> Option<Duration> {
        let last = state.last_change_at()?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.downscale_window {
            Some(self.downscale_window - elapsed)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(600);

    fn small() -> CapacityTier {
        CapacityTier::new("1", 100)
    }

    fn medium() -> CapacityTier {
        CapacityTier::new("2", 500)
    }

    fn large() -> CapacityTier {
        CapacityTier::new("4", 1000)
    }

    fn settled(tier: CapacityTier, at: Instant) -> ScalingState {
        let mut state = ScalingState::new();
        state.commit(tier, at);
        state
    }

    #[test]
    fn initial_state_is_unknown() {
        let state = ScalingState::default();
        assert!(state.current_tier().is_unknown());
        assert!(state.last_change_at().is_none());
    }

    #[test]
    fn same_tier_is_unchanged() {
        let controller = HysteresisController::new(WINDOW);
        let t0 = Instant::now();
        let state = settled(medium(), t0);
        assert_eq!(controller.decide(&state, &medium(), t0), Decision::Unchanged);
        assert_eq!(
            controller.decide(&state, &medium(), t0 + Duration::from_secs(10_000)),
            Decision::Unchanged
        );
    }

    #[test]
    fn first_change_from_unknown_applies() {
        let controller = HysteresisController::new(WINDOW);
        let decision = controller.decide(&ScalingState::new(), &small(), Instant::now());
        assert_eq!(decision, Decision::Apply(Direction::Up));
    }

    #[test]
    fn initial_downscale_is_never_blocked() {
        let controller = HysteresisController::new(WINDOW);
        let mut state = ScalingState::new();
        // Pretend the cluster was seeded at a large tier without a recorded change.
        state.current = large();
        let decision = controller.decide(&state, &small(), Instant::now());
        assert_eq!(decision, Decision::Apply(Direction::Down));
    }

    #[test]
    fn downscale_inside_window_is_blocked() {
        let controller = HysteresisController::new(WINDOW);
        let t0 = Instant::now();
        let state = settled(medium(), t0);

        let decision = controller.decide(&state, &small(), t0 + Duration::from_secs(5));
        assert_eq!(
            decision,
            Decision::Blocked {
                remaining: Duration::from_secs(595)
            }
        );
    }

    #[test]
    fn downscale_after_window_applies() {
        let controller = HysteresisController::new(WINDOW);
        let t0 = Instant::now();
        let state = settled(medium(), t0);

        assert_eq!(
            controller.decide(&state, &small(), t0 + Duration::from_secs(601)),
            Decision::Apply(Direction::Down)
        );
        // Exactly at the window boundary the window has elapsed.
        assert_eq!(
            controller.decide(&state, &small(), t0 + WINDOW),
            Decision::Apply(Direction::Down)
        );
    }

    #[test]
    fn upscale_is_never_blocked() {
        let controller = HysteresisController::new(WINDOW);
        let t0 = Instant::now();
        let state = settled(small(), t0);

        for secs in [0, 1, 5, 599, 600, 601] {
            assert_eq!(
                controller.decide(&state, &large(), t0 + Duration::from_secs(secs)),
                Decision::Apply(Direction::Up),
                "upscale blocked at +{secs}s"
            );
        }
    }

    #[test]
    fn equal_limit_switch_is_not_gated() {
        let controller = HysteresisController::new(WINDOW);
        let t0 = Instant::now();
        let state = settled(medium(), t0);
        let twin = CapacityTier::new("2b", 500);
        assert_eq!(
            controller.decide(&state, &twin, t0 + Duration::from_secs(1)),
            Decision::Apply(Direction::Lateral)
        );
    }

    #[test]
    fn zero_window_never_blocks() {
        let controller = HysteresisController::new(Duration::ZERO);
        let t0 = Instant::now();
        let state = settled(large(), t0);
        assert_eq!(
            controller.decide(&state, &small(), t0),
            Decision::Apply(Direction::Down)
        );
    }

    #[test]
    fn commit_updates_tier_and_time() {
        let t0 = Instant::now();
        let mut state = ScalingState::new();
        state.commit(medium(), t0);
        assert_eq!(state.current_tier(), &medium());
        assert_eq!(state.last_change_at(), Some(t0));
    }

    #[test]
    fn decision_display() {
        assert_eq!(Decision::Unchanged.to_string(), "desired tier equals current tier");
        assert_eq!(
            Decision::Blocked {
                remaining: Duration::from_secs(42)
            }
            .to_string(),
            "still within the downscale forbidden window (42s remaining)"
        );
    }
}
