//! Simulated time for deterministic tests.
//!
//! The response controller's tier decisions are pure functions of elapsed
//! time; pinning "now" to exact offsets makes the threshold boundaries
//! testable to the millisecond without sleeping.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use herald_core::Clock;

/// Simulated clock with manually advanced time.
///
/// Starts at a deterministic epoch so recorded timestamps are stable
/// across runs. Cheap to clone via `Arc`.
#[derive(Debug)]
pub struct SimulatedClock {
    /// Base time (start of simulation).
    base: DateTime<Utc>,
    /// Elapsed milliseconds since base.
    elapsed_ms: AtomicU64,
}

impl SimulatedClock {
    /// Creates a new simulated clock starting at the given time.
    #[must_use]
    pub fn new(base: DateTime<Utc>) -> Self {
        Self {
            base,
            elapsed_ms: AtomicU64::new(0),
        }
    }

    /// Creates a clock anchored at the Unix epoch, wrapped for sharing.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        let base = Utc
            .timestamp_millis_opt(0)
            .single()
            .expect("valid epoch timestamp");
        Arc::new(Self::new(base))
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        self.elapsed_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Advances the clock to an absolute offset from the base.
    ///
    /// # Panics
    ///
    /// Panics if the target offset is before the current simulated time.
    pub fn advance_to(&self, offset: Duration) {
        let target_ms = offset.as_millis() as u64;
        let current = self.elapsed_ms.load(Ordering::Relaxed);
        assert!(
            target_ms >= current,
            "cannot move clock backwards: current={current}ms, target={target_ms}ms"
        );
        self.elapsed_ms.store(target_ms, Ordering::Relaxed);
    }

    /// Returns elapsed time since simulation start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::Relaxed))
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.elapsed_ms.load(Ordering::Relaxed);
        self.base + chrono::Duration::milliseconds(elapsed as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_advancement() {
        let clock = SimulatedClock::shared();
        let start = clock.now();

        clock.advance(Duration::from_secs(10));
        let after = clock.now();

        assert_eq!((after - start).num_seconds(), 10);
        assert_eq!(clock.elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn advance_to_is_absolute() {
        let clock = SimulatedClock::shared();
        clock.advance_to(Duration::from_millis(799));
        clock.advance_to(Duration::from_millis(801));
        assert_eq!(clock.elapsed(), Duration::from_millis(801));
    }

    #[test]
    #[should_panic(expected = "cannot move clock backwards")]
    fn advance_to_rejects_moving_backwards() {
        let clock = SimulatedClock::shared();
        clock.advance_to(Duration::from_millis(500));
        clock.advance_to(Duration::from_millis(100));
    }

    #[test]
    fn epoch_anchored_clocks_agree() {
        let a = SimulatedClock::shared();
        let b = SimulatedClock::shared();
        assert_eq!(a.now(), b.now());
    }
}
