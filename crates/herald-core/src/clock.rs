//! Time source abstraction.
//!
//! Every deadline decision in herald is a comparison of "now" against a
//! timestamp captured when an action arrived. Threading a `Clock` through the
//! components lets tests pin "now" to exact offsets (one millisecond either
//! side of a threshold) without sleeping or pausing a runtime.
//!
//! Production code uses [`SystemClock`]; tests use the simulated clock from
//! `herald-test-utils`.

use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::time::Duration;

/// A source of the current time.
///
/// Object-safe so components can hold an `Arc<dyn Clock>`.
pub trait Clock: Send + Sync + Debug + 'static {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the elapsed time since `earlier`, saturating to zero if
    /// `earlier` is in the future.
    fn elapsed_since(&self, earlier: DateTime<Utc>) -> Duration {
        (self.now() - earlier).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Wall-clock time source for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn elapsed_since_saturates_for_future_timestamps() {
        let clock = SystemClock;
        let future = clock.now() + chrono::Duration::hours(1);
        assert_eq!(clock.elapsed_since(future), Duration::ZERO);
    }
}
