//! Time sources for the throttle.
//!
//! The throttle never reads the system clock directly. It asks a [`Clock`]
//! for the current time and asks the same clock to sleep, so that tests and
//! simulations can drive time by hand with a [`ManualClock`].

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A monotonic time source that can also block the calling thread.
///
/// Times are expressed as the [`Duration`] elapsed since the clock's own
/// origin. Only differences between readings of the same clock are
/// meaningful.
pub trait Clock: Send + Sync {
    /// Current time, measured from the clock's origin.
    fn now(&self) -> Duration;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall-clock time backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the moment of construction.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Default)]
struct ManualState {
    elapsed: Duration,
    sleepers: usize,
}

/// Hand-driven clock for tests and simulations.
///
/// Time only moves when [`ManualClock::advance`] is called, or, for an
/// auto-advancing clock, when a caller sleeps.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tollgate_throttle::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// clock.sleep(Duration::from_secs(60));
/// assert_eq!(clock.now(), Duration::from_secs(60));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ManualState>,
    advanced: Condvar,
    auto_advance: bool,
}

impl ManualClock {
    /// A clock where `sleep` moves time forward by the slept duration and
    /// returns immediately.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// A clock where `sleep` blocks until another thread has advanced time
    /// past the wake-up point.
    pub fn paused() -> Self {
        Self::build(false)
    }

    fn build(auto_advance: bool) -> Self {
        Self {
            state: Mutex::new(ManualState::default()),
            advanced: Condvar::new(),
            auto_advance,
        }
    }

    /// Move time forward and wake any sleepers whose deadline has passed.
    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        state.elapsed += by;
        self.advanced.notify_all();
    }

    /// Number of threads currently blocked in [`Clock::sleep`].
    ///
    /// Always zero for an auto-advancing clock.
    pub fn sleepers(&self) -> usize {
        self.lock().sleepers
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.lock().elapsed
    }

    fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }

        let mut state = self.lock();
        if self.auto_advance {
            state.elapsed += duration;
            self.advanced.notify_all();
            return;
        }

        let deadline = state.elapsed + duration;
        state.sleepers += 1;
        while state.elapsed < deadline {
            state = self
                .advanced
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.sleepers -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn manual_clock_advances_on_sleep() {
        let clock = ManualClock::new();
        clock.sleep(Duration::from_secs(5));
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(6));
        assert_eq!(clock.sleepers(), 0);
    }

    #[test]
    fn paused_clock_blocks_until_advanced() {
        let clock = Arc::new(ManualClock::paused());
        let sleeper = {
            let clock = Arc::clone(&clock);
            thread::spawn(move || {
                clock.sleep(Duration::from_secs(30));
                clock.now()
            })
        };

        while clock.sleepers() == 0 {
            thread::yield_now();
        }
        clock.advance(Duration::from_secs(10));
        assert_eq!(clock.sleepers(), 1);
        clock.advance(Duration::from_secs(20));

        let woke_at = sleeper.join().unwrap();
        assert_eq!(woke_at, Duration::from_secs(30));
    }
}
