use core::time::Duration;
use std::thread;
use std::time::Instant;

/// The clock-and-sleep pair driving the lock retry loop.
///
/// [`Counter::try_lock_for`] is a cooperative busy-poll: attempt the lock,
/// check the elapsed budget, sleep, retry. Both the elapsed-time reading and
/// the sleep go through this trait so tests can simulate a full timeout
/// without actually waiting.
///
/// [`Counter::try_lock_for`]: crate::Counter::try_lock_for
pub trait Sleeper {
    /// Monotonic elapsed time since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Blocks the current thread for `dur`.
    fn sleep_for(&self, dur: Duration);
}

/// A [`Sleeper`] backed by [`Instant`] and [`thread::sleep`].
#[derive(Debug)]
pub struct StdSleeper {
    origin: Instant,
}

impl Default for StdSleeper {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Sleeper for StdSleeper {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep_for(&self, dur: Duration) {
        thread::sleep(dur);
    }
}
