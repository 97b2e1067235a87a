use std::time::{SystemTime, UNIX_EPOCH};

/// Custom epoch: Wednesday, January 1, 2025 00:00:00 UTC, in seconds.
///
/// A convenient `zero_time` for [`crate::UniqueGenerator`] when ids only
/// need to be unique going forward: anchoring at a recent origin keeps the
/// raw component (and therefore the encoded string) short.
pub const CUSTOM_EPOCH_SECS: i64 = 1_735_689_600;

/// A time source returning wall-clock seconds since the Unix epoch.
///
/// This abstraction exists so tests can pin the clock instead of racing the
/// real one.
///
/// # Example
///
/// ```
/// use turnstile::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_secs(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_secs(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current wall-clock time in whole seconds since
    /// 1970-01-01 UTC.
    fn current_secs(&self) -> u64;
}

/// The real system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX_EPOCH")
            .as_secs()
    }
}
