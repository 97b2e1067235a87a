use core::future::Future;
use core::time::Duration;

/// Abstracts how the async lock retry loop waits between attempts.
///
/// Keeps the counter extension generic over runtimes like `Tokio` or
/// `Smol` without pulling either in unconditionally.
pub trait SleepProvider {
    /// Resolves after (at least) `dur` has passed.
    fn sleep_for(dur: Duration) -> impl Future<Output = ()> + Send;
}
