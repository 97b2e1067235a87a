use crate::futures::SleepProvider;

/// A [`SleepProvider`] on Tokio's timer.
pub struct TokioSleep;
impl SleepProvider for TokioSleep {
    async fn sleep_for(dur: core::time::Duration) {
        tokio::time::sleep(dur).await
    }
}

/// A [`SleepProvider`] that ignores the requested duration and yields to
/// the scheduler immediately.
///
/// Turns the retry loop into a tight poll: lower latency to a freshly
/// released lock, more CPU under contention. Prefer [`TokioSleep`] unless
/// hold times are known to be very short.
pub struct TokioYield;
impl SleepProvider for TokioYield {
    async fn sleep_for(_dur: core::time::Duration) {
        tokio::task::yield_now().await
    }
}
