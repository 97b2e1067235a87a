use smol::Timer;

use crate::futures::SleepProvider;

/// A [`SleepProvider`] on Smol's timer.
pub struct SmolSleep;
impl SleepProvider for SmolSleep {
    async fn sleep_for(dur: core::time::Duration) {
        Timer::after(dur).await;
    }
}

/// A [`SleepProvider`] that ignores the requested duration and yields to
/// the scheduler immediately. See `TokioYield` for the trade-off.
pub struct SmolYield;
impl SleepProvider for SmolYield {
    async fn sleep_for(_dur: core::time::Duration) {
        smol::future::yield_now().await;
    }
}
