use core::future::Future;
use core::time::Duration;
use std::time::Instant;

use super::SleepProvider;
use crate::{Counter, CounterStore, Result, Sleeper};

/// Extension trait running the counter lock cycle in async contexts.
///
/// The synchronous [`Counter::get_one`] parks the thread between lock
/// attempts; these variants yield to the runtime instead, waiting through a
/// [`SleepProvider`]. The store I/O itself stays synchronous — critical
/// sections are a single small read-modify-write.
pub trait CounterAsyncExt {
    /// Async counterpart of [`Counter::get_one`]: resolves to the committed
    /// value, or `None` when the lock could not be acquired within
    /// `timeout`.
    fn get_one_async<S>(
        &mut self,
        base: u64,
        timeout: Duration,
        sleep: Duration,
    ) -> impl Future<Output = Result<Option<u64>>>
    where
        S: SleepProvider;

    /// Async counterpart of [`Counter::set_to`].
    fn set_to_async<S>(
        &mut self,
        value: u64,
        timeout: Duration,
        sleep: Duration,
    ) -> impl Future<Output = Result<bool>>
    where
        S: SleepProvider;
}

impl<St, L> CounterAsyncExt for Counter<St, L>
where
    St: CounterStore,
    L: Sleeper,
{
    async fn get_one_async<S>(
        &mut self,
        base: u64,
        timeout: Duration,
        sleep: Duration,
    ) -> Result<Option<u64>>
    where
        S: SleepProvider,
    {
        if !try_lock_async::<S, _, _>(self, timeout, sleep).await? {
            return Ok(None);
        }
        self.generate(base);
        self.finish_cycle()
    }

    async fn set_to_async<S>(
        &mut self,
        value: u64,
        timeout: Duration,
        sleep: Duration,
    ) -> Result<bool>
    where
        S: SleepProvider,
    {
        if !try_lock_async::<S, _, _>(self, timeout, sleep).await? {
            return Ok(false);
        }
        self.stage(value);
        self.finish_cycle().map(|v| v.is_some())
    }
}

/// The busy-poll from [`Counter::try_lock_for`], with the inter-attempt
/// sleep handed to the runtime. The deadline runs on real time.
async fn try_lock_async<S, St, L>(
    counter: &mut Counter<St, L>,
    timeout: Duration,
    sleep: Duration,
) -> Result<bool>
where
    S: SleepProvider,
    St: CounterStore,
    L: Sleeper,
{
    let start = Instant::now();
    while !counter.locked() {
        counter.lock()?;
        if counter.locked() || start.elapsed() >= timeout {
            break;
        }
        S::sleep_for(sleep).await;
    }
    Ok(counter.locked())
}
