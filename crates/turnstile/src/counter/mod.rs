use core::time::Duration;

use crate::{Result, Sleeper, StdSleeper};
#[cfg(feature = "tracing")]
use tracing::instrument;

mod cache;
mod file;
mod memory;
#[cfg(test)]
mod tests;

pub use cache::*;
pub use file::*;
pub use memory::*;

/// The persistence primitive a counter backend must supply.
///
/// The shared lock/generate/commit/rollback/unlock workflow lives entirely
/// in [`Counter`]; a backend only decides how the exclusive claim and the
/// durable value are stored. At most one actor may hold the claim at a time
/// (enforcement strength is backend-dependent; see the individual stores).
pub trait CounterStore {
    /// Makes a single attempt to take the exclusive claim.
    ///
    /// Returns `Ok(Some(value))` with a snapshot of the persisted value
    /// taken atomically with the acquisition, or `Ok(None)` when another
    /// holder currently has the claim.
    fn try_acquire(&mut self) -> Result<Option<u64>>;

    /// Durably stores `value` together with the claim flag.
    ///
    /// `locked == false` releases the claim as part of the same operation;
    /// this is the commit/rollback path.
    fn persist(&mut self, locked: bool, value: u64) -> Result<()>;

    /// Releases the claim without touching the persisted value.
    fn release(&mut self) -> Result<()>;
}

/// The observable position of a counter within its lock cycle.
///
/// Returned by [`Counter::value`] so the three states the workflow
/// distinguishes (not locked, locked without a candidate, candidate
/// generated) stay distinguishable at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterStatus {
    /// No claim is held.
    Unlocked,
    /// The claim is held but no candidate value has been generated yet.
    Pending,
    /// A candidate value is staged and will be persisted by `commit`.
    Ready {
        /// The staged candidate.
        value: u64,
    },
}

/// A transactional counter: a value that can be exclusively claimed,
/// advanced past a caller-supplied floor, and then committed or rolled
/// back, with the claim released afterward.
///
/// The full cycle is `lock → generate → commit`, with `rollback`/`unlock`
/// as the failure exits. [`Counter::get_one`] runs the whole cycle;
/// the individual steps are public for callers that need finer control.
///
/// Each committed value is strictly greater than both the previously
/// committed value and the floor passed to [`Counter::generate`], so a
/// sequence of successful `get_one` calls is strictly increasing across
/// every process sharing the same backend.
///
/// # Example
///
/// ```
/// use turnstile::{Counter, MemoryStore};
/// use core::time::Duration;
///
/// let mut counter = Counter::new(MemoryStore::default());
/// let first = counter.get_one(0, Duration::ZERO, Duration::ZERO).unwrap();
/// let second = counter.get_one(0, Duration::ZERO, Duration::ZERO).unwrap();
/// assert_eq!(first, Some(1));
/// assert_eq!(second, Some(2));
/// ```
pub struct Counter<S, L = StdSleeper> {
    store: S,
    sleeper: L,
    locked: bool,
    old_value: Option<u64>,
    new_value: Option<u64>,
}

impl<S: CounterStore> Counter<S> {
    /// Creates a counter over `store` using the real clock for the retry
    /// loop.
    pub fn new(store: S) -> Self {
        Self::with_sleeper(store, StdSleeper::default())
    }
}

impl<S, L> Counter<S, L>
where
    S: CounterStore,
    L: Sleeper,
{
    /// Creates a counter with an explicit [`Sleeper`], letting tests drive
    /// the retry loop on simulated time.
    pub fn with_sleeper(store: S, sleeper: L) -> Self {
        Self {
            store,
            sleeper,
            locked: false,
            old_value: None,
            new_value: None,
        }
    }

    /// Borrows the underlying store, e.g. to inspect the persisted state.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutably borrows the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Makes a single attempt to claim the counter.
    ///
    /// On success the persisted value is snapshotted for the generate rule
    /// and for rollback. Calling `lock` while already holding the claim is
    /// a no-op returning `Ok(true)`.
    pub fn lock(&mut self) -> Result<bool> {
        if !self.locked
            && let Some(value) = self.store.try_acquire()?
        {
            self.old_value = Some(value);
            self.locked = true;
        }
        Ok(self.locked)
    }

    /// Returns whether this instance currently holds the claim.
    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Stages the next counter value: `max(base, persisted) + 1`.
    ///
    /// The result exceeds both what is already durably stored and any floor
    /// the caller demands. Returns `false` (without staging anything) when
    /// the counter is not locked.
    pub fn generate(&mut self, base: u64) -> bool {
        if !self.locked {
            return false;
        }
        let prior = self.old_value.unwrap_or(0);
        self.new_value = Some(base.max(prior) + 1);
        true
    }

    /// Reports where the counter is in its lock cycle.
    pub fn value(&self) -> CounterStatus {
        if !self.locked {
            CounterStatus::Unlocked
        } else {
            match self.new_value {
                Some(value) => CounterStatus::Ready { value },
                None => CounterStatus::Pending,
            }
        }
    }

    /// Persists the staged candidate and releases the claim.
    ///
    /// Returns `Ok(false)` when there is nothing to commit (not locked, or
    /// no candidate generated). On a persistence error the in-memory state
    /// is left untouched so the caller can still attempt [`Self::rollback`].
    pub fn commit(&mut self) -> Result<bool> {
        let Some(value) = self.new_value else {
            return Ok(false);
        };
        if !self.locked {
            return Ok(false);
        }
        self.store.persist(false, value)?;
        self.reset();
        Ok(true)
    }

    /// Discards the candidate, restores the pre-lock value, and releases
    /// the claim.
    ///
    /// Returns `Ok(false)` when the counter is not locked or no candidate
    /// was ever generated; in that case [`Self::unlock`] is the applicable
    /// release.
    pub fn rollback(&mut self) -> Result<bool> {
        let Some(old) = self.old_value else {
            return Ok(false);
        };
        if !self.locked || self.new_value.is_none() {
            return Ok(false);
        }
        self.store.persist(false, old)?;
        self.reset();
        Ok(true)
    }

    /// Releases the claim without touching the persisted value.
    ///
    /// Safe to call at any time: unlocking an already-unlocked counter is a
    /// no-op returning `Ok(true)`.
    pub fn unlock(&mut self) -> Result<bool> {
        if !self.locked {
            return Ok(true);
        }
        self.store.release()?;
        self.reset();
        Ok(true)
    }

    /// Polls [`Self::lock`] until it succeeds or the elapsed time reaches
    /// `timeout`, sleeping `sleep` between attempts.
    ///
    /// A zero `timeout` means a single attempt with no sleeping. This is a
    /// bounded busy-poll: no backend offers a wakeup signal, so whichever
    /// waiter polls first after a release wins. Returns the final locked
    /// state.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_lock_for(&mut self, timeout: Duration, sleep: Duration) -> Result<bool> {
        let start = self.sleeper.now();
        while !self.locked {
            self.lock()?;
            if self.locked || self.sleeper.now() - start >= timeout {
                break;
            }
            self.sleeper.sleep_for(sleep);
        }
        Ok(self.locked)
    }

    /// Runs one full cycle and returns the committed value.
    ///
    /// Locks (retrying within `timeout`), generates a value above both the
    /// persisted value and `base`, and commits. `Ok(None)` means the lock
    /// could not be acquired in time — an expected outcome, not an error.
    /// If the commit fails, a rollback is attempted (falling back to a
    /// forced unlock) and the persistence error is re-raised.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn get_one(&mut self, base: u64, timeout: Duration, sleep: Duration) -> Result<Option<u64>> {
        if !self.try_lock_for(timeout, sleep)? {
            return Ok(None);
        }
        self.generate(base);
        self.finish_cycle()
    }

    /// Sets the counter to a literal value, subject to the same locking and
    /// commit/rollback handling as [`Self::get_one`].
    ///
    /// Returns `Ok(false)` when the lock could not be acquired in time.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn set_to(&mut self, value: u64, timeout: Duration, sleep: Duration) -> Result<bool> {
        if !self.try_lock_for(timeout, sleep)? {
            return Ok(false);
        }
        self.stage(value);
        self.finish_cycle().map(|v| v.is_some())
    }

    /// Stages `value` as the candidate directly, bypassing the generate
    /// rule. Used by `set_to` and the async extension.
    pub(crate) fn stage(&mut self, value: u64) {
        if self.locked {
            self.new_value = Some(value);
        }
    }

    /// Commits the staged candidate, rolling back (or force-unlocking) on
    /// failure before re-raising.
    pub(crate) fn finish_cycle(&mut self) -> Result<Option<u64>> {
        let CounterStatus::Ready { value } = self.value() else {
            let _ = self.unlock();
            return Ok(None);
        };
        match self.commit() {
            Ok(true) => Ok(Some(value)),
            Ok(false) => {
                let _ = self.unlock();
                Ok(None)
            }
            Err(err) => {
                if !matches!(self.rollback(), Ok(true)) {
                    let _ = self.unlock();
                }
                Err(err)
            }
        }
    }

    fn reset(&mut self) {
        self.locked = false;
        self.old_value = None;
        self.new_value = None;
    }
}
