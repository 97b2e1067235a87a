use std::sync::{Arc, Mutex};

use crate::{Counter, CounterStore, Result};

#[derive(Debug, Default)]
struct Slot {
    held: bool,
    value: u64,
}

/// A counter slot living entirely in process memory.
///
/// The state is a caller-owned handle: cloning a `MemoryStore` yields
/// another handle to the *same* slot, so several [`Counter`] instances (or
/// threads) within one process can contend for it. There is no cross-process
/// guarantee whatsoever — this backend exists for tests and single-process
/// use; reach for [`FileStore`] or [`CacheStore`] when other processes are
/// involved.
///
/// [`FileStore`]: crate::FileStore
/// [`CacheStore`]: crate::CacheStore
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    shared: Arc<Mutex<Slot>>,
}

/// A [`Counter`] over a [`MemoryStore`].
pub type MemoryCounter = Counter<MemoryStore>;

impl MemoryStore {
    /// Creates a slot starting at `value`, unclaimed.
    pub fn starting_at(value: u64) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Slot { held: false, value })),
        }
    }

    /// Reads the persisted value, ignoring any claim.
    pub fn peek(&self) -> Result<u64> {
        Ok(self.shared.lock()?.value)
    }
}

impl CounterStore for MemoryStore {
    fn try_acquire(&mut self) -> Result<Option<u64>> {
        let mut slot = self.shared.lock()?;
        if slot.held {
            return Ok(None);
        }
        slot.held = true;
        Ok(Some(slot.value))
    }

    fn persist(&mut self, held: bool, value: u64) -> Result<()> {
        let mut slot = self.shared.lock()?;
        slot.held = held;
        slot.value = value;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.shared.lock()?.held = false;
        Ok(())
    }
}
