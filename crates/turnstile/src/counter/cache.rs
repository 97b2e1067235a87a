use std::collections::HashMap;

use crate::{Counter, CounterStore, Error, Result};

/// The cache-store contract the cache backend consumes.
///
/// This is the external collaborator boundary: any shared item cache with
/// has/get/set/delete semantics (memcached, Redis, an app-level pool) can
/// back a counter by implementing these four calls. Values are the `u64`s
/// the counter needs; adapters own any serialization.
///
/// `set_item` and `delete_item` report success as `bool` rather than
/// erroring — a failed write mid-transaction becomes
/// [`Error::Persistence`] in the backend.
pub trait CachePool {
    /// Whether `key` currently exists in the cache.
    fn has_item(&self, key: &str) -> bool;

    /// The value stored at `key`, if any.
    fn get_item(&self, key: &str) -> Option<u64>;

    /// Stores `value` at `key`. Returns `false` on failure.
    fn set_item(&mut self, key: &str, value: u64) -> bool;

    /// Removes `key`. Returns `false` when the delete failed.
    fn delete_item(&mut self, key: &str) -> bool;
}

/// A counter persisted in a shared item cache.
///
/// Two keys are derived from a caller-chosen prefix: `"<prefix>.lock"`, the
/// mutual-exclusion token (its mere existence means "claimed"), and
/// `"<prefix>.value"`, the protected value.
///
/// # Accepted race
///
/// The acquisition sequence — check the lock key is absent, then create it —
/// is **not** atomic against the underlying cache. Two actors polling at the
/// same moment can both observe absence and both believe they hold the
/// claim. Use this backend where contention is low, or supply a
/// [`CachePool`] whose `set_item` is backed by an atomic create-if-absent.
pub struct CacheStore<P> {
    pool: P,
    key_lock: String,
    key_value: String,
}

/// A [`Counter`] over a [`CacheStore`].
pub type CacheCounter<P> = Counter<CacheStore<P>>;

impl<P: CachePool> CacheStore<P> {
    /// Wraps `pool`, deriving the lock and value keys from `prefix`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `prefix` is empty.
    pub fn new(pool: P, prefix: &str) -> Result<Self> {
        if prefix.is_empty() {
            return Err(Error::InvalidArgument {
                reason: "empty cache key prefix".into(),
            });
        }
        Ok(Self {
            pool,
            key_lock: format!("{prefix}.lock"),
            key_value: format!("{prefix}.value"),
        })
    }

    /// The wrapped pool, for inspection.
    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Mutably borrows the wrapped pool.
    pub fn pool_mut(&mut self) -> &mut P {
        &mut self.pool
    }

    /// Deletes the lock key, releasing the claim.
    fn drop_claim(&mut self) -> Result<()> {
        if !self.pool.has_item(&self.key_lock) {
            return Err(Error::Inconsistent {
                context: format!("claim held but lock key {:?} is gone", self.key_lock),
            });
        }
        if !self.pool.delete_item(&self.key_lock) {
            return Err(Error::Persistence {
                context: format!("cache refused to delete lock key {:?}", self.key_lock),
            });
        }
        Ok(())
    }
}

impl<P: CachePool> CounterStore for CacheStore<P> {
    fn try_acquire(&mut self) -> Result<Option<u64>> {
        if self.pool.has_item(&self.key_lock) {
            return Ok(None);
        }
        // Check-then-act window: see the type-level docs.
        set_or_fail(&mut self.pool, &self.key_lock, 1)?;
        let value = match self.pool.get_item(&self.key_value) {
            Some(value) => value,
            None => {
                set_or_fail(&mut self.pool, &self.key_value, 0)?;
                0
            }
        };
        Ok(Some(value))
    }

    fn persist(&mut self, held: bool, value: u64) -> Result<()> {
        // Value first, claim release second: a waiter that observes the
        // lock key gone must already see the committed value.
        set_or_fail(&mut self.pool, &self.key_value, value)?;
        if !held {
            self.drop_claim()?;
        }
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.drop_claim()
    }
}

fn set_or_fail<P: CachePool>(pool: &mut P, key: &str, value: u64) -> Result<()> {
    if pool.set_item(key, value) {
        Ok(())
    } else {
        Err(Error::Persistence {
            context: format!("cache refused to store key {key:?}"),
        })
    }
}

/// A process-local [`CachePool`] over a `HashMap`.
///
/// Exists so the cache backend can be exercised without an external cache;
/// it offers none of the cross-process visibility a real pool would.
#[derive(Debug, Default)]
pub struct MemoryPool {
    items: HashMap<String, u64>,
}

impl CachePool for MemoryPool {
    fn has_item(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    fn get_item(&self, key: &str) -> Option<u64> {
        self.items.get(key).copied()
    }

    fn set_item(&mut self, key: &str, value: u64) -> bool {
        self.items.insert(key.to_owned(), value);
        true
    }

    fn delete_item(&mut self, key: &str) -> bool {
        self.items.remove(key).is_some()
    }
}
