use std::sync::{MutexGuard, PoisonError};

pub type Result<T> = core::result::Result<T, Error>;

/// All error variants that `turnstile` can emit.
///
/// Failing to acquire a counter lock within a timeout budget is *not* an
/// error: the lock-cycle APIs report it as `Ok(None)` / `Ok(false)` and
/// callers are expected to check the sentinel.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A caller-supplied value failed validation (empty key prefix or file
    /// path, duplicate symbols in an alphabet, radix below 2, undecodable
    /// input).
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The counter file could not be read, written, or created.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A cache write or delete reported failure while the state machine was
    /// mid-transaction. The driver attempts rollback (or a forced unlock)
    /// before re-raising this.
    #[error("persistence failure: {context}")]
    Persistence { context: String },

    /// The backend is in a state the state machine did not expect, e.g. the
    /// lock key vanished while the counter believes it holds the claim, or
    /// the counter file contains something other than `"<0|1>:<value>"`.
    #[error("counter state inconsistent: {context}")]
    Inconsistent { context: String },

    /// Another thread panicked while holding the in-memory counter slot.
    #[error("shared counter slot poisoned")]
    LockPoisoned,
}

// Collapse poisoned-mutex errors from the in-memory backend.
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
