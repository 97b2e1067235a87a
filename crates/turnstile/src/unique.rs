use core::time::Duration;

use crate::{Alphabet, Counter, CounterStore, Result, Sleeper, SystemClock, TimeSource};

/// Produces identifiers composed from wall-clock seconds, an optional
/// counter-backed disambiguator, and an optional shard partition, encoded
/// as an integer, lowercase hex, or a custom-alphabet string.
///
/// The raw component is `current_secs - zero_time`, so uniqueness of a bare
/// [`Self::generate`] holds only at second granularity. Attach a
/// [`Counter`] via [`Self::generate_with`] to keep ids distinct and
/// strictly ordered within the same second — and across processes, when
/// the counter uses a shared backend.
///
/// Setters return `&mut Self` so configuration chains:
///
/// ```
/// use turnstile::{Alphabet, TimeSource, UniqueGenerator};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_secs(&self) -> u64 {
///         1_000_255
///     }
/// }
///
/// let mut ids = UniqueGenerator::with_clock(1_000_000, FixedTime);
/// assert_eq!(ids.generate().as_int(), 255);
/// assert_eq!(ids.as_hex(), "ff");
/// ```
pub struct UniqueGenerator<T = SystemClock> {
    zero_time: u64,
    alphabet: Alphabet,
    sharding_count: u64,
    sharding_number: u64,
    value: u128,
    clock: T,
}

impl UniqueGenerator<SystemClock> {
    /// Creates a generator anchored at `zero_time` (seconds since the Unix
    /// epoch), reading the system clock.
    ///
    /// A negative `zero_time` is clamped to 0. [`crate::CUSTOM_EPOCH_SECS`]
    /// is a reasonable anchor for new id spaces.
    pub fn new(zero_time: i64) -> Self {
        Self::with_clock(zero_time, SystemClock)
    }
}

impl<T: TimeSource> UniqueGenerator<T> {
    /// Like [`UniqueGenerator::new`] but with an explicit [`TimeSource`].
    pub fn with_clock(zero_time: i64, clock: T) -> Self {
        Self {
            zero_time: zero_time.max(0) as u64,
            alphabet: Alphabet::default(),
            sharding_count: 0,
            sharding_number: 0,
            value: 0,
            clock,
        }
    }

    /// Sets the symbol set used by [`Self::as_string`].
    ///
    /// Uniqueness and ordering of symbols were already validated when the
    /// [`Alphabet`] was constructed, so this cannot fail.
    pub fn set_alphabet(&mut self, alphabet: Alphabet) -> &mut Self {
        self.alphabet = alphabet;
        self
    }

    /// Partitions the id space across `count` generators, this one being
    /// `number`.
    ///
    /// The scheme is residue-class interleaving: the composed value becomes
    /// `value * count + number`, so shard `k` owns exactly the ids equal to
    /// `k` modulo `count`, and ordering within a shard is preserved. If
    /// either argument is negative, both reset to 0 and sharding is
    /// disabled.
    pub fn set_sharding(&mut self, count: i64, number: i64) -> &mut Self {
        if count < 0 || number < 0 {
            self.sharding_count = 0;
            self.sharding_number = 0;
        } else {
            self.sharding_count = count as u64;
            self.sharding_number = number as u64;
        }
        self
    }

    /// Generates an id from the clock alone.
    ///
    /// Two calls within the same wall-clock second produce the same value;
    /// use [`Self::generate_with`] when that matters.
    pub fn generate(&mut self) -> &mut Self {
        let raw = self.raw_now();
        self.value = self.compose(raw, None);
        self
    }

    /// Generates an id disambiguated by one full `get_one` cycle on
    /// `counter`.
    ///
    /// The committed counter value occupies the high component of the id
    /// (`seq << 32 | raw`), so ids are strictly increasing in commit order
    /// and distinct even within one second. Returns `Ok(None)` when the
    /// counter lock could not be acquired within `timeout` — the counter's
    /// own sentinel, passed through untouched.
    pub fn generate_with<S, L>(
        &mut self,
        counter: &mut Counter<S, L>,
        timeout: Duration,
        sleep: Duration,
    ) -> Result<Option<&mut Self>>
    where
        S: CounterStore,
        L: Sleeper,
    {
        let raw = self.raw_now();
        let Some(seq) = counter.get_one(0, timeout, sleep)? else {
            return Ok(None);
        };
        self.value = self.compose(raw, Some(seq));
        Ok(Some(self))
    }

    /// The latest generated value as an integer. 0 before any generation.
    pub fn as_int(&self) -> u128 {
        self.value
    }

    /// The latest generated value in lowercase hexadecimal.
    pub fn as_hex(&self) -> String {
        Alphabet::hex().encode(self.value)
    }

    /// The latest generated value over the configured alphabet (default:
    /// digits + lowercase + uppercase latin, radix 62).
    pub fn as_string(&self) -> String {
        self.alphabet.encode(self.value)
    }

    fn raw_now(&self) -> u64 {
        self.clock.current_secs().saturating_sub(self.zero_time)
    }

    fn compose(&self, raw: u64, seq: Option<u64>) -> u128 {
        let mut value = match seq {
            Some(seq) => (u128::from(seq) << 32) | u128::from(raw & 0xFFFF_FFFF),
            None => u128::from(raw),
        };
        if self.sharding_count > 0 {
            value = value * u128::from(self.sharding_count) + u128::from(self.sharding_number);
        }
        value
    }
}
