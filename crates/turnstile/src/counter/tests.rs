use core::cell::Cell;
use core::time::Duration;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use crate::{
    CachePool, CacheStore, Counter, CounterStatus, CounterStore, Error, FileCounter, FileStore,
    MemoryPool, MemoryStore, Sleeper,
};

/// A [`Sleeper`] on simulated time: `now` advances only when the retry loop
/// sleeps, and every sleep is counted.
#[derive(Default)]
struct MockSleeper {
    now: Cell<Duration>,
    sleeps: Cell<usize>,
}

impl Sleeper for Rc<MockSleeper> {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep_for(&self, dur: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.now.set(self.now.get() + dur);
    }
}

fn run_status_progression<S: CounterStore>(mut counter: Counter<S>) {
    assert_eq!(counter.value(), CounterStatus::Unlocked);
    assert!(counter.lock().unwrap());
    assert_eq!(counter.value(), CounterStatus::Pending);
    assert!(counter.generate(0));
    assert!(matches!(counter.value(), CounterStatus::Ready { .. }));
    assert!(counter.commit().unwrap());
    assert_eq!(counter.value(), CounterStatus::Unlocked);
}

fn run_monotonic_commits<S: CounterStore>(mut counter: Counter<S>) {
    let mut last = 0;
    for _ in 0..5 {
        let value = counter
            .get_one(0, Duration::ZERO, Duration::ZERO)
            .unwrap()
            .expect("uncontended lock");
        assert!(value > last);
        last = value;
    }
}

fn run_unlock_is_idempotent<S: CounterStore>(mut counter: Counter<S>) {
    assert!(counter.unlock().unwrap());
    assert!(counter.unlock().unwrap());
    assert!(counter.lock().unwrap());
    assert!(counter.unlock().unwrap());
    assert!(counter.unlock().unwrap());
}

mod memory {
    use super::*;

    #[test]
    fn status_progression() {
        run_status_progression(Counter::new(MemoryStore::default()));
    }

    #[test]
    fn monotonic_commits() {
        run_monotonic_commits(Counter::new(MemoryStore::default()));
    }

    #[test]
    fn unlock_is_idempotent() {
        run_unlock_is_idempotent(Counter::new(MemoryStore::default()));
    }

    #[test]
    fn generate_exceeds_base_and_prior() {
        let store = MemoryStore::starting_at(10);
        let mut counter = Counter::new(store);

        // floor below the persisted value
        assert!(counter.lock().unwrap());
        assert!(counter.generate(5));
        assert_eq!(counter.value(), CounterStatus::Ready { value: 11 });
        assert!(counter.commit().unwrap());
        assert_eq!(counter.store().peek().unwrap(), 11);

        // floor above the persisted value
        let got = counter
            .get_one(20, Duration::ZERO, Duration::ZERO)
            .unwrap();
        assert_eq!(got, Some(21));
    }

    #[test]
    fn commit_requires_a_candidate() {
        let mut counter = Counter::new(MemoryStore::default());
        assert!(counter.lock().unwrap());
        assert!(!counter.commit().unwrap());
        assert!(counter.locked());
        assert!(counter.unlock().unwrap());
    }

    #[test]
    fn commit_requires_the_lock() {
        let mut counter = Counter::new(MemoryStore::default());
        assert!(!counter.commit().unwrap());
    }

    #[test]
    fn rollback_restores_the_snapshot() {
        let mut counter = Counter::new(MemoryStore::starting_at(5));
        assert!(counter.lock().unwrap());
        assert!(counter.generate(0));
        assert_eq!(counter.value(), CounterStatus::Ready { value: 6 });
        assert!(counter.rollback().unwrap());
        assert!(!counter.locked());
        assert_eq!(counter.store().peek().unwrap(), 5);
    }

    #[test]
    fn rollback_without_a_candidate_is_inapplicable() {
        let mut counter = Counter::new(MemoryStore::starting_at(5));
        assert!(counter.lock().unwrap());
        assert!(!counter.rollback().unwrap());
        assert!(counter.locked());
        assert!(counter.unlock().unwrap());
        assert_eq!(counter.store().peek().unwrap(), 5);
    }

    #[test]
    fn set_to_writes_the_literal_value() {
        let store = MemoryStore::default();
        let mut counter = Counter::new(store.clone());
        assert!(counter.set_to(100, Duration::ZERO, Duration::ZERO).unwrap());
        assert_eq!(store.peek().unwrap(), 100);
        let got = counter.get_one(0, Duration::ZERO, Duration::ZERO).unwrap();
        assert_eq!(got, Some(101));
    }

    #[test]
    fn cloned_handles_share_one_slot() {
        let store = MemoryStore::default();
        let mut first = Counter::new(store.clone());
        let mut second = Counter::new(store);

        assert!(first.lock().unwrap());
        assert!(!second.lock().unwrap());
        assert!(first.unlock().unwrap());
        assert!(second.lock().unwrap());
    }

    #[test]
    fn zero_timeout_makes_one_attempt_without_sleeping() {
        let store = MemoryStore::default();
        let mut holder = Counter::new(store.clone());
        assert!(holder.lock().unwrap());

        let sleeper = Rc::new(MockSleeper::default());
        let mut contender = Counter::with_sleeper(store, sleeper.clone());
        let got = contender
            .get_one(0, Duration::ZERO, Duration::from_millis(1))
            .unwrap();
        assert_eq!(got, None);
        assert_eq!(sleeper.sleeps.get(), 0);

        let flag = contender.set_to(9, Duration::ZERO, Duration::ZERO).unwrap();
        assert!(!flag);
    }

    #[test]
    fn retry_loop_respects_the_timeout_budget() {
        let store = MemoryStore::default();
        let mut holder = Counter::new(store.clone());
        assert!(holder.lock().unwrap());

        let sleeper = Rc::new(MockSleeper::default());
        let mut contender = Counter::with_sleeper(store, sleeper.clone());
        let locked = contender
            .try_lock_for(Duration::from_millis(10), Duration::from_millis(3))
            .unwrap();
        assert!(!locked);
        // attempts at t = 0, 3, 6, 9, 12ms; the loop stops once 12 >= 10
        assert_eq!(sleeper.sleeps.get(), 4);

        assert!(holder.unlock().unwrap());
        let locked = contender
            .try_lock_for(Duration::ZERO, Duration::ZERO)
            .unwrap();
        assert!(locked);
    }
}

mod file {
    use super::*;

    fn temp_counter_path() -> PathBuf {
        env::temp_dir().join(format!("turnstile_counter_{}.cnt", rand::random::<u64>()))
    }

    fn read(path: &PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn status_progression() {
        let path = temp_counter_path();
        run_status_progression(FileCounter::open(&path).unwrap());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn monotonic_commits() {
        let path = temp_counter_path();
        run_monotonic_commits(FileCounter::open(&path).unwrap());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unlock_is_idempotent() {
        let path = temp_counter_path();
        run_unlock_is_idempotent(FileCounter::open(&path).unwrap());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn open_creates_the_initial_state() {
        let path = temp_counter_path();
        let _counter = FileCounter::open(&path).unwrap();
        assert_eq!(read(&path), "0:0");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn empty_path_is_invalid() {
        assert!(matches!(
            FileStore::open(""),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn get_one_advances_past_the_floor() {
        // "0:0" -> lock snapshots 0 -> generate(5) stages 6 -> commit "0:6"
        let path = temp_counter_path();
        let mut counter = FileCounter::open(&path).unwrap();
        let got = counter.get_one(5, Duration::ZERO, Duration::ZERO).unwrap();
        assert_eq!(got, Some(6));
        assert_eq!(read(&path), "0:6");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn lock_flips_the_flag_in_place() {
        let path = temp_counter_path();
        let mut counter = FileCounter::open(&path).unwrap();
        assert!(counter.lock().unwrap());
        assert_eq!(read(&path), "1:0");
        assert!(counter.unlock().unwrap());
        assert_eq!(read(&path), "0:0");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn two_counters_exclude_each_other() {
        let path = temp_counter_path();
        let mut first = FileCounter::open(&path).unwrap();
        let mut second = FileCounter::open(&path).unwrap();

        assert!(first.lock().unwrap());
        let got = second.get_one(0, Duration::ZERO, Duration::ZERO).unwrap();
        assert_eq!(got, None);

        assert!(first.unlock().unwrap());
        let got = second.get_one(0, Duration::ZERO, Duration::ZERO).unwrap();
        assert_eq!(got, Some(1));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn rollback_leaves_the_file_untouched() {
        let path = temp_counter_path();
        let mut counter = FileCounter::open(&path).unwrap();
        assert!(counter.lock().unwrap());
        assert!(counter.generate(5));
        assert!(counter.rollback().unwrap());
        assert_eq!(read(&path), "0:0");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_state_surfaces_as_inconsistent() {
        let path = temp_counter_path();
        let mut counter = FileCounter::open(&path).unwrap();

        for bogus in ["bogus", "2:17", "0:abc", "0"] {
            fs::write(&path, bogus).unwrap();
            assert!(matches!(counter.lock(), Err(Error::Inconsistent { .. })));
        }
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn trailing_newline_is_tolerated() {
        let path = temp_counter_path();
        let mut counter = FileCounter::open(&path).unwrap();
        fs::write(&path, "0:41\n").unwrap();
        let got = counter.get_one(0, Duration::ZERO, Duration::ZERO).unwrap();
        assert_eq!(got, Some(42));
        let _ = fs::remove_file(&path);
    }
}

mod cache {
    use super::*;

    fn counter(prefix: &str) -> Counter<CacheStore<MemoryPool>> {
        Counter::new(CacheStore::new(MemoryPool::default(), prefix).unwrap())
    }

    #[test]
    fn status_progression() {
        run_status_progression(counter("jobs"));
    }

    #[test]
    fn monotonic_commits() {
        run_monotonic_commits(counter("jobs"));
    }

    #[test]
    fn unlock_is_idempotent() {
        run_unlock_is_idempotent(counter("jobs"));
    }

    #[test]
    fn empty_prefix_is_invalid() {
        assert!(matches!(
            CacheStore::new(MemoryPool::default(), ""),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn full_cycle_leaves_value_and_drops_lock() {
        let mut counter = counter("jobs");
        let got = counter.get_one(0, Duration::ZERO, Duration::ZERO).unwrap();
        assert_eq!(got, Some(1));

        let pool = counter.store().pool();
        assert_eq!(pool.get_item("jobs.value"), Some(1));
        assert!(!pool.has_item("jobs.lock"));
    }

    #[test]
    fn absent_value_key_defaults_to_zero_and_is_written_back() {
        let mut counter = counter("jobs");
        assert!(counter.lock().unwrap());
        assert_eq!(counter.store().pool().get_item("jobs.value"), Some(0));
        assert!(counter.store().pool().has_item("jobs.lock"));
        assert!(counter.unlock().unwrap());
    }

    #[test]
    fn existing_lock_key_blocks_acquisition() {
        let mut counter = counter("jobs");
        counter.store_mut().pool_mut().set_item("jobs.lock", 1);
        assert!(!counter.lock().unwrap());
        let got = counter.get_one(0, Duration::ZERO, Duration::ZERO).unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn vanished_lock_key_is_a_consistency_error() {
        let mut counter = counter("jobs");
        assert!(counter.lock().unwrap());
        assert!(counter.generate(0));
        // something else evicted the lock key behind our back
        counter.store_mut().pool_mut().delete_item("jobs.lock");
        assert!(matches!(counter.commit(), Err(Error::Inconsistent { .. })));
    }

    /// A pool whose deletes always fail, simulating a cache that refuses to
    /// give the claim back.
    #[derive(Default)]
    struct StuckPool {
        inner: MemoryPool,
    }

    impl CachePool for StuckPool {
        fn has_item(&self, key: &str) -> bool {
            self.inner.has_item(key)
        }

        fn get_item(&self, key: &str) -> Option<u64> {
            self.inner.get_item(key)
        }

        fn set_item(&mut self, key: &str, value: u64) -> bool {
            self.inner.set_item(key, value)
        }

        fn delete_item(&mut self, _key: &str) -> bool {
            false
        }
    }

    #[test]
    fn failed_delete_rolls_back_and_reraises() {
        let store = CacheStore::new(StuckPool::default(), "jobs").unwrap();
        let mut counter = Counter::new(store);

        let err = counter
            .get_one(0, Duration::ZERO, Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));

        // the rollback attempt restored the pre-lock value before the
        // claim release failed
        assert_eq!(counter.store().pool().get_item("jobs.value"), Some(0));
    }
}
