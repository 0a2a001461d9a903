//! # Bookshop Testing
//!
//! In-memory fakes for every capability in `bookshop_core::providers`,
//! deterministic clocks and a few fixtures.
//!
//! The fakes keep the contracts of the production adapters, including the
//! all-or-nothing order write, so service tests exercise the same
//! invariants the Postgres integration suite checks.
//!
//! ## Example
//!
//! ```
//! use bookshop_testing::{InMemoryStore, mocks::test_clock};
//! use std::sync::Arc;
//!
//! let store = InMemoryStore::new(Arc::new(test_clock()));
//! let fiction = store.seed_category("Fiction");
//! let book = store.seed_book("Dune", 3, fiction.id);
//! assert_eq!(store.inventory(book.id), Some(3));
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

mod cache;
mod publisher;
mod store;

pub use cache::InMemoryReservationCache;
pub use publisher::RecordingEventPublisher;
pub use store::InMemoryStore;

/// Mock implementations of environment traits.
pub mod mocks {
    use bookshop_core::environment::Clock;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to. Used for TTL expiry tests.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Start at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            let mut time = super::lock(&self.time);
            *time += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *super::lock(&self.time)
        }
    }

    /// 2025-01-01 00:00:00 UTC.
    #[must_use]
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default()
    }

    /// Default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(epoch())
    }
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Lock a fake's state, recovering it if a panicking test poisoned the mutex.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
