//! In-memory TTL cache.

use crate::lock;
use async_trait::async_trait;
use bookshop_core::environment::Clock;
use bookshop_core::providers::ReservationCache;
use bookshop_core::{Result, ShopError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory [`ReservationCache`] honouring TTLs against an injected clock.
#[derive(Clone)]
pub struct InMemoryReservationCache {
    entries: Arc<Mutex<HashMap<String, (String, DateTime<Utc>)>>>,
    failing: Arc<AtomicBool>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for InMemoryReservationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryReservationCache")
            .field("entries", &self.entries)
            .field("failing", &self.failing)
            .finish_non_exhaustive()
    }
}

impl InMemoryReservationCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(AtomicBool::new(false)),
            clock,
        }
    }

    /// Make every call fail with an infrastructure error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Live (unexpired) keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now();
        let mut keys: Vec<String> = lock(&self.entries)
            .iter()
            .filter(|(_, (_, expires_at))| *expires_at > now)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Whether `key` is present and unexpired.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys().iter().any(|k| k == key)
    }

    /// Expiry instant of `key`, if stored.
    #[must_use]
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        lock(&self.entries).get(key).map(|(_, expires_at)| *expires_at)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ShopError::infrastructure("injected cache failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationCache for InMemoryReservationCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.check()?;
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| ShopError::infrastructure(format!("invalid ttl: {e}")))?;
        let expires_at = self.clock.now() + ttl;
        lock(&self.entries).insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        let now = self.clock.now();
        let mut entries = lock(&self.entries);
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > now => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check()?;
        lock(&self.entries).remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::mocks::{ManualClock, epoch};

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let clock = ManualClock::new(epoch());
        let cache = InMemoryReservationCache::new(Arc::new(clock.clone()));

        cache
            .set("reserve:u:1", "1", Duration::from_secs(1800))
            .await
            .unwrap();
        clock.advance(chrono::Duration::seconds(1799));
        assert_eq!(cache.get("reserve:u:1").await.unwrap().as_deref(), Some("1"));

        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(cache.get("reserve:u:1").await.unwrap(), None);
        assert!(cache.keys().is_empty());
    }

    #[tokio::test]
    async fn failing_cache_reports_infrastructure_errors() {
        let cache = InMemoryReservationCache::new(Arc::new(crate::mocks::test_clock()));
        cache.set_failing(true);
        let err = cache.delete("k").await.unwrap_err();
        assert_eq!(err.kind(), bookshop_core::ErrorKind::Infrastructure);
    }
}
