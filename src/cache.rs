//! Expiring memoization shared by every remote lookup.
//!
//! Entries expire lazily: a stale entry is dropped by the `get` that finds it.
//! There is no background sweep.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::scrape::TermPair;
use crate::wiki::CrossReference;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 6);

/// Source of "now" for expiry checks. Tests swap in a manually advanced clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Operation name plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    op: &'static str,
    args: Vec<String>,
}

impl CacheKey {
    pub fn new<I, S>(op: &'static str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            op,
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Every result shape a remote lookup can produce, absent markers included.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Title(Option<String>),
    CrossReference(Option<CrossReference>),
    Terms(Vec<String>),
    Pairs(Vec<TermPair>),
}

struct CacheEntry {
    value: CachedValue,
    created_at: Instant,
}

pub struct MemoStore {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MemoStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if now.saturating_duration_since(entry.created_at) > self.ttl {
            debug!(op = key.op, "cache entry expired");
            entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn set(&self, key: CacheKey, value: CachedValue) {
        let created_at = self.clock.now();
        self.lock().insert(key, CacheEntry { value, created_at });
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        // A panic while holding the guard cannot leave a half-written entry,
        // so a poisoned map is still consistent.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MemoStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Clock that only moves when told to.
    pub(crate) struct ManualClock {
        now: Mutex<Instant>,
    }

    impl ManualClock {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Instant::now()),
            })
        }

        pub(crate) fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    fn store_with_clock(ttl: Duration) -> (MemoStore, Arc<ManualClock>) {
        let clock = ManualClock::new();
        (MemoStore::with_clock(ttl, clock.clone()), clock)
    }

    #[test]
    fn returns_value_within_ttl() {
        let (store, clock) = store_with_clock(Duration::from_secs(60));
        let key = CacheKey::new("resolve_title", ["lymphoma"]);
        store.set(key.clone(), CachedValue::Title(Some("Lymphoma".into())));

        clock.advance(Duration::from_secs(60));
        assert_eq!(
            store.get(&key),
            Some(CachedValue::Title(Some("Lymphoma".into())))
        );
    }

    #[test]
    fn stale_entry_is_absent_and_evicted() {
        let (store, clock) = store_with_clock(DEFAULT_TTL);
        let key = CacheKey::new("diki_terms", ["cat"]);
        store.set(key.clone(), CachedValue::Terms(vec!["kot".into()]));

        clock.advance(DEFAULT_TTL + Duration::from_millis(1));
        assert_eq!(store.get(&key), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn absent_markers_are_cached_values() {
        let store = MemoStore::default();
        let key = CacheKey::new("map_title", [""]);
        store.set(key.clone(), CachedValue::CrossReference(None));
        assert_eq!(store.get(&key), Some(CachedValue::CrossReference(None)));
    }

    #[test]
    fn keys_differ_by_operation_and_arguments() {
        let store = MemoStore::default();
        store.set(
            CacheKey::new("proz_terms", ["cat", "5"]),
            CachedValue::Terms(vec!["kot".into()]),
        );

        assert_eq!(store.get(&CacheKey::new("proz_terms", ["cat", "3"])), None);
        assert_eq!(store.get(&CacheKey::new("diki_terms", ["cat", "5"])), None);
        assert!(store.get(&CacheKey::new("proz_terms", ["cat", "5"])).is_some());
    }

    #[test]
    fn set_replaces_existing_entry_and_refreshes_age() {
        let (store, clock) = store_with_clock(Duration::from_secs(10));
        let key = CacheKey::new("resolve_title", ["cat"]);
        store.set(key.clone(), CachedValue::Title(None));

        clock.advance(Duration::from_secs(8));
        store.set(key.clone(), CachedValue::Title(Some("Cat".into())));
        clock.advance(Duration::from_secs(8));

        assert_eq!(store.get(&key), Some(CachedValue::Title(Some("Cat".into()))));
    }

    #[test]
    fn clear_drops_everything() {
        let store = MemoStore::default();
        store.set(CacheKey::new("a", ["1"]), CachedValue::Terms(vec![]));
        store.set(CacheKey::new("b", ["2"]), CachedValue::Pairs(vec![]));
        assert_eq!(store.len(), 2);
        store.clear();
        assert!(store.is_empty());
    }
}
