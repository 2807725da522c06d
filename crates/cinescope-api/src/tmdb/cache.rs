//! Search result cache keyed by (query, page).

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Default maximum number of cached pages.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default time-to-live of a cached page.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache key: a search query and a result page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    page: u32,
}

impl CacheKey {
    fn new(query: &str, page: u32) -> Self {
        Self {
            query: String::from(query),
            page,
        }
    }
}

/// A cached value with its freshness timestamp and order slot.
#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    touched_at: Instant,
    seq: u64,
}

/// Bounded TTL cache for search responses.
///
/// Entries are kept in insertion order; a hit or an overwrite moves the key to
/// the end. On overflow the key at the front is evicted. Expiry is checked
/// only when a key is read.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SearchCache<V> {
    max_entries: usize,
    ttl: Duration,
    entries: HashMap<CacheKey, CacheEntry<V>>,
    /// Order slot -> key, oldest first.
    order: BTreeMap<u64, CacheKey>,
    next_seq: u64,
}

impl<V: Clone> SearchCache<V> {
    /// Creates a cache holding at most `max_entries` pages for `ttl` each.
    ///
    /// A `max_entries` of zero is treated as one.
    #[must_use]
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            max_entries: max_entries.max(1),
            ttl,
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Returns the cached value for `(query, page)` if present and fresh.
    ///
    /// A hit refreshes the entry. An expired entry is removed.
    pub fn get(&mut self, query: &str, page: u32) -> Option<V> {
        self.get_at(query, page, Instant::now())
    }

    /// Inserts or overwrites the value for `(query, page)`.
    pub fn set(&mut self, query: &str, page: u32, value: V) {
        self.set_at(query, page, value, Instant::now());
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Number of stored entries, including expired ones not yet read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Entry time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn get_at(&mut self, query: &str, page: u32, now: Instant) -> Option<V> {
        let key = CacheKey::new(query, page);
        let entry = self.entries.get(&key)?;

        if now.saturating_duration_since(entry.touched_at) >= self.ttl {
            let seq = entry.seq;
            self.entries.remove(&key);
            self.order.remove(&seq);
            tracing::debug!(query, page, "search cache entry expired");
            return None;
        }

        let seq = self.take_seq();
        let entry = self.entries.get_mut(&key)?;
        self.order.remove(&entry.seq);
        entry.seq = seq;
        entry.touched_at = now;
        let value = entry.value.clone();
        self.order.insert(seq, key);
        Some(value)
    }

    fn set_at(&mut self, query: &str, page: u32, value: V, now: Instant) {
        let key = CacheKey::new(query, page);
        let seq = self.take_seq();

        if let Some(old) = self.entries.remove(&key) {
            self.order.remove(&old.seq);
        } else if self.entries.len() >= self.max_entries
            && let Some((_, oldest)) = self.order.pop_first()
        {
            tracing::debug!(query = %oldest.query, page = oldest.page, "search cache evicted");
            self.entries.remove(&oldest);
        }

        self.order.insert(seq, key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                value,
                touched_at: now,
                seq,
            },
        );
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        seq
    }
}

impl<V: Clone> Default for SearchCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::arithmetic_side_effects)]

    use proptest::prelude::*;

    use super::*;

    fn cache(max: usize) -> SearchCache<String> {
        SearchCache::new(max, Duration::from_secs(300))
    }

    #[test]
    fn test_get_unknown_key_misses() {
        // Arrange
        let mut cache = cache(10);
        cache.set("dune", 1, String::from("D1"));

        // Act & Assert
        assert_eq!(cache.get("dune", 2), None);
        assert_eq!(cache.get("alien", 1), None);
    }

    #[test]
    fn test_set_then_get_returns_value() {
        // Arrange
        let mut cache = cache(10);

        // Act
        cache.set("dune", 1, String::from("D1"));

        // Assert
        assert_eq!(cache.get("dune", 1), Some(String::from("D1")));
    }

    #[test]
    fn test_set_overwrites_existing_key() {
        // Arrange
        let mut cache = cache(10);
        cache.set("dune", 1, String::from("old"));

        // Act
        cache.set("dune", 1, String::from("new"));

        // Assert
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("dune", 1), Some(String::from("new")));
    }

    #[test]
    fn test_expired_entry_is_purged() {
        // Arrange
        let mut cache = SearchCache::new(10, Duration::from_secs(60));
        let t0 = Instant::now();
        cache.set_at("dune", 1, String::from("D1"), t0);
        let later = t0 + Duration::from_secs(61);

        // Act
        let first = cache.get_at("dune", 1, later);
        let second = cache.get_at("dune", 1, later);

        // Assert
        assert_eq!(first, None);
        assert_eq!(second, None);
        assert!(cache.is_empty());
        assert!(cache.order.is_empty());
    }

    #[test]
    fn test_hit_refreshes_ttl() {
        // Arrange
        let mut cache = SearchCache::new(10, Duration::from_secs(60));
        let t0 = Instant::now();
        cache.set_at("dune", 1, String::from("D1"), t0);

        // Act
        let touched = cache.get_at("dune", 1, t0 + Duration::from_secs(50));
        let after = cache.get_at("dune", 1, t0 + Duration::from_secs(100));

        // Assert
        assert_eq!(touched, Some(String::from("D1")));
        assert_eq!(after, Some(String::from("D1")));
    }

    #[test]
    fn test_overflow_evicts_oldest_inserted() {
        // Arrange
        let mut cache = cache(3);

        // Act
        cache.set("a", 1, String::from("A"));
        cache.set("b", 1, String::from("B"));
        cache.set("c", 1, String::from("C"));
        cache.set("d", 1, String::from("D"));

        // Assert
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("a", 1), None);
        assert_eq!(cache.get("d", 1), Some(String::from("D")));
        assert_eq!(cache.get("b", 1), Some(String::from("B")));
        assert_eq!(cache.get("c", 1), Some(String::from("C")));
    }

    #[test]
    fn test_touch_moves_key_to_end() {
        // Arrange
        let mut cache = cache(3);
        cache.set("a", 1, String::from("A"));
        cache.set("b", 1, String::from("B"));
        cache.set("c", 1, String::from("C"));

        // Act: touching "a" makes "b" the oldest
        cache.get("a", 1);
        cache.set("d", 1, String::from("D"));

        // Assert
        assert_eq!(cache.get("b", 1), None);
        assert_eq!(cache.get("a", 1), Some(String::from("A")));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        // Arrange
        let mut cache = cache(2);
        cache.set("a", 1, String::from("A"));
        cache.set("b", 1, String::from("B"));

        // Act
        cache.set("a", 1, String::from("A2"));

        // Assert
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b", 1), Some(String::from("B")));
        assert_eq!(cache.get("a", 1), Some(String::from("A2")));
    }

    #[test]
    fn test_clear_empties_cache() {
        // Arrange
        let mut cache = cache(3);
        cache.set("a", 1, String::from("A"));
        cache.set("a", 2, String::from("A2"));

        // Act
        cache.clear();

        // Assert
        assert!(cache.is_empty());
        assert_eq!(cache.get("a", 1), None);
    }

    #[test]
    fn test_defaults() {
        // Arrange & Act
        let cache: SearchCache<String> = SearchCache::default();

        // Assert
        assert_eq!(cache.capacity(), 100);
        assert_eq!(cache.ttl(), Duration::from_secs(300));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(u8, u32),
        Get(u8, u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..6, 1u32..3).prop_map(|(q, p)| Op::Set(q, p)),
            (0u8..6, 1u32..3).prop_map(|(q, p)| Op::Get(q, p)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The cache agrees with an ordered-list model of reinsert-on-touch eviction.
        #[test]
        fn prop_matches_ordered_model(
            max in 1usize..5,
            ops in prop::collection::vec(op_strategy(), 1..60),
        ) {
            let mut cache: SearchCache<u32> = SearchCache::new(max, Duration::from_secs(300));
            let mut model: Vec<((String, u32), u32)> = Vec::new();

            for (step, op) in ops.into_iter().enumerate() {
                let value = u32::try_from(step).unwrap();
                match op {
                    Op::Set(q, page) => {
                        let key = (format!("q{q}"), page);
                        cache.set(&key.0, page, value);
                        if let Some(pos) = model.iter().position(|(k, _)| *k == key) {
                            model.remove(pos);
                        } else if model.len() >= max {
                            model.remove(0);
                        }
                        model.push((key, value));
                    }
                    Op::Get(q, page) => {
                        let key = (format!("q{q}"), page);
                        let got = cache.get(&key.0, page);
                        let expected = model.iter().position(|(k, _)| *k == key).map(|pos| {
                            let entry = model.remove(pos);
                            let v = entry.1;
                            model.push(entry);
                            v
                        });
                        prop_assert_eq!(got, expected);
                    }
                }
                prop_assert!(cache.len() <= max);
                prop_assert_eq!(cache.len(), model.len());
            }
        }
    }
}
