use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug)]
struct CacheEntry<V> {
    value: Rc<V>,
    last_used_tick: u64,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Deterministic in-memory cache keyed by country code.
///
/// Holds at most `capacity` entries. Eviction is LRU by `last_used_tick`,
/// with a tie-break by key ordering (entries live in a `BTreeMap`).
#[derive(Debug)]
pub struct BoundaryCache<V> {
    capacity: usize,
    tick: u64,
    entries: BTreeMap<String, CacheEntry<V>>,
    stats: CacheStats,
}

impl<V> BoundaryCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tick: 0,
            entries: BTreeMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<Rc<V>> {
        self.tick += 1;
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used_tick = self.tick;
                self.stats.hits += 1;
                Some(Rc::clone(&entry.value))
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Inserts `value`, evicting the least recently used entry when full.
    /// Returns the evicted key, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: Rc<V>) -> Option<String> {
        let key = key.into();
        self.tick += 1;
        let mut evicted = None;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            evicted = self.evict_lru();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                last_used_tick: self.tick,
            },
        );
        evicted
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn evict_lru(&mut self) -> Option<String> {
        let key = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_used_tick)
            .map(|(k, _)| k.clone())?;
        self.entries.remove(&key);
        self.stats.evictions += 1;
        tracing::debug!(key = %key, "evicted cached boundaries");
        Some(key)
    }
}
