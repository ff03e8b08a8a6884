use rustc_hash::FxHashMap;

use super::light_map::LightMap;

/// Statistics about cache performance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub clears: u64,
    pub entry_count: usize,
    pub capacity: usize,
}

struct CacheEntry {
    light_map: LightMap,
    access_count: u32,
}

/// LRU cache of static layers keyed by signature
///
/// Holds a handful of viewports. A hit returns a clone of the stored map,
/// so callers always get bit-identical data to the original compute.
pub struct LayerCache {
    entries: FxHashMap<u64, CacheEntry>,
    /// Least recently used first
    access_order: Vec<u64>,
    capacity: usize,
    stats: CacheStats,
}

impl LayerCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: FxHashMap::default(),
            access_order: Vec::with_capacity(capacity),
            capacity,
            stats: CacheStats {
                capacity,
                ..Default::default()
            },
        }
    }

    /// Get the cached layer for `key`
    pub fn get(&mut self, key: u64) -> Option<LightMap> {
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.access_count += 1;
                let light_map = entry.light_map.clone();

                // Move to back of LRU list
                self.access_order.retain(|&k| k != key);
                self.access_order.push(key);

                self.stats.hits += 1;
                Some(light_map)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store a layer, evicting the least recently used entry when full
    pub fn put(&mut self, key: u64, light_map: LightMap) {
        if self.entries.contains_key(&key) {
            self.access_order.retain(|&k| k != key);
        } else {
            while self.entries.len() >= self.capacity && !self.access_order.is_empty() {
                let evict_key = self.access_order.remove(0);
                if self.entries.remove(&evict_key).is_some() {
                    self.stats.evictions += 1;
                }
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                light_map,
                access_count: 1,
            },
        );
        self.access_order.push(key);
        self.stats.entry_count = self.entries.len();
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("[LayerCache] Clearing {} cached layers", self.entries.len());
        }
        self.entries.clear();
        self.access_order.clear();
        self.stats.clears += 1;
        self.stats.entry_count = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Access count of an entry, mostly for diagnostics
    pub fn access_count(&self, key: u64) -> Option<u32> {
        self.entries.get(&key).map(|e| e.access_count)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }
}
