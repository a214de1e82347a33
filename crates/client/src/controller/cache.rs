//! Bounded least-recently-used map for rate-limit windows

use std::collections::HashMap;
use std::hash::Hash;

/// LRU map evicting the entry with the oldest access stamp
pub(crate) struct LruCache<K: Eq + Hash + Copy, V: Copy> {
    /// Key to (value, last access stamp)
    map: HashMap<K, (V, u64)>,

    counter: u64,

    capacity: usize,
}

impl<K: Eq + Hash + Copy, V: Copy> LruCache<K, V> {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            map: HashMap::with_capacity(capacity),
            counter: 0,
            capacity,
        }
    }

    /// Look up and mark as most recently used
    pub(crate) fn get(&mut self, key: &K) -> Option<V> {
        let (value, stamp) = self.map.get_mut(key)?;
        self.counter += 1;
        *stamp = self.counter;
        Some(*value)
    }

    /// Insert or replace, evicting the least recently used entry when full
    pub(crate) fn put(&mut self, key: K, value: V) {
        self.counter += 1;

        if self.map.len() >= self.capacity && !self.map.contains_key(&key) {
            self.evict_lru();
        }

        self.map.insert(key, (value, self.counter));
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .map
            .iter()
            .min_by_key(|(_, (_, stamp))| *stamp)
            .map(|(k, _)| *k);

        if let Some(key) = oldest {
            self.map.remove(&key);
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.counter = 0;
    }
}
