//! In-memory LRU cache for sentence embeddings.
//!
//! Embeddings are scoped to a chunking pass and never persisted; the cache
//! only amortizes provider calls when the same sentence text shows up again
//! within one service's lifetime.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque, hash_map::Entry};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// Snapshot of cache interactions, surfaced in telemetry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    pub hits: usize,
    pub misses: usize,
}

/// Shared handle that coordinates cache configuration across requests.
#[derive(Clone, Default)]
pub struct CacheHandle {
    inner: Arc<Mutex<Option<EmbeddingCache>>>,
}

impl CacheHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_capacity(capacity: Option<usize>) -> Self {
        let handle = Self::new();
        handle.apply_capacity(capacity);
        handle
    }

    /// `Some(0)` disables the cache, `Some(n)` bounds it at `n` entries, and
    /// `None` leaves the current state untouched.
    pub fn apply_capacity(&self, capacity: Option<usize>) {
        let mut guard = self.lock();
        match capacity {
            Some(0) => {
                *guard = None;
            }
            Some(limit) => {
                let replace = match guard.as_ref() {
                    Some(existing) => existing.capacity() != Some(limit),
                    None => true,
                };
                if replace {
                    *guard = Some(EmbeddingCache::new(Some(limit)));
                }
            }
            None => {}
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.lock().as_ref().and_then(|cache| cache.capacity())
    }

    pub fn metrics(&self) -> Option<CacheMetrics> {
        self.lock().as_ref().map(|cache| cache.metrics())
    }

    pub fn lock(&self) -> MutexGuard<'_, Option<EmbeddingCache>> {
        self.inner.lock()
    }
}

#[derive(Debug)]
pub struct EmbeddingCache {
    capacity: Option<usize>,
    entries: HashMap<u64, Vec<f32>>,
    order: VecDeque<u64>,
    hits: usize,
    misses: usize,
}

impl EmbeddingCache {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn get(&mut self, key: &str) -> Option<Vec<f32>> {
        let hash = hash_text(key);
        if let Some(value) = self.entries.get(&hash) {
            // refresh order for simple LRU behaviour
            refresh(&mut self.order, hash);
            self.hits += 1;
            Some(value.clone())
        } else {
            self.misses += 1;
            None
        }
    }

    pub fn insert(&mut self, key: &str, embedding: Vec<f32>) {
        let hash = hash_text(key);
        if let Entry::Occupied(mut existing) = self.entries.entry(hash) {
            existing.insert(embedding);
            refresh(&mut self.order, hash);
            return;
        }

        if let Some(limit) = self.capacity {
            while self.order.len() >= limit {
                if let Some(evicted) = self.order.pop_front() {
                    self.entries.remove(&evicted);
                } else {
                    break;
                }
            }
        }

        self.order.push_back(hash);
        self.entries.insert(hash, embedding);
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits,
            misses: self.misses,
        }
    }
}

fn refresh(order: &mut VecDeque<u64>, hash: u64) {
    if let Some(pos) = order.iter().position(|value| *value == hash) {
        order.remove(pos);
    }
    order.push_back(hash);
}

fn hash_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_hits_and_misses() {
        let mut cache = EmbeddingCache::new(Some(4));
        assert!(cache.get("missing").is_none());
        cache.insert("present", vec![1.0]);
        assert_eq!(cache.get("present"), Some(vec![1.0]));
        let metrics = cache.metrics();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = EmbeddingCache::new(Some(2));
        cache.insert("a", vec![1.0]);
        cache.insert("b", vec![2.0]);
        // touch "a" so "b" becomes the eviction candidate
        assert!(cache.get("a").is_some());
        cache.insert("c", vec![3.0]);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn handle_capacity_zero_disables_cache() {
        let handle = CacheHandle::from_capacity(Some(0));
        assert!(handle.capacity().is_none());
        assert!(handle.metrics().is_none());
    }

    #[test]
    fn handle_keeps_existing_cache_for_same_capacity() {
        let handle = CacheHandle::from_capacity(Some(8));
        {
            let mut guard = handle.lock();
            guard.as_mut().unwrap().insert("kept", vec![1.0]);
        }
        handle.apply_capacity(Some(8));
        let mut guard = handle.lock();
        assert!(guard.as_mut().unwrap().get("kept").is_some());
    }
}
