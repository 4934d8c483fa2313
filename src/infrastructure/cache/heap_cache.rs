//! Fixed-capacity cache with least-recently-touched eviction.
//!
//! Entries live in a hash map keyed by the 64-bit FNV-1a hash of the string
//! key. Recency is tracked by an array-backed binary min-heap ordered on each
//! entry's last-touched timestamp. Every entry remembers its current position
//! in the heap, and that position is rewritten on every swap, so refreshing or
//! removing an entry is a sift from a known index instead of a linear search.
//!
//! | operation         | cost      |
//! |-------------------|-----------|
//! | `put` (new key)   | O(log n), evicts at most one entry |
//! | `put` (existing)  | O(log n), never evicts |
//! | `get` (hit)       | O(log n)  |
//! | `invalidate`      | O(log n)  |
//!
//! # Hash aliasing
//!
//! Two different keys with the same 64-bit hash share a slot: the second key
//! silently reads and overwrites the first one's value. The probability is
//! negligible for realistic key counts and the behaviour is left as is.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::service::KvCache;
use crate::error::{StoreError, StoreResult};
use crate::utils::hash::fnv64;

/// A cached value together with its recency bookkeeping.
struct CacheEntry<V> {
    key: String,
    value: V,
    timestamp: u64,
    heap_index: usize,
}

#[derive(Debug, Clone, Copy)]
struct HeapNode {
    hash: u64,
    timestamp: u64,
}

/// Nanoseconds since the cache was created, strictly increasing per call.
struct Clock {
    epoch: Instant,
    last: u64,
}

impl Clock {
    fn new() -> Self {
        Self {
            epoch: Instant::now(),
            last: 0,
        }
    }

    fn now(&mut self) -> u64 {
        let elapsed = u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.last = elapsed.max(self.last.saturating_add(1));
        self.last
    }
}

struct Inner<V> {
    entries: HashMap<u64, CacheEntry<V>>,
    heap: Vec<HeapNode>,
    clock: Clock,
}

/// Thread-safe cache holding at most `capacity` entries.
///
/// All operations are serialized by a single mutex and none of them does I/O
/// while holding it.
pub struct HeapCache<V> {
    capacity: usize,
    inner: Mutex<Inner<V>>,
}

impl<V> HeapCache<V> {
    /// Creates an empty cache. A capacity of zero is treated as one; callers
    /// that want no caching should not construct a cache at all.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity),
                heap: Vec::with_capacity(capacity),
                clock: Clock::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if a thread panicked while holding the cache lock.
    pub fn is_poisoned(&self) -> bool {
        self.inner.is_poisoned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or replaces `value`, returning the previous value if any.
    pub fn put(&self, key: &str, value: V) -> Option<V> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let hash = fnv64(key);
        let now = inner.clock.now();

        if let Some(entry) = inner.entries.get_mut(&hash) {
            let previous = std::mem::replace(&mut entry.value, value);
            entry.timestamp = now;
            let index = entry.heap_index;
            inner.touch(index, now);
            return Some(previous);
        }

        if inner.entries.len() >= self.capacity {
            inner.evict_oldest();
        }

        inner.entries.insert(
            hash,
            CacheEntry {
                key: key.to_string(),
                value,
                timestamp: now,
                heap_index: inner.heap.len(),
            },
        );
        inner.push(HeapNode {
            hash,
            timestamp: now,
        });
        None
    }

    /// Returns a copy of the value under `key`, refreshing its recency.
    pub fn get(&self, key: &str) -> StoreResult<V>
    where
        V: Clone,
    {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let hash = fnv64(key);

        let Some(entry) = inner.entries.get(&hash) else {
            return Err(StoreError::NotFound(key.to_string()));
        };
        let value = entry.value.clone();
        let index = entry.heap_index;

        let now = inner.clock.now();
        if let Some(entry) = inner.entries.get_mut(&hash) {
            entry.timestamp = now;
        }
        inner.touch(index, now);
        Ok(value)
    }

    /// Removes `key` unconditionally and returns its last value.
    pub fn invalidate(&self, key: &str) -> StoreResult<V> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let hash = fnv64(key);

        let Some(index) = inner.entries.get(&hash).map(|e| e.heap_index) else {
            return Err(StoreError::NotFound(key.to_string()));
        };
        inner.remove_at(index);
        inner
            .entries
            .remove(&hash)
            .map(|entry| entry.value)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

impl<V> Inner<V> {
    fn evict_oldest(&mut self) {
        let Some(node) = self.remove_at(0) else {
            return;
        };
        if let Some(entry) = self.entries.remove(&node.hash) {
            tracing::trace!(key = %entry.key, "cache eviction");
        }
    }

    fn push(&mut self, node: HeapNode) {
        self.heap.push(node);
        let index = self.heap.len() - 1;
        self.set_index(index);
        self.sift_up(index);
    }

    /// Detaches the heap node at `index`; the caller drops the map entry.
    fn remove_at(&mut self, index: usize) -> Option<HeapNode> {
        let last = self.heap.len().checked_sub(1)?;
        if index != last {
            self.swap(index, last);
        }
        let node = self.heap.pop()?;
        if index < self.heap.len() {
            self.fix(index);
        }
        Some(node)
    }

    fn touch(&mut self, index: usize, timestamp: u64) {
        self.heap[index].timestamp = timestamp;
        self.fix(index);
    }

    fn fix(&mut self, index: usize) {
        if !self.sift_up(index) {
            self.sift_down(index);
        }
    }

    fn sift_up(&mut self, mut index: usize) -> bool {
        let start = index;
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[index].timestamp >= self.heap[parent].timestamp {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
        index != start
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let smallest = if right < len && self.heap[right].timestamp < self.heap[left].timestamp
            {
                right
            } else {
                left
            };
            if self.heap[smallest].timestamp >= self.heap[index].timestamp {
                break;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.set_index(a);
        self.set_index(b);
    }

    fn set_index(&mut self, index: usize) {
        let hash = self.heap[index].hash;
        if let Some(entry) = self.entries.get_mut(&hash) {
            entry.heap_index = index;
        }
    }
}

impl<V: Clone + Send> KvCache<V> for HeapCache<V> {
    fn put(&self, key: &str, value: V) -> Option<V> {
        HeapCache::put(self, key, value)
    }

    fn get(&self, key: &str) -> StoreResult<V> {
        HeapCache::get(self, key)
    }

    fn invalidate(&self, key: &str) -> StoreResult<V> {
        HeapCache::invalidate(self, key)
    }

    fn is_healthy(&self) -> bool {
        !self.is_poisoned()
    }
}

#[cfg(test)]
impl<V> HeapCache<V> {
    /// Asserts the map/heap correspondence and the heap ordering.
    fn assert_consistent(&self) {
        let inner = self.lock();
        assert_eq!(inner.entries.len(), inner.heap.len());
        assert!(inner.entries.len() <= self.capacity);
        for (i, node) in inner.heap.iter().enumerate() {
            let entry = inner.entries.get(&node.hash).expect("heap node has entry");
            assert_eq!(entry.heap_index, i, "stale back-pointer");
            assert_eq!(entry.timestamp, node.timestamp);
            if i > 0 {
                assert!(inner.heap[(i - 1) / 2].timestamp <= node.timestamp);
            }
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(&fnv64(key))
    }
}
