//! In-memory LRU cache for decompressed assets.
//!
//! Bounded by entry count and total bytes. A hash map indexes into a
//! slab of nodes threaded on a doubly-linked recency list, so `get`
//! and `set` are O(1) amortized. The whole structure sits behind one
//! mutex; `get` rotates the recency order, so even reads mutate.
//!
//! A single value larger than a quarter of the byte bound is never
//! cached: one outlier must not displace the entire working set.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use crate::paths::normalize;

const NIL: usize = usize::MAX;

/// Counter snapshot for observability.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub items: usize,
    pub bytes: usize,
    pub max_items: usize,
    pub max_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub rejected: u64,
}

pub struct AssetCache {
    max_items: usize,
    max_bytes: usize,
    inner: Mutex<Inner>,
}

struct Inner {
    map: HashMap<String, usize>,
    slots: Vec<Slot>,
    free: Vec<usize>,
    /// Most recently used entry.
    head: usize,
    /// Least recently used entry, the eviction victim.
    tail: usize,
    bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    rejected: u64,
}

struct Slot {
    key: String,
    data: Arc<Vec<u8>>,
    prev: usize,
    next: usize,
}

impl AssetCache {
    pub fn new(max_items: usize, max_bytes: usize) -> Self {
        Self {
            max_items,
            max_bytes,
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                slots: Vec::new(),
                free: Vec::new(),
                head: NIL,
                tail: NIL,
                bytes: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
                rejected: 0,
            }),
        }
    }

    /// Fetch a value and mark it most recently used.
    pub fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        let key = normalize(key);
        let mut inner = self.inner.lock();
        match inner.map.get(&key).copied() {
            Some(slot) => {
                inner.hits += 1;
                inner.detach(slot);
                inner.push_front(slot);
                Some(Arc::clone(&inner.slots[slot].data))
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert a value, evicting from the least recently used end until
    /// both bounds hold. Returns `false` when the value was rejected
    /// for exceeding a quarter of the byte bound; the caller still
    /// owns the data either way.
    pub fn set(&self, key: &str, data: Arc<Vec<u8>>) -> bool {
        let key = normalize(key);
        let len = data.len();

        let mut inner = self.inner.lock();
        if self.max_items == 0 || len.saturating_mul(4) > self.max_bytes {
            inner.rejected += 1;
            trace!(key = %key, len, "value rejected by cache policy");
            return false;
        }

        if let Some(slot) = inner.map.remove(&key) {
            inner.remove_slot(slot);
        }

        while inner.map.len() + 1 > self.max_items || inner.bytes + len > self.max_bytes {
            let Some(victim) = inner.pop_back() else {
                break;
            };
            let victim_key = inner.slots[victim].key.clone();
            inner.map.remove(&victim_key);
            inner.release(victim);
            inner.evictions += 1;
        }

        let slot = inner.allocate(key.clone(), data);
        inner.push_front(slot);
        inner.bytes += len;
        inner.map.insert(key, slot);
        true
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            items: inner.map.len(),
            bytes: inner.bytes,
            max_items: self.max_items,
            max_bytes: self.max_bytes,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            rejected: inner.rejected,
        }
    }
}

impl Inner {
    fn allocate(&mut self, key: String, data: Arc<Vec<u8>>) -> usize {
        let slot = Slot {
            key,
            data,
            prev: NIL,
            next: NIL,
        };
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = slot;
                index
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        }
    }

    /// Unlink a slot, subtract its bytes, and put the slab entry on
    /// the free list.
    fn remove_slot(&mut self, slot: usize) {
        self.detach(slot);
        self.release(slot);
    }

    fn release(&mut self, slot: usize) {
        self.bytes -= self.slots[slot].data.len();
        self.slots[slot].data = Arc::new(Vec::new());
        self.free.push(slot);
    }

    fn detach(&mut self, slot: usize) {
        let (prev, next) = (self.slots[slot].prev, self.slots[slot].next);
        if prev != NIL {
            self.slots[prev].next = next;
        } else if self.head == slot {
            self.head = next;
        }
        if next != NIL {
            self.slots[next].prev = prev;
        } else if self.tail == slot {
            self.tail = prev;
        }
        self.slots[slot].prev = NIL;
        self.slots[slot].next = NIL;
    }

    fn push_front(&mut self, slot: usize) {
        self.slots[slot].prev = NIL;
        self.slots[slot].next = self.head;
        if self.head != NIL {
            self.slots[self.head].prev = slot;
        }
        self.head = slot;
        if self.tail == NIL {
            self.tail = slot;
        }
    }

    fn pop_back(&mut self) -> Option<usize> {
        if self.tail == NIL {
            return None;
        }
        let victim = self.tail;
        self.detach(victim);
        Some(victim)
    }
}
