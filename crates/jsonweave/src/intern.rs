//! String interning cache for object keys and placeholder names
//!
//! Template documents repeat the same short strings (keys, placeholder
//! names) on every compile and apply. The cache hands out one canonical
//! `Arc<str>` per distinct string so those repeats share storage.
//!
//! The table has a fixed number of slots tracked by a free bitmap. Each
//! entry carries a saturating hit counter, and an [`EvictionPolicy`] decides
//! when to age the table and which entries survive.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

const WORD_BITS: usize = u64::BITS as usize;

/// Anything that can hand out shared string instances.
pub trait Interner {
    /// Return a shared instance equal to `s`.
    fn intern(&mut self, s: &str) -> Arc<str>;
}

impl<P: EvictionPolicy> Interner for InternCache<P> {
    fn intern(&mut self, s: &str) -> Arc<str> {
        InternCache::intern(self, s)
    }
}

/// Decides when the cache ages and what survives an aging pass.
pub trait EvictionPolicy: fmt::Debug {
    /// Counter value after a lookup hit.
    fn on_hit(&self, hits: u8) -> u8 {
        hits.saturating_add(1)
    }

    /// Whether `inserted` new entries since the last pass warrant aging.
    fn should_age(&self, inserted: usize, capacity: usize) -> bool;

    /// Counter value after an aging pass, or `None` to evict.
    fn age(&self, hits: u8) -> Option<u8>;
}

/// Evict entries with no hits, halve the rest.
///
/// Ages once insertions since the previous pass exceed 40% of capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalfLife;

impl EvictionPolicy for HalfLife {
    fn should_age(&self, inserted: usize, capacity: usize) -> bool {
        inserted * 5 > capacity * 2
    }

    fn age(&self, hits: u8) -> Option<u8> {
        if hits < 1 {
            None
        } else {
            Some(hits >> 1)
        }
    }
}

/// Counters for observing cache behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InternStats {
    /// Lookups answered from the table
    pub hits: u64,
    /// Lookups that inserted a new entry
    pub inserts: u64,
    /// Lookups that returned an uncached string
    pub bypassed: u64,
    /// Entries removed by aging
    pub evictions: u64,
}

#[derive(Debug)]
struct Entry {
    text: Arc<str>,
    hits: u8,
}

/// Bounded dedup table for short strings.
#[derive(Debug)]
pub struct InternCache<P: EvictionPolicy = HalfLife> {
    slots: Vec<Option<Entry>>,
    free: Vec<u64>,
    index: HashMap<Arc<str>, usize>,
    inserted: usize,
    max_len: usize,
    empty: Arc<str>,
    policy: P,
    stats: InternStats,
}

impl InternCache<HalfLife> {
    /// Create a cache with `capacity` slots that accepts strings up to
    /// `max_len` bytes.
    pub fn new(capacity: usize, max_len: usize) -> Self {
        Self::with_policy(capacity, max_len, HalfLife)
    }
}

impl<P: EvictionPolicy> InternCache<P> {
    /// Create a cache with a custom eviction policy.
    pub fn with_policy(capacity: usize, max_len: usize, policy: P) -> Self {
        let mut free = vec![u64::MAX; capacity.div_ceil(WORD_BITS)];
        let tail = capacity % WORD_BITS;
        if tail != 0 {
            if let Some(last) = free.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            free,
            index: HashMap::new(),
            inserted: 0,
            max_len,
            empty: Arc::from(""),
            policy,
            stats: InternStats::default(),
        }
    }

    /// Return the canonical instance of `s`, caching it if there is room.
    pub fn intern(&mut self, s: &str) -> Arc<str> {
        if s.is_empty() {
            return self.empty.clone();
        }
        if s.len() > self.max_len {
            self.stats.bypassed += 1;
            return Arc::from(s);
        }

        if let Some(&idx) = self.index.get(s) {
            if let Some(entry) = self.slots[idx].as_mut() {
                entry.hits = self.policy.on_hit(entry.hits);
                self.stats.hits += 1;
                return entry.text.clone();
            }
        }

        let Some(idx) = self.first_free() else {
            trace!(len = s.len(), "intern cache full");
            self.age();
            self.stats.bypassed += 1;
            return Arc::from(s);
        };

        let text: Arc<str> = Arc::from(s);
        self.mark_used(idx);
        self.index.insert(text.clone(), idx);
        self.inserted += 1;
        self.stats.inserts += 1;

        let due = self.policy.should_age(self.inserted, self.slots.len());
        // A fresh entry gets one hit when it triggers aging so the pass it
        // caused does not evict it straight away.
        let hits = if due { self.policy.on_hit(0) } else { 0 };
        self.slots[idx] = Some(Entry {
            text: text.clone(),
            hits,
        });
        if due {
            self.age();
        }
        text
    }

    /// Run an aging pass now.
    pub fn age(&mut self) {
        let mut evicted = 0;
        for idx in 0..self.slots.len() {
            let Some(entry) = self.slots[idx].as_mut() else {
                continue;
            };
            match self.policy.age(entry.hits) {
                Some(hits) => entry.hits = hits,
                None => {
                    if let Some(entry) = self.slots[idx].take() {
                        self.index.remove(&entry.text);
                    }
                    self.mark_free(idx);
                    evicted += 1;
                }
            }
        }
        self.inserted = 0;
        self.stats.evictions += evicted;
        debug!(evicted, live = self.index.len(), "intern cache aged");
    }

    /// Drop every entry, releasing all pinned strings.
    pub fn clear(&mut self) {
        let live = self.index.len();
        for idx in 0..self.slots.len() {
            if self.slots[idx].take().is_some() {
                self.mark_free(idx);
            }
        }
        self.index.clear();
        self.inserted = 0;
        debug!(released = live, "intern cache cleared");
    }

    /// Number of cached strings
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the cache holds nothing
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Check if `s` is currently cached
    pub fn contains(&self, s: &str) -> bool {
        self.index.contains_key(s)
    }

    /// Hit counter for `s`, if cached
    pub fn hits(&self, s: &str) -> Option<u8> {
        let idx = *self.index.get(s)?;
        self.slots[idx].as_ref().map(|e| e.hits)
    }

    /// Lifetime counters
    pub fn stats(&self) -> InternStats {
        self.stats
    }

    fn first_free(&self) -> Option<usize> {
        self.free
            .iter()
            .enumerate()
            .find(|(_, word)| **word != 0)
            .map(|(i, word)| i * WORD_BITS + word.trailing_zeros() as usize)
    }

    fn mark_used(&mut self, idx: usize) {
        self.free[idx / WORD_BITS] &= !(1u64 << (idx % WORD_BITS));
    }

    fn mark_free(&mut self, idx: usize) {
        self.free[idx / WORD_BITS] |= 1u64 << (idx % WORD_BITS);
    }
}
