// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The partition key cache and its eviction bookkeeping.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{Duration, Instant},
};

use foldhash::fast::RandomState;
use parking_lot::Mutex;
use tick::Clock;

use crate::{PartitionKey, builder::PartitionKeyCacheBuilder};

/// Default lifetime of a cache entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default maximum number of cache entries.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Decides which entry leaves a full cache when a new id is inserted.
///
/// # Examples
///
/// ```
/// use keyhint::{EvictionPolicy, PartitionKey, PartitionKeyCache};
/// use tick::Clock;
///
/// let cache = PartitionKeyCache::builder(Clock::new_frozen())
///     .max_entries(2)
///     .eviction_policy(EvictionPolicy::AccessOrder)
///     .build();
///
/// cache.put("a", PartitionKey::from("pa"));
/// cache.put("b", PartitionKey::from("pb"));
/// cache.lookup("a"); // "a" is now the most recently used entry
/// cache.put("c", PartitionKey::from("pc"));
///
/// assert!(cache.lookup("a").is_some());
/// assert!(cache.lookup("b").is_none());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EvictionPolicy {
    /// Evict the entry written longest ago (FIFO). Lookups do not change the order; re-putting
    /// an id moves it to the back.
    #[default]
    InsertionOrder,
    /// Evict the entry used longest ago (LRU). Both puts and lookup hits move an id to the back.
    AccessOrder,
}

/// A point-in-time snapshot of cache occupancy and activity.
///
/// `size` and `max_size` describe the current occupancy. The counters are cumulative since the
/// cache was built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries currently held, including expired entries that were not read yet.
    pub size: usize,
    /// Configured capacity.
    pub max_size: usize,
    /// Lookups that returned a partition key.
    pub hits: u64,
    /// Lookups that returned nothing, including lookups of expired entries.
    pub misses: u64,
    /// Entries removed because they were found expired on lookup.
    pub expirations: u64,
    /// Entries removed to make room for a new id.
    pub evictions: u64,
}

#[derive(Debug)]
struct Slot {
    partition_key: PartitionKey,
    /// `None` when `now + ttl` is not representable, which means the entry never expires.
    expires_at: Option<Instant>,
    sequence: u64,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Everything guarded by the cache mutex.
///
/// `order` maps each slot's sequence number back to its id; the smallest sequence is the next
/// eviction candidate. Every id in `slots` appears in `order` exactly once.
#[derive(Debug, Default)]
struct State {
    slots: HashMap<Arc<str>, Slot, RandomState>,
    order: BTreeMap<u64, Arc<str>>,
    next_sequence: u64,
    hits: u64,
    misses: u64,
    expirations: u64,
    evictions: u64,
}

impl State {
    fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    fn remove(&mut self, id: &str) -> Option<(Arc<str>, Slot)> {
        let (id, slot) = self.slots.remove_entry(id)?;
        self.order.remove(&slot.sequence);
        Some((id, slot))
    }

    fn evict_front(&mut self) -> Option<Arc<str>> {
        let (_, id) = self.order.pop_first()?;
        self.slots.remove(&id);
        self.evictions += 1;
        Some(id)
    }

    fn touch(&mut self, id: &str) {
        let next = self.next_sequence;
        let Some(slot) = self.slots.get_mut(id) else {
            return;
        };
        let previous = std::mem::replace(&mut slot.sequence, next);
        self.next_sequence += 1;
        if let Some(id) = self.order.remove(&previous) {
            self.order.insert(next, id);
        }
    }
}

/// A bounded, time-expiring map from document id to partition key.
///
/// The cache is an auxiliary index: losing an entry only costs one extra cross-partition query,
/// so none of its operations can fail. Capacity and expiry are handled internally.
///
/// All operations take a short critical section on a single mutex that guards both the entries
/// and the eviction order, so the size bound and the order index stay consistent under any
/// interleaving of concurrent callers. Concurrent puts of the same id are last-writer-wins.
///
/// Time is read from the injected [`Clock`], which lets tests move time forward without
/// sleeping.
///
/// # Examples
///
/// ```
/// use keyhint::{PartitionKey, PartitionKeyCache};
/// use tick::Clock;
///
/// let cache = PartitionKeyCache::new(Clock::new_frozen());
///
/// assert!(cache.lookup("order-7").is_none());
/// cache.put("order-7", PartitionKey::from("customer-3"));
/// assert_eq!(cache.lookup("order-7"), Some(PartitionKey::from("customer-3")));
///
/// cache.clear();
/// assert!(cache.is_empty());
/// ```
#[derive(Debug)]
pub struct PartitionKeyCache {
    state: Mutex<State>,
    clock: Clock,
    ttl: Duration,
    max_entries: usize,
    eviction_policy: EvictionPolicy,
}

impl PartitionKeyCache {
    /// Creates a cache with the default TTL (5 minutes), capacity (10,000 entries) and
    /// insertion-order eviction.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::builder(clock).build()
    }

    /// Creates a builder for configuring the cache.
    #[must_use]
    pub fn builder(clock: Clock) -> PartitionKeyCacheBuilder {
        PartitionKeyCacheBuilder::new(clock)
    }

    pub(crate) fn from_parts(clock: Clock, ttl: Duration, max_entries: usize, eviction_policy: EvictionPolicy) -> Self {
        Self {
            state: Mutex::new(State::default()),
            clock,
            ttl,
            max_entries,
            eviction_policy,
        }
    }

    /// Inserts or replaces the partition key for `id`.
    ///
    /// The entry expires `ttl` after this call and moves to the back of the eviction order. When
    /// the cache is full and `id` is not present yet, exactly one entry is evicted first. A cache
    /// configured with zero capacity stores nothing.
    pub fn put(&self, id: &str, partition_key: PartitionKey) {
        if self.max_entries == 0 {
            return;
        }

        let expires_at = self.clock.instant().checked_add(self.ttl);
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let id = match state.remove(id) {
            Some((existing, _)) => existing,
            None => {
                if state.slots.len() >= self.max_entries
                    && let Some(evicted) = state.evict_front()
                {
                    tracing::debug!(keyhint.id = %evicted, "keyhint.evicted");
                }
                Arc::from(id)
            }
        };

        let sequence = state.take_sequence();
        state.order.insert(sequence, Arc::clone(&id));
        state.slots.insert(
            id,
            Slot {
                partition_key,
                expires_at,
                sequence,
            },
        );
    }

    /// Returns the cached partition key for `id`, if present and not expired.
    ///
    /// An expired entry is removed as a side effect, so a lookup can shrink the cache.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<PartitionKey> {
        let now = self.clock.instant();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let expired = match state.slots.get(id) {
            Some(slot) => slot.is_expired(now),
            None => {
                state.misses += 1;
                return None;
            }
        };

        if expired {
            state.remove(id);
            state.expirations += 1;
            state.misses += 1;
            tracing::debug!(keyhint.id = id, "keyhint.expired");
            return None;
        }

        if self.eviction_policy == EvictionPolicy::AccessOrder {
            state.touch(id);
        }
        state.hits += 1;
        state.slots.get(id).map(|slot| slot.partition_key.clone())
    }

    /// Removes the entry for `id`, returning whether one was present.
    ///
    /// Expired entries that were not looked up yet still count as present.
    pub fn invalidate(&self, id: &str) -> bool {
        self.state.lock().remove(id).is_some()
    }

    /// Removes the entry for `id` only if it still holds `partition_key`, returning whether it
    /// was removed.
    ///
    /// An entry replaced by a concurrent [`put`](Self::put) with a different key is left alone.
    pub fn invalidate_if(&self, id: &str, partition_key: &PartitionKey) -> bool {
        let mut state = self.state.lock();
        if state.slots.get(id).is_some_and(|slot| &slot.partition_key == partition_key) {
            state.remove(id);
            return true;
        }
        false
    }

    /// Removes all entries. Activity counters are kept.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.slots.clear();
        state.order.clear();
    }

    /// Returns a snapshot of the cache occupancy and activity counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            size: state.slots.len(),
            max_size: self.max_entries,
            hits: state.hits,
            misses: state.misses,
            expirations: state.expirations,
            evictions: state.evictions,
        }
    }

    /// Returns the number of entries, including expired entries that were not read yet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entry lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the capacity.
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Returns the eviction policy.
    #[must_use]
    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.eviction_policy
    }

    /// Returns the clock used for expiry.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }
}
