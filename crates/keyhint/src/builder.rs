// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring a [`PartitionKeyCache`].

use std::time::Duration;

use tick::Clock;

use crate::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL, EvictionPolicy, PartitionKeyCache};

/// Builder for configuring a [`PartitionKeyCache`].
///
/// # Examples
///
/// ```
/// use keyhint::{EvictionPolicy, PartitionKeyCache};
/// use std::time::Duration;
/// use tick::Clock;
///
/// let cache = PartitionKeyCache::builder(Clock::new_frozen())
///     .ttl(Duration::from_secs(600))
///     .max_entries(50_000)
///     .eviction_policy(EvictionPolicy::AccessOrder)
///     .build();
///
/// assert_eq!(cache.ttl(), Duration::from_secs(600));
/// assert_eq!(cache.stats().max_size, 50_000);
/// ```
#[derive(Debug)]
pub struct PartitionKeyCacheBuilder {
    clock: Clock,
    ttl: Duration,
    max_entries: usize,
    eviction_policy: EvictionPolicy,
}

impl PartitionKeyCacheBuilder {
    pub(crate) fn new(clock: Clock) -> Self {
        Self {
            clock,
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
            eviction_policy: EvictionPolicy::default(),
        }
    }

    /// Sets how long an entry stays valid after it was written.
    ///
    /// Defaults to 5 minutes.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the maximum number of entries.
    ///
    /// Defaults to 10,000. Zero disables the cache: puts are ignored and every lookup misses.
    #[must_use]
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Sets which entry is evicted when a new id is inserted into a full cache.
    ///
    /// Defaults to [`EvictionPolicy::InsertionOrder`].
    #[must_use]
    pub fn eviction_policy(mut self, eviction_policy: EvictionPolicy) -> Self {
        self.eviction_policy = eviction_policy;
        self
    }

    /// Builds the cache.
    #[must_use]
    pub fn build(self) -> PartitionKeyCache {
        PartitionKeyCache::from_parts(self.clock, self.ttl, self.max_entries, self.eviction_policy)
    }
}
