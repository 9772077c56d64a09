// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use keyhint::EvictionPolicy;

/// Plain configuration for a [`HybridReader`](crate::HybridReader).
///
/// Every field can also be set on the [`HybridReaderBuilder`](crate::HybridReaderBuilder); this
/// struct exists so configuration can be loaded or passed around as a single value.
///
/// # Examples
///
/// ```
/// use pointread::ReaderOptions;
/// use std::time::Duration;
///
/// let options = ReaderOptions {
///     cache_ttl: Duration::from_secs(60),
///     logging_enabled: true,
///     ..ReaderOptions::default()
/// };
/// assert_eq!(options.cache_max_entries, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// How long a learned partition key stays valid. Defaults to 5 minutes.
    pub cache_ttl: Duration,
    /// Maximum number of learned partition keys. Defaults to 10,000; zero disables the cache.
    pub cache_max_entries: usize,
    /// Which learned partition key is dropped when the cache is full.
    pub eviction_policy: EvictionPolicy,
    /// Emits a `tracing` event for every store call. Defaults to `false`.
    pub logging_enabled: bool,
    /// Lets concurrent cross-partition lookups of the same id share one query. Defaults to `false`.
    pub coalesce_queries: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            cache_ttl: keyhint::cache::DEFAULT_TTL,
            cache_max_entries: keyhint::cache::DEFAULT_MAX_ENTRIES,
            eviction_policy: EvictionPolicy::default(),
            logging_enabled: false,
            coalesce_queries: false,
        }
    }
}
