// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring a [`HybridReader`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use keyhint::{EvictionPolicy, PartitionKey, PartitionKeyCache};
use tick::Clock;

#[cfg(any(feature = "metrics", test))]
use crate::telemetry::metrics::Metrics;
use crate::{Document, DocumentStore, HybridReader, PartitionKeyExtractor, ReaderOptions, telemetry::Telemetry};

const DEFAULT_NAME: &str = "pointread";

/// Builder for configuring a [`HybridReader`].
///
/// Created by [`HybridReader::builder`].
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-util")]
/// # fn main() {
/// use pointread::{EvictionPolicy, HybridReader, PartitionKey, testing::{MockStore, TestDocument}};
/// use std::time::Duration;
/// use tick::Clock;
///
/// let reader = HybridReader::builder(MockStore::<TestDocument>::new(), Clock::new_frozen())
///     .name("users")
///     .cache_ttl(Duration::from_secs(60))
///     .cache_max_entries(1_000)
///     .eviction_policy(EvictionPolicy::AccessOrder)
///     .partition_key_extractor(|doc: &TestDocument| PartitionKey::from(doc.tenant.as_str()))
///     .enable_logging()
///     .build();
///
/// assert_eq!(reader.name(), "users");
/// assert_eq!(reader.cache().max_entries(), 1_000);
/// # }
/// # #[cfg(not(feature = "test-util"))]
/// # fn main() {}
/// ```
pub struct HybridReaderBuilder<S: DocumentStore> {
    store: S,
    clock: Clock,
    name: &'static str,
    options: ReaderOptions,
    extractor: Option<PartitionKeyExtractor<S::Document>>,
    cache: Option<Arc<PartitionKeyCache>>,
    #[cfg(any(feature = "metrics", test))]
    metrics: Option<Metrics>,
}

impl<S: DocumentStore> HybridReaderBuilder<S> {
    pub(crate) fn new(store: S, clock: Clock) -> Self {
        Self {
            store,
            clock,
            name: DEFAULT_NAME,
            options: ReaderOptions::default(),
            extractor: None,
            cache: None,
            #[cfg(any(feature = "metrics", test))]
            metrics: None,
        }
    }

    /// Sets the name reported in logs and metrics, typically the container name.
    ///
    /// Defaults to `"pointread"`.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Replaces every option at once.
    #[must_use]
    pub fn options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets how long a learned partition key stays valid.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.options.cache_ttl = ttl;
        self
    }

    /// Sets how many partition keys are remembered. Zero disables the cache.
    #[must_use]
    pub fn cache_max_entries(mut self, max_entries: usize) -> Self {
        self.options.cache_max_entries = max_entries;
        self
    }

    /// Sets which learned partition key is dropped when the cache is full.
    #[must_use]
    pub fn eviction_policy(mut self, eviction_policy: EvictionPolicy) -> Self {
        self.options.eviction_policy = eviction_policy;
        self
    }

    /// Shares an existing partition key cache instead of creating one.
    ///
    /// The cache TTL, capacity and eviction policy options are ignored when a cache is supplied.
    #[must_use]
    pub fn cache(mut self, cache: Arc<PartitionKeyCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets how the partition key of a document found by query is derived.
    ///
    /// Defaults to the document id.
    #[must_use]
    pub fn partition_key_extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&S::Document) -> PartitionKey + Send + Sync + 'static,
    {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    /// Enables or disables a `tracing` event for every store call.
    #[must_use]
    pub fn logging(mut self, enabled: bool) -> Self {
        self.options.logging_enabled = enabled;
        self
    }

    /// Enables a `tracing` event for every store call.
    #[must_use]
    pub fn enable_logging(self) -> Self {
        self.logging(true)
    }

    /// Lets concurrent cross-partition lookups of the same id share one store query.
    #[must_use]
    pub fn coalesce_queries(mut self, enabled: bool) -> Self {
        self.options.coalesce_queries = enabled;
        self
    }

    /// Records OpenTelemetry metrics through the given meter provider.
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    #[must_use]
    pub fn metrics(mut self, meter_provider: &dyn opentelemetry::metrics::MeterProvider) -> Self {
        self.metrics = Some(Metrics::new(meter_provider));
        self
    }

    /// Builds the reader.
    #[must_use]
    pub fn build(self) -> HybridReader<S> {
        let options = self.options;
        let cache = self.cache.unwrap_or_else(|| {
            Arc::new(
                PartitionKeyCache::builder(self.clock.clone())
                    .ttl(options.cache_ttl)
                    .max_entries(options.cache_max_entries)
                    .eviction_policy(options.eviction_policy)
                    .build(),
            )
        });
        let extractor = self
            .extractor
            .unwrap_or_else(|| Arc::new(|document: &S::Document| PartitionKey::from(document.id())));

        let telemetry = Telemetry::new(self.name, options.logging_enabled);
        #[cfg(any(feature = "metrics", test))]
        let telemetry = telemetry.with_metrics(self.metrics);

        HybridReader::from_parts(self.store, cache, extractor, options.coalesce_queries, telemetry, self.clock)
    }
}

impl<S: DocumentStore> fmt::Debug for HybridReaderBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridReaderBuilder")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("custom_extractor", &self.extractor.is_some())
            .field("shared_cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}
