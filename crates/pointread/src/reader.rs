// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The partition-key-aware reader.

use std::fmt;
use std::sync::Arc;

use keyhint::{CacheStats, PartitionKey, PartitionKeyCache};
use tick::Clock;
use uniflight::Merger;

use crate::{
    BatchReader, Document, DocumentStore, Error, HybridReaderBuilder, QuerySpec, Result, StoreError, StoreErrorKind,
    StoreResponse,
    telemetry::{Activity, Event, Operation, Telemetry, ext::ClockExt},
};

/// Derives the partition key of a document found by a cross-partition query.
pub type PartitionKeyExtractor<D> = Arc<dyn Fn(&D) -> PartitionKey + Send + Sync>;

pub(crate) type QueryResult<D> = std::result::Result<StoreResponse<Vec<D>>, StoreError>;

/// Reads documents by id, preferring cheap point reads over cross-partition queries.
///
/// A lookup resolves in one of three ways:
///
/// 1. The caller passes a partition key: one point read.
/// 2. The partition key of the id was learned earlier: one point read with the cached key. If the
///    document is no longer there, the cached key is dropped and the lookup continues with 3.
/// 3. Otherwise: one cross-partition query by id. A single match teaches the reader the
///    document's partition key; more than one match is an [`ErrorKind::AmbiguousResolution`]
///    error.
///
/// Not-found is `Ok(None)`, never an error.
///
/// [`ErrorKind::AmbiguousResolution`]: crate::ErrorKind::AmbiguousResolution
pub struct HybridReader<S: DocumentStore> {
    store: S,
    cache: Arc<PartitionKeyCache>,
    extractor: PartitionKeyExtractor<S::Document>,
    merger: Option<Merger<String, QueryResult<S::Document>>>,
    telemetry: Telemetry,
    clock: Clock,
}

impl<S: DocumentStore> HybridReader<S> {
    /// Creates a reader with default options.
    ///
    /// The partition key of a document found by query defaults to its id; use
    /// [`builder`](Self::builder) to configure a different extractor.
    #[must_use]
    pub fn new(store: S, clock: Clock) -> Self {
        Self::builder(store, clock).build()
    }

    /// Creates a builder for configuring a reader.
    #[must_use]
    pub fn builder(store: S, clock: Clock) -> HybridReaderBuilder<S> {
        HybridReaderBuilder::new(store, clock)
    }

    pub(crate) fn from_parts(
        store: S,
        cache: Arc<PartitionKeyCache>,
        extractor: PartitionKeyExtractor<S::Document>,
        coalesce_queries: bool,
        telemetry: Telemetry,
        clock: Clock,
    ) -> Self {
        Self {
            store,
            cache,
            extractor,
            merger: coalesce_queries.then(Merger::new),
            telemetry,
            clock,
        }
    }

    /// Looks up a document by id.
    ///
    /// Pass the partition key when it is known; otherwise the reader resolves it from its cache
    /// or, failing that, with a cross-partition query.
    ///
    /// # Errors
    ///
    /// Returns an error if a store call fails, or if the id is not unique across partitions.
    pub async fn get(&self, id: &str, partition_key: Option<&PartitionKey>) -> Result<Option<S::Document>> {
        if let Some(partition_key) = partition_key {
            return self.point_read(id, partition_key, Activity::PointRead).await;
        }

        if let Some(cached) = self.cache.lookup(id) {
            if let Some(document) = self.point_read(id, &cached, Activity::CachedHint).await? {
                return Ok(Some(document));
            }
            if self.cache.invalidate_if(id, &cached) {
                self.telemetry.record_cache_size(&self.cache);
            }
            self.telemetry.record(
                &Event::new(Operation::Get, Activity::StaleHint)
                    .id(id)
                    .partition_key(Some(&cached)),
            );
        }

        self.resolve_by_query(id).await
    }

    /// Returns `true` if a document with the given id exists.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`get`](Self::get).
    pub async fn exists(&self, id: &str, partition_key: Option<&PartitionKey>) -> Result<bool> {
        Ok(self.get(id, partition_key).await?.is_some())
    }

    /// Creates a document and returns the stored version.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the document.
    pub async fn create(&self, document: S::Document) -> Result<S::Document> {
        let timed = self.clock.timed(self.store.create(document)).await;
        match timed.result {
            Ok(response) => {
                self.telemetry.record(
                    &Event::new(Operation::Create, Activity::Ok)
                        .id(response.resource.id())
                        .duration(timed.duration)
                        .request_charge(response.request_charge),
                );
                Ok(response.resource)
            }
            Err(error) => Err(self.fail(Operation::Create, None, None, timed.duration, error)),
        }
    }

    /// Replaces an existing document and returns the stored version.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the replacement.
    pub async fn update(&self, id: &str, partition_key: &PartitionKey, document: S::Document) -> Result<S::Document> {
        let timed = self.clock.timed(self.store.replace(id, partition_key, document)).await;
        match timed.result {
            Ok(response) => {
                self.telemetry.record(
                    &Event::new(Operation::Update, Activity::Ok)
                        .id(id)
                        .partition_key(Some(partition_key))
                        .duration(timed.duration)
                        .request_charge(response.request_charge),
                );
                Ok(response.resource)
            }
            Err(error) => Err(self.fail(Operation::Update, Some(id), Some(partition_key), timed.duration, error)),
        }
    }

    /// Deletes a document, returning `false` if it did not exist.
    ///
    /// Any partition key learned for the id is forgotten first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    pub async fn delete(&self, id: &str, partition_key: &PartitionKey) -> Result<bool> {
        if self.cache.invalidate(id) {
            self.telemetry.record_cache_size(&self.cache);
        }

        let timed = self.clock.timed(self.store.delete(id, partition_key)).await;
        match timed.result {
            Ok(response) => {
                let activity = if response.resource { Activity::Ok } else { Activity::NotFound };
                self.telemetry.record(
                    &Event::new(Operation::Delete, activity)
                        .id(id)
                        .partition_key(Some(partition_key))
                        .duration(timed.duration)
                        .request_charge(response.request_charge),
                );
                Ok(response.resource)
            }
            Err(error) => Err(self.fail(Operation::Delete, Some(id), Some(partition_key), timed.duration, error)),
        }
    }

    /// Runs a predicate query, within one partition or across all partitions when
    /// `partition_key` is `None`.
    ///
    /// Query results never touch the partition key cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    pub async fn query(&self, spec: &QuerySpec, partition_key: Option<&PartitionKey>) -> Result<Vec<S::Document>> {
        let timed = self.clock.timed(self.store.query(spec, partition_key)).await;
        match timed.result {
            Ok(response) => {
                self.telemetry.record(
                    &Event::new(Operation::Query, Activity::Ok)
                        .query(&spec.query)
                        .partition_key(partition_key)
                        .result_count(response.resource.len())
                        .duration(timed.duration)
                        .request_charge(response.request_charge),
                );
                Ok(response.resource)
            }
            Err(error) => {
                self.telemetry.record(
                    &Event::new(Operation::Query, Activity::Error)
                        .query(&spec.query)
                        .partition_key(partition_key)
                        .duration(timed.duration),
                );
                Err(Error::store(Operation::Query.as_str(), error))
            }
        }
    }

    /// Returns a view that reads many documents concurrently.
    #[must_use]
    pub fn batch(&self) -> BatchReader<'_, S> {
        BatchReader::new(self)
    }

    /// Returns the partition key cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<PartitionKeyCache> {
        &self.cache
    }

    /// Returns a snapshot of the partition key cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Forgets every learned partition key.
    pub fn clear_cache(&self) {
        self.cache.clear();
        self.telemetry.record_cache_size(&self.cache);
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the name reported in telemetry.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.telemetry.name()
    }

    pub(crate) fn clock(&self) -> &Clock {
        &self.clock
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    async fn point_read(&self, id: &str, partition_key: &PartitionKey, found: Activity) -> Result<Option<S::Document>> {
        let timed = self.clock.timed(self.store.read_by_key(id, partition_key)).await;
        let response = match timed.result {
            Ok(response) => response,
            Err(error) => return Err(self.fail(Operation::Get, Some(id), Some(partition_key), timed.duration, error)),
        };

        let activity = if response.resource.is_some() { found } else { Activity::NotFound };
        self.telemetry.record(
            &Event::new(Operation::Get, activity)
                .id(id)
                .partition_key(Some(partition_key))
                .duration(timed.duration)
                .request_charge(response.request_charge),
        );

        if response.resource.is_some() && found == Activity::PointRead {
            self.cache.put(id, partition_key.clone());
            self.telemetry.record_cache_size(&self.cache);
        }

        Ok(response.resource)
    }

    async fn resolve_by_query(&self, id: &str) -> Result<Option<S::Document>> {
        self.telemetry.record(&Event::new(Operation::Get, Activity::QueryFallback).id(id));

        let spec = QuerySpec::by_id(id);
        let query = async {
            match &self.merger {
                Some(merger) => merger
                    .execute(&id.to_owned(), || self.store.query(&spec, None))
                    .await
                    .unwrap_or_else(|panicked| Err(StoreError::from_kind(StoreErrorKind::Other, panicked))),
                None => self.store.query(&spec, None).await,
            }
        };
        let timed = self.clock.timed(query).await;
        let response = match timed.result {
            Ok(response) => response,
            Err(error) => return Err(self.fail(Operation::Get, Some(id), None, timed.duration, error)),
        };

        let mut matches = response.resource;
        let event = Event::new(Operation::Get, Activity::Resolved)
            .id(id)
            .query(&spec.query)
            .result_count(matches.len())
            .duration(timed.duration)
            .request_charge(response.request_charge);

        match matches.len() {
            0 => {
                self.telemetry.record(&Event { activity: Activity::NotFound, ..event });
                Ok(None)
            }
            1 => {
                let document = matches.pop();
                if let Some(document) = &document {
                    let partition_key = (self.extractor)(document);
                    self.telemetry.record(&event.partition_key(Some(&partition_key)));
                    self.cache.put(id, partition_key);
                    self.telemetry.record_cache_size(&self.cache);
                }
                Ok(document)
            }
            count => {
                self.telemetry.record(&Event { activity: Activity::Ambiguous, ..event });
                Err(Error::ambiguous(Operation::Get.as_str(), id, count))
            }
        }
    }

    fn fail(
        &self,
        operation: Operation,
        id: Option<&str>,
        partition_key: Option<&PartitionKey>,
        duration: std::time::Duration,
        error: StoreError,
    ) -> Error {
        let mut event = Event::new(operation, Activity::Error)
            .partition_key(partition_key)
            .duration(duration);
        event.id = id;
        self.telemetry.record(&event);
        Error::store(operation.as_str(), error)
    }
}

impl<S: DocumentStore> fmt::Debug for HybridReader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridReader")
            .field("name", &self.telemetry.name())
            .field("cache", &self.cache)
            .field("coalesce_queries", &self.merger.is_some())
            .finish_non_exhaustive()
    }
}
