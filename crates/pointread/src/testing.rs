// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory document store for tests.
//!
//! [`MockStore`] keeps documents per partition, records every call it receives and can be told
//! to fail calls on demand, which makes it suitable for exercising every path of a
//! [`HybridReader`](crate::HybridReader) without a real store.

use std::fmt;
use std::sync::Arc;

use futures::lock::{Mutex as AsyncMutex, OwnedMutexGuard};
use keyhint::PartitionKey;
use parking_lot::Mutex;

use crate::{Document, DocumentStore, QuerySpec, StoreError, StoreErrorKind, StoreResponse};

/// A call received by a [`MockStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    /// A point read.
    ReadByKey {
        /// The requested id.
        id: String,
        /// The partition key used.
        partition_key: PartitionKey,
    },
    /// A query.
    Query {
        /// The query.
        spec: QuerySpec,
        /// The partition the query was scoped to; `None` for a cross-partition query.
        partition_key: Option<PartitionKey>,
    },
    /// A create.
    Create {
        /// The id of the created document.
        id: String,
    },
    /// A replace.
    Replace {
        /// The replaced id.
        id: String,
        /// The partition key used.
        partition_key: PartitionKey,
    },
    /// A delete.
    Delete {
        /// The deleted id.
        id: String,
        /// The partition key used.
        partition_key: PartitionKey,
    },
}

impl StoreOp {
    /// Returns `true` for point reads.
    #[must_use]
    pub fn is_point_read(&self) -> bool {
        matches!(self, Self::ReadByKey { .. })
    }

    /// Returns `true` for queries.
    #[must_use]
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;
type Partitioner<D> = Arc<dyn Fn(&D) -> PartitionKey + Send + Sync>;

struct Failure {
    kind: StoreErrorKind,
    predicate: FailPredicate,
}

/// A configurable in-memory [`DocumentStore`].
///
/// Documents are stored per partition key. The same id may be seeded into several partitions,
/// which makes cross-partition lookups by that id ambiguous.
///
/// # Examples
///
/// ```
/// use pointread::{DocumentStore, PartitionKey, testing::{MockStore, StoreOp, TestDocument}};
///
/// # futures::executor::block_on(async {
/// let store = MockStore::new();
/// store.seed("tenant-a", TestDocument::new("user-1", "tenant-a"));
///
/// let response = store.read_by_key("user-1", &PartitionKey::from("tenant-a")).await.unwrap();
/// assert!(response.resource.is_some());
/// assert_eq!(store.point_read_count(), 1);
///
/// store.fail_when(|op| matches!(op, StoreOp::ReadByKey { id, .. } if id == "user-1"));
/// assert!(store.read_by_key("user-1", &PartitionKey::from("tenant-a")).await.is_err());
/// # });
/// ```
pub struct MockStore<D> {
    documents: Arc<Mutex<Vec<(PartitionKey, D)>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    failure: Arc<Mutex<Option<Failure>>>,
    request_charge: Arc<Mutex<Option<f64>>>,
    partitioner: Partitioner<D>,
    gate: Arc<AsyncMutex<()>>,
}

impl<D> fmt::Debug for MockStore<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockStore")
            .field("documents", &self.documents.lock().len())
            .field("operations", &self.operations.lock().len())
            .field("fail_when", &self.failure.lock().is_some())
            .field("request_charge", &*self.request_charge.lock())
            .finish_non_exhaustive()
    }
}

impl<D> Clone for MockStore<D> {
    fn clone(&self) -> Self {
        Self {
            documents: Arc::clone(&self.documents),
            operations: Arc::clone(&self.operations),
            failure: Arc::clone(&self.failure),
            request_charge: Arc::clone(&self.request_charge),
            partitioner: Arc::clone(&self.partitioner),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<D: Document> Default for MockStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> MockStore<D> {
    /// Creates an empty store that places created documents in the partition named by their id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_partitioner(|document: &D| PartitionKey::from(document.id()))
    }

    /// Creates an empty store that places created documents in the partition `partitioner`
    /// returns.
    #[must_use]
    pub fn with_partitioner<F>(partitioner: F) -> Self
    where
        F: Fn(&D) -> PartitionKey + Send + Sync + 'static,
    {
        Self {
            documents: Arc::new(Mutex::new(Vec::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            request_charge: Arc::new(Mutex::new(None)),
            partitioner: Arc::new(partitioner),
            gate: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Adds a document to a partition without recording an operation.
    ///
    /// A document with the same id in the same partition is replaced.
    pub fn seed(&self, partition_key: impl Into<PartitionKey>, document: D) {
        let partition_key = partition_key.into();
        let mut documents = self.documents.lock();
        documents.retain(|(pk, existing)| !(pk == &partition_key && existing.id() == document.id()));
        documents.push((partition_key, document));
    }

    /// Removes a document from a partition without recording an operation.
    pub fn remove(&self, partition_key: impl Into<PartitionKey>, id: &str) -> bool {
        let partition_key = partition_key.into();
        let mut documents = self.documents.lock();
        let before = documents.len();
        documents.retain(|(pk, existing)| !(pk == &partition_key && existing.id() == id));
        documents.len() != before
    }

    /// Returns the number of stored documents across all partitions.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.lock().len()
    }

    /// Sets the request charge reported by every successful call.
    pub fn set_request_charge(&self, request_charge: Option<f64>) {
        *self.request_charge.lock() = request_charge;
    }

    /// Fails every call for which `predicate` returns `true` with a
    /// [`StoreErrorKind::Other`] error.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        self.fail_with(StoreErrorKind::Other, predicate);
    }

    /// Fails every call for which `predicate` returns `true` with an error of the given kind.
    pub fn fail_with<F>(&self, kind: StoreErrorKind, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.failure.lock() = Some(Failure {
            kind,
            predicate: Box::new(predicate),
        });
    }

    /// Lets every call succeed again.
    pub fn clear_failures(&self) {
        *self.failure.lock() = None;
    }

    /// Holds every subsequent call until the returned guard is dropped.
    ///
    /// Calls are recorded when they are issued, before they wait.
    ///
    /// # Panics
    ///
    /// Panics if the store is already paused.
    #[must_use]
    pub fn pause(&self) -> Paused {
        Paused {
            _guard: self.gate.try_lock_owned().expect("store is already paused"),
        }
    }

    /// Returns all recorded calls in the order they were issued.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Forgets all recorded calls.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    /// Returns the number of point reads issued.
    #[must_use]
    pub fn point_read_count(&self) -> usize {
        self.operations.lock().iter().filter(|op| op.is_point_read()).count()
    }

    /// Returns the number of queries issued.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.operations.lock().iter().filter(|op| op.is_query()).count()
    }

    async fn begin(&self, op: StoreOp, message: &'static str) -> Result<(), StoreError> {
        let failure = self
            .failure
            .lock()
            .as_ref()
            .filter(|failure| (failure.predicate)(&op))
            .map(|failure| failure.kind);
        self.operations.lock().push(op);

        drop(self.gate.lock().await);

        match failure {
            Some(kind) => Err(StoreError::from_kind(kind, message)),
            None => Ok(()),
        }
    }

    fn respond<T>(&self, resource: T) -> StoreResponse<T> {
        StoreResponse {
            resource,
            request_charge: *self.request_charge.lock(),
        }
    }
}

impl<D: Document> DocumentStore for MockStore<D> {
    type Document = D;

    async fn read_by_key(&self, id: &str, partition_key: &PartitionKey) -> Result<StoreResponse<Option<D>>, StoreError> {
        let op = StoreOp::ReadByKey {
            id: id.to_string(),
            partition_key: partition_key.clone(),
        };
        self.begin(op, "mock: read failed").await?;

        let found = self
            .documents
            .lock()
            .iter()
            .find(|(pk, document)| pk == partition_key && document.id() == id)
            .map(|(_, document)| document.clone());
        Ok(self.respond(found))
    }

    async fn query(&self, spec: &QuerySpec, partition_key: Option<&PartitionKey>) -> Result<StoreResponse<Vec<D>>, StoreError> {
        let op = StoreOp::Query {
            spec: spec.clone(),
            partition_key: partition_key.cloned(),
        };
        self.begin(op, "mock: query failed").await?;

        let id = spec.parameter("@id");
        let matches = self
            .documents
            .lock()
            .iter()
            .filter(|(pk, _)| partition_key.is_none_or(|wanted| pk == wanted))
            .filter(|(_, document)| id.is_none_or(|wanted| document.id() == wanted))
            .map(|(_, document)| document.clone())
            .collect();
        Ok(self.respond(matches))
    }

    async fn create(&self, document: D) -> Result<StoreResponse<D>, StoreError> {
        let op = StoreOp::Create {
            id: document.id().to_string(),
        };
        self.begin(op, "mock: create failed").await?;

        let partition_key = (self.partitioner)(&document);
        let mut documents = self.documents.lock();
        if documents
            .iter()
            .any(|(pk, existing)| pk == &partition_key && existing.id() == document.id())
        {
            return Err(StoreError::from_kind(StoreErrorKind::Conflict, "mock: document already exists"));
        }
        documents.push((partition_key, document.clone()));
        drop(documents);
        Ok(self.respond(document))
    }

    async fn replace(&self, id: &str, partition_key: &PartitionKey, document: D) -> Result<StoreResponse<D>, StoreError> {
        let op = StoreOp::Replace {
            id: id.to_string(),
            partition_key: partition_key.clone(),
        };
        self.begin(op, "mock: replace failed").await?;

        let mut documents = self.documents.lock();
        let Some(slot) = documents
            .iter_mut()
            .find(|(pk, existing)| pk == partition_key && existing.id() == id)
        else {
            return Err(StoreError::from_kind(StoreErrorKind::Other, "mock: document not found"));
        };
        slot.1 = document.clone();
        drop(documents);
        Ok(self.respond(document))
    }

    async fn delete(&self, id: &str, partition_key: &PartitionKey) -> Result<StoreResponse<bool>, StoreError> {
        let op = StoreOp::Delete {
            id: id.to_string(),
            partition_key: partition_key.clone(),
        };
        self.begin(op, "mock: delete failed").await?;

        let mut documents = self.documents.lock();
        let before = documents.len();
        documents.retain(|(pk, existing)| !(pk == partition_key && existing.id() == id));
        let deleted = documents.len() != before;
        drop(documents);
        Ok(self.respond(deleted))
    }
}

/// Keeps a [`MockStore`] paused while alive. Created by [`MockStore::pause`].
pub struct Paused {
    _guard: OwnedMutexGuard<()>,
}

impl fmt::Debug for Paused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paused").finish_non_exhaustive()
    }
}

/// A simple document for tests: an id, the tenant it belongs to and a body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestDocument {
    /// The document id.
    pub id: String,
    /// The tenant, typically used as the partition key.
    pub tenant: String,
    /// Free-form content.
    pub body: String,
}

impl TestDocument {
    /// Creates a document with an empty body.
    pub fn new(id: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tenant: tenant.into(),
            body: String::new(),
        }
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the tenant as a partition key.
    #[must_use]
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::from(self.tenant.as_str())
    }
}

impl Document for TestDocument {
    fn id(&self) -> &str {
        &self.id
    }
}
