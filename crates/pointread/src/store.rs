// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The contract a partitioned document store must fulfill.

use std::sync::Arc;

use keyhint::PartitionKey;

use crate::{Document, QuerySpec, StoreError, StoreResponse};

/// A partitioned document store.
///
/// Implement this trait to put a [`HybridReader`](crate::HybridReader) in front of a store. The
/// reader never manages the store's lifecycle; it only issues the calls below.
///
/// A point read ([`read_by_key`](Self::read_by_key)) resolves a document by id and partition key.
/// A query without a partition key scans every partition. Not-found is reported as `None` or
/// `false`, never as an error.
pub trait DocumentStore: Send + Sync {
    /// The document type held by the store.
    type Document: Document;

    /// Reads a single document by id within the given partition.
    fn read_by_key(
        &self,
        id: &str,
        partition_key: &PartitionKey,
    ) -> impl Future<Output = Result<StoreResponse<Option<Self::Document>>, StoreError>> + Send;

    /// Runs a predicate query, within one partition or across all partitions when
    /// `partition_key` is `None`.
    fn query(
        &self,
        spec: &QuerySpec,
        partition_key: Option<&PartitionKey>,
    ) -> impl Future<Output = Result<StoreResponse<Vec<Self::Document>>, StoreError>> + Send;

    /// Creates a document.
    fn create(&self, document: Self::Document) -> impl Future<Output = Result<StoreResponse<Self::Document>, StoreError>> + Send;

    /// Replaces an existing document.
    fn replace(
        &self,
        id: &str,
        partition_key: &PartitionKey,
        document: Self::Document,
    ) -> impl Future<Output = Result<StoreResponse<Self::Document>, StoreError>> + Send;

    /// Deletes a document, returning `false` when it did not exist.
    fn delete(&self, id: &str, partition_key: &PartitionKey) -> impl Future<Output = Result<StoreResponse<bool>, StoreError>> + Send;
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore,
{
    type Document = S::Document;

    fn read_by_key(
        &self,
        id: &str,
        partition_key: &PartitionKey,
    ) -> impl Future<Output = Result<StoreResponse<Option<Self::Document>>, StoreError>> + Send {
        (**self).read_by_key(id, partition_key)
    }

    fn query(
        &self,
        spec: &QuerySpec,
        partition_key: Option<&PartitionKey>,
    ) -> impl Future<Output = Result<StoreResponse<Vec<Self::Document>>, StoreError>> + Send {
        (**self).query(spec, partition_key)
    }

    fn create(&self, document: Self::Document) -> impl Future<Output = Result<StoreResponse<Self::Document>, StoreError>> + Send {
        (**self).create(document)
    }

    fn replace(
        &self,
        id: &str,
        partition_key: &PartitionKey,
        document: Self::Document,
    ) -> impl Future<Output = Result<StoreResponse<Self::Document>, StoreError>> + Send {
        (**self).replace(id, partition_key, document)
    }

    fn delete(&self, id: &str, partition_key: &PartitionKey) -> impl Future<Output = Result<StoreResponse<bool>, StoreError>> + Send {
        (**self).delete(id, partition_key)
    }
}
