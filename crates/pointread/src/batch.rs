// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Concurrent multi-document reads.

use futures::future::{join_all, try_join_all};
use keyhint::PartitionKey;

use crate::{DocumentStore, HybridReader, Result, telemetry::ext::ClockExt};

/// One lookup in a batch: an id and, if known, its partition key.
///
/// # Examples
///
/// ```
/// use pointread::{PartitionKey, ReadRequest};
///
/// let by_id = ReadRequest::from("user-1");
/// let with_key = ReadRequest::from(("user-2", PartitionKey::from("tenant-a")));
///
/// assert!(by_id.partition_key.is_none());
/// assert_eq!(with_key.partition_key, Some(PartitionKey::from("tenant-a")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadRequest {
    /// The document id.
    pub id: String,
    /// The partition key, if known.
    pub partition_key: Option<PartitionKey>,
}

impl ReadRequest {
    /// Creates a request without a partition key.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            partition_key: None,
        }
    }

    /// Sets the partition key.
    #[must_use]
    pub fn with_partition_key(mut self, partition_key: impl Into<PartitionKey>) -> Self {
        self.partition_key = Some(partition_key.into());
        self
    }
}

impl From<&str> for ReadRequest {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ReadRequest {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<(&str, PartitionKey)> for ReadRequest {
    fn from((id, partition_key): (&str, PartitionKey)) -> Self {
        Self {
            id: id.to_string(),
            partition_key: Some(partition_key),
        }
    }
}

impl From<(&str, Option<PartitionKey>)> for ReadRequest {
    fn from((id, partition_key): (&str, Option<PartitionKey>)) -> Self {
        Self {
            id: id.to_string(),
            partition_key,
        }
    }
}

/// Reads many documents concurrently through a [`HybridReader`].
///
/// Every request goes through [`HybridReader::get`], so batch lookups learn and reuse partition
/// keys exactly like single lookups. All lookups of a batch run at once; there is no
/// concurrency limit.
///
/// Created by [`HybridReader::batch`].
#[derive(Debug)]
pub struct BatchReader<'r, S: DocumentStore> {
    reader: &'r HybridReader<S>,
}

impl<'r, S: DocumentStore> BatchReader<'r, S> {
    pub(crate) fn new(reader: &'r HybridReader<S>) -> Self {
        Self { reader }
    }

    /// Returns the documents that exist, skipping ids that were not found.
    ///
    /// The order of the returned documents is unspecified.
    ///
    /// # Errors
    ///
    /// Returns the first error any lookup produces; the documents found by the other lookups are
    /// discarded.
    pub async fn get_many<I, R>(&self, requests: I) -> Result<Vec<S::Document>>
    where
        I: IntoIterator<Item = R>,
        R: Into<ReadRequest>,
    {
        let requests: Vec<ReadRequest> = requests.into_iter().map(Into::into).collect();
        let lookups = requests
            .iter()
            .map(|request| self.reader.get(&request.id, request.partition_key.as_ref()));

        let timed = self.reader.clock().timed(try_join_all(lookups)).await;
        let telemetry = self.reader.telemetry();

        match timed.result {
            Ok(results) => {
                let documents: Vec<_> = results.into_iter().flatten().collect();
                telemetry.record_batch(requests.len(), documents.len(), false, timed.duration);
                Ok(documents)
            }
            Err(error) => {
                telemetry.record_batch(requests.len(), 0, true, timed.duration);
                Err(error)
            }
        }
    }

    /// Returns one result per request, in request order.
    ///
    /// Unlike [`get_many`](Self::get_many), a failed lookup does not fail the batch.
    pub async fn get_each<I, R>(&self, requests: I) -> Vec<Result<Option<S::Document>>>
    where
        I: IntoIterator<Item = R>,
        R: Into<ReadRequest>,
    {
        let requests: Vec<ReadRequest> = requests.into_iter().map(Into::into).collect();
        let lookups = requests
            .iter()
            .map(|request| self.reader.get(&request.id, request.partition_key.as_ref()));

        let timed = self.reader.clock().timed(join_all(lookups)).await;
        let found = timed.result.iter().filter(|result| matches!(result, Ok(Some(_)))).count();
        let failed = timed.result.iter().any(std::result::Result::is_err);
        self.reader
            .telemetry()
            .record_batch(requests.len(), found, failed, timed.duration);

        timed.result
    }
}
