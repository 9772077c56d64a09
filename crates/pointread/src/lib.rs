// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Partition-key-aware document reads.
//!
//! Partitioned document stores resolve a document cheaply when both its id and its partition key
//! are known (a point read) and expensively when only the id is known (a cross-partition query).
//! This crate wraps any [`DocumentStore`] in a [`HybridReader`] that:
//!
//! - uses a point read whenever the caller supplies a partition key,
//! - otherwise consults a [`PartitionKeyCache`] of partition keys learned from earlier reads,
//! - otherwise falls back to a cross-partition query and remembers the partition key it finds.
//!
//! A [`BatchReader`] fans many lookups out concurrently through the same reader.
//!
//! # Examples
//!
//! ```
//! # #[cfg(feature = "test-util")]
//! # fn main() {
//! use pointread::{HybridReader, PartitionKey, testing::{MockStore, TestDocument}};
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let store = MockStore::new();
//! store.seed("tenant-a", TestDocument::new("user-1", "tenant-a"));
//!
//! let reader = HybridReader::builder(store.clone(), Clock::new_frozen())
//!     .partition_key_extractor(|doc: &TestDocument| PartitionKey::from(doc.tenant.as_str()))
//!     .build();
//!
//! // First lookup without a partition key queries across partitions and learns the key.
//! let doc = reader.get("user-1", None).await?;
//! assert_eq!(doc.map(|d| d.tenant), Some("tenant-a".to_string()));
//!
//! // Second lookup is served by a point read.
//! let doc = reader.get("user-1", None).await?;
//! assert!(doc.is_some());
//! assert_eq!(store.query_count(), 1);
//! assert_eq!(store.point_read_count(), 1);
//! # Ok::<(), pointread::Error>(())
//! # }).unwrap();
//! # }
//! # #[cfg(not(feature = "test-util"))]
//! # fn main() {}
//! ```
//!
//! # Features
//!
//! - `metrics`: records OpenTelemetry metrics for every store call.
//! - `serde`: (de)serialization of [`PartitionKey`].
//! - `test-util`: the [`testing`] module with an in-memory [`DocumentStore`].

mod batch;
mod builder;
mod document;
mod error;
mod options;
mod reader;
mod store;
mod telemetry;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use batch::{BatchReader, ReadRequest};
#[doc(inline)]
pub use builder::HybridReaderBuilder;
#[doc(inline)]
pub use document::{Document, QueryParameter, QuerySpec, StoreResponse};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result, StoreError, StoreErrorKind};
#[doc(inline)]
pub use keyhint::{CacheStats, EvictionPolicy, PartitionKey, PartitionKeyCache};
#[doc(inline)]
pub use options::ReaderOptions;
#[doc(inline)]
pub use reader::{HybridReader, PartitionKeyExtractor};
#[doc(inline)]
pub use store::DocumentStore;
