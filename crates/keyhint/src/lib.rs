// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Bounded, time-expiring cache of document partition keys.
//!
//! Partitioned document stores can serve a single document cheaply when both its id and its
//! partition key are known (a point read). When only the id is known, the document has to be
//! found with a cross-partition query. [`PartitionKeyCache`] remembers which partition a
//! document id lives in so that repeated lookups can take the point-read path.
//!
//! # Overview
//!
//! - Every entry expires a fixed time after it was written. Expiry is lazy: an expired entry is
//!   removed when it is looked up, there is no background sweeper.
//! - The number of entries is bounded. Inserting a new id into a full cache evicts exactly one
//!   entry first, chosen by the configured [`EvictionPolicy`].
//! - All operations are synchronous, infallible and safe to call from many threads at once.
//!
//! # Examples
//!
//! ```
//! use keyhint::{PartitionKey, PartitionKeyCache};
//! use std::time::Duration;
//! use tick::Clock;
//!
//! let clock = Clock::new_frozen();
//! let cache = PartitionKeyCache::builder(clock)
//!     .ttl(Duration::from_secs(60))
//!     .max_entries(1_000)
//!     .build();
//!
//! cache.put("user-1", PartitionKey::from("tenant-a"));
//! assert_eq!(cache.lookup("user-1"), Some(PartitionKey::from("tenant-a")));
//! assert_eq!(cache.stats().size, 1);
//! ```

pub mod builder;
pub mod cache;
mod key;

#[doc(inline)]
pub use builder::PartitionKeyCacheBuilder;
#[doc(inline)]
pub use cache::{CacheStats, EvictionPolicy, PartitionKeyCache};
#[doc(inline)]
pub use key::PartitionKey;
