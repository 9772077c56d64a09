// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shows how a reader learns partition keys and turns repeated lookups into point reads.

use pointread::testing::{MockStore, TestDocument};
use pointread::{HybridReader, PartitionKey, QuerySpec};
use tick::Clock;

#[tokio::main]
async fn main() -> Result<(), pointread::Error> {
    let store = MockStore::with_partitioner(TestDocument::partition_key);
    store.set_request_charge(Some(1.0));

    let reader = HybridReader::builder(store.clone(), Clock::new_frozen())
        .name("users")
        .partition_key_extractor(TestDocument::partition_key)
        .build();

    reader.create(TestDocument::new("user-1", "tenant-a").with_body("Alice")).await?;
    reader.create(TestDocument::new("user-2", "tenant-b").with_body("Bob")).await?;

    // The partition key is unknown: one cross-partition query, then the key is remembered.
    let alice = reader.get("user-1", None).await?;
    println!("first lookup: {alice:?}");

    // Served by a point read with the learned key.
    let alice = reader.get("user-1", None).await?;
    println!("second lookup: {alice:?}");

    // The caller knows the key: a point read right away.
    let bob = reader.get("user-2", Some(&PartitionKey::from("tenant-b"))).await?;
    println!("direct lookup: {bob:?}");

    let everyone = reader.batch().get_many(["user-1", "user-2", "user-3"]).await?;
    println!("batch found {} of 3 documents", everyone.len());

    let tenant_a = reader.query(&QuerySpec::new("SELECT * FROM c"), Some(&PartitionKey::from("tenant-a"))).await?;
    println!("tenant-a holds {} documents", tenant_a.len());

    println!(
        "store calls: {} queries, {} point reads; cache: {:?}",
        store.query_count(),
        store.point_read_count(),
        reader.cache_stats()
    );

    Ok(())
}
