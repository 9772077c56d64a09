// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `PartitionKeyCache`.

use std::time::Duration;

use keyhint::{CacheStats, EvictionPolicy, PartitionKey, PartitionKeyCache};
use tick::{Clock, ClockControl};

static_assertions::assert_impl_all!(PartitionKeyCache: Send, Sync);

fn key(value: &str) -> PartitionKey {
    PartitionKey::from(value)
}

#[test]
fn new_uses_defaults() {
    let cache = PartitionKeyCache::new(Clock::new_frozen());

    assert_eq!(cache.ttl(), Duration::from_secs(300));
    assert_eq!(cache.max_entries(), 10_000);
    assert_eq!(cache.eviction_policy(), EvictionPolicy::InsertionOrder);
    assert!(cache.is_empty());
}

#[test]
fn put_then_lookup_returns_key() {
    let cache = PartitionKeyCache::new(Clock::new_frozen());

    cache.put("doc-1", key("pk-1"));

    assert_eq!(cache.lookup("doc-1"), Some(key("pk-1")));
}

#[test]
fn lookup_missing_returns_none() {
    let cache = PartitionKeyCache::new(Clock::new_frozen());

    assert!(cache.lookup("missing").is_none());
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn composite_keys_round_trip() {
    let cache = PartitionKeyCache::new(Clock::new_frozen());
    let composite = PartitionKey::from(["tenant", "region"]);

    cache.put("doc-1", composite.clone());

    assert_eq!(cache.lookup("doc-1"), Some(composite));
}

#[test]
fn entry_is_valid_until_ttl_elapses() {
    let control = ClockControl::new();
    let cache = PartitionKeyCache::builder(control.to_clock())
        .ttl(Duration::from_secs(10))
        .build();

    cache.put("doc-1", key("pk-1"));
    control.advance(Duration::from_millis(9_999));

    assert_eq!(cache.lookup("doc-1"), Some(key("pk-1")));
}

#[test]
fn entry_expires_at_ttl_and_is_removed() {
    let control = ClockControl::new();
    let cache = PartitionKeyCache::builder(control.to_clock())
        .ttl(Duration::from_secs(10))
        .build();

    cache.put("doc-1", key("pk-1"));
    control.advance(Duration::from_secs(10));

    assert_eq!(cache.stats().size, 1, "expiry is lazy, the entry stays until read");
    assert!(cache.lookup("doc-1").is_none());
    assert_eq!(cache.stats().size, 0);
    assert_eq!(cache.stats().expirations, 1);
}

#[test]
fn reput_refreshes_expiry() {
    let control = ClockControl::new();
    let cache = PartitionKeyCache::builder(control.to_clock())
        .ttl(Duration::from_secs(10))
        .build();

    cache.put("doc-1", key("pk-1"));
    control.advance(Duration::from_secs(8));
    cache.put("doc-1", key("pk-2"));
    control.advance(Duration::from_secs(8));

    assert_eq!(cache.lookup("doc-1"), Some(key("pk-2")));
}

#[test]
fn overflow_evicts_first_inserted() {
    let cache = PartitionKeyCache::builder(Clock::new_frozen()).max_entries(3).build();

    for i in 0..4 {
        cache.put(&format!("doc-{i}"), key(&format!("pk-{i}")));
    }

    assert_eq!(cache.stats().size, 3);
    assert!(cache.lookup("doc-0").is_none());
    for i in 1..4 {
        assert_eq!(cache.lookup(&format!("doc-{i}")), Some(key(&format!("pk-{i}"))));
    }
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn insertion_order_ignores_recent_reads() {
    let cache = PartitionKeyCache::builder(Clock::new_frozen()).max_entries(2).build();

    cache.put("a", key("1"));
    cache.put("b", key("2"));
    assert!(cache.lookup("a").is_some());
    cache.put("c", key("3"));

    assert!(cache.lookup("a").is_none());
    assert!(cache.lookup("b").is_some());
    assert!(cache.lookup("c").is_some());
}

#[test]
fn access_order_keeps_recent_reads() {
    let cache = PartitionKeyCache::builder(Clock::new_frozen())
        .max_entries(2)
        .eviction_policy(EvictionPolicy::AccessOrder)
        .build();

    cache.put("a", key("1"));
    cache.put("b", key("2"));
    assert!(cache.lookup("a").is_some());
    cache.put("c", key("3"));

    assert!(cache.lookup("a").is_some());
    assert!(cache.lookup("b").is_none());
    assert!(cache.lookup("c").is_some());
}

#[test]
fn reput_moves_entry_to_back_of_eviction_order() {
    let cache = PartitionKeyCache::builder(Clock::new_frozen()).max_entries(2).build();

    cache.put("a", key("1"));
    cache.put("b", key("2"));
    cache.put("a", key("1"));
    cache.put("c", key("3"));

    assert!(cache.lookup("a").is_some());
    assert!(cache.lookup("b").is_none());
}

#[test]
fn invalidate_if_removes_matching_key() {
    let cache = PartitionKeyCache::new(Clock::new_frozen());
    cache.put("a", key("1"));

    assert!(cache.invalidate_if("a", &key("1")));
    assert!(cache.is_empty());
    assert!(!cache.invalidate_if("a", &key("1")));
}

#[test]
fn invalidate_if_keeps_replaced_key() {
    let cache = PartitionKeyCache::new(Clock::new_frozen());
    cache.put("a", key("stale"));
    cache.put("a", key("fresh"));

    assert!(!cache.invalidate_if("a", &key("stale")));
    assert_eq!(cache.lookup("a"), Some(key("fresh")));
}

#[test]
fn clear_removes_everything() {
    let cache = PartitionKeyCache::new(Clock::new_frozen());
    cache.put("a", key("1"));
    cache.put("b", key("2"));

    cache.clear();

    assert!(cache.is_empty());
    assert!(cache.lookup("a").is_none());
    assert!(cache.lookup("b").is_none());
}

#[test]
fn stats_reports_size_and_counters() {
    let cache = PartitionKeyCache::builder(Clock::new_frozen()).max_entries(1).build();

    cache.put("a", key("1"));
    let _ = cache.lookup("a");
    let _ = cache.lookup("b");
    cache.put("b", key("2"));

    assert_eq!(
        cache.stats(),
        CacheStats {
            size: 1,
            max_size: 1,
            hits: 1,
            misses: 1,
            expirations: 0,
            evictions: 1,
        }
    );
}

#[test]
fn stats_has_no_side_effects() {
    let control = ClockControl::new();
    let cache = PartitionKeyCache::builder(control.to_clock())
        .ttl(Duration::from_secs(1))
        .build();
    cache.put("a", key("1"));
    control.advance(Duration::from_secs(5));

    assert_eq!(cache.stats().size, 1);
    assert_eq!(cache.stats().size, 1);
}

#[test]
fn concurrent_puts_respect_capacity() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 500;
    const CAPACITY: usize = 100;

    let cache = PartitionKeyCache::builder(Clock::new_frozen()).max_entries(CAPACITY).build();

    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let cache = &cache;
            scope.spawn(move || {
                for i in 0..PER_THREAD {
                    let id = format!("doc-{t}-{i}");
                    cache.put(&id, key(&format!("pk-{t}")));
                    let _ = cache.lookup(&id);
                    assert!(cache.len() <= CAPACITY);
                }
            });
        }
    });

    let stats = cache.stats();
    assert_eq!(stats.size, CAPACITY);
    assert_eq!(stats.evictions, (THREADS * PER_THREAD - CAPACITY) as u64);
}

#[test]
fn concurrent_puts_of_same_id_leave_single_entry() {
    let cache = PartitionKeyCache::new(Clock::new_frozen());

    std::thread::scope(|scope| {
        for t in 0..8 {
            let cache = &cache;
            scope.spawn(move || {
                for _ in 0..200 {
                    cache.put("shared", key(&format!("pk-{t}")));
                }
            });
        }
    });

    assert_eq!(cache.len(), 1);
    let value = cache.lookup("shared").expect("entry should exist");
    assert!(value.to_string().starts_with("pk-"));
}
