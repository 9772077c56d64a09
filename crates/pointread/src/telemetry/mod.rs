// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured logs and optional OpenTelemetry metrics for store calls.
//!
//! Every store call a reader issues is described by an [`Event`]. When logging is enabled the
//! event becomes a `tracing` record named `pointread.event`; with the `metrics` feature it also
//! feeds a counter and histograms.

use std::time::Duration;

use keyhint::{PartitionKey, PartitionKeyCache};

pub(crate) mod attributes;
pub(crate) mod ext;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

#[cfg(any(feature = "metrics", test))]
use self::metrics::Metrics;

/// Reader operation a store call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Get,
    Create,
    Update,
    Delete,
    Query,
    Batch,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Query => "query",
            Self::Batch => "batch",
        }
    }
}

/// What happened during a store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Activity {
    /// Point read with a caller-supplied partition key found the document.
    PointRead,
    /// Point read with a cached partition key found the document.
    CachedHint,
    /// Point read found nothing.
    NotFound,
    /// Point read with a cached partition key found nothing; the key was dropped.
    StaleHint,
    /// No partition key was available; a cross-partition query is issued.
    QueryFallback,
    /// Cross-partition query found exactly one document and its partition key was learned.
    Resolved,
    /// Cross-partition query matched more than one document.
    Ambiguous,
    Ok,
    Error,
}

impl Activity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PointRead => "point_read",
            Self::CachedHint => "cached_hint",
            Self::NotFound => "not_found",
            Self::StaleHint => "stale_hint",
            Self::QueryFallback => "query_fallback",
            Self::Resolved => "resolved",
            Self::Ambiguous => "ambiguous",
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::NotFound => Severity::Debug,
            Self::PointRead | Self::CachedHint | Self::Resolved | Self::Ok => Severity::Info,
            Self::StaleHint | Self::QueryFallback => Severity::Warn,
            Self::Ambiguous | Self::Error => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// A single store call as seen by telemetry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Event<'a> {
    pub operation: Operation,
    pub activity: Activity,
    pub id: Option<&'a str>,
    pub partition_key: Option<&'a PartitionKey>,
    pub query: Option<&'a str>,
    pub result_count: Option<usize>,
    pub duration: Duration,
    pub request_charge: Option<f64>,
}

impl<'a> Event<'a> {
    pub fn new(operation: Operation, activity: Activity) -> Self {
        Self {
            operation,
            activity,
            id: None,
            partition_key: None,
            query: None,
            result_count: None,
            duration: Duration::ZERO,
            request_charge: None,
        }
    }

    #[must_use]
    pub fn id(mut self, id: &'a str) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn partition_key(mut self, partition_key: Option<&'a PartitionKey>) -> Self {
        self.partition_key = partition_key;
        self
    }

    #[must_use]
    pub fn query(mut self, query: &'a str) -> Self {
        self.query = Some(query);
        self
    }

    #[must_use]
    pub fn result_count(mut self, result_count: usize) -> Self {
        self.result_count = Some(result_count);
        self
    }

    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn request_charge(mut self, request_charge: Option<f64>) -> Self {
        self.request_charge = request_charge;
        self
    }
}

/// Telemetry sink shared by a reader and its batch views.
#[derive(Clone, Debug)]
pub(crate) struct Telemetry {
    name: &'static str,
    logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    metrics: Option<Metrics>,
}

impl Telemetry {
    pub fn new(name: &'static str, logging_enabled: bool) -> Self {
        Self {
            name,
            logging_enabled,
            #[cfg(any(feature = "metrics", test))]
            metrics: None,
        }
    }

    #[cfg(any(feature = "metrics", test))]
    #[must_use]
    pub fn with_metrics(mut self, metrics: Option<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Records one store call.
    pub fn record(&self, event: &Event<'_>) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(metrics) = &self.metrics {
            metrics.record(self.name, event);
        }

        if self.logging_enabled {
            Self::emit(self.name, event);
        }
    }

    /// Records the outcome of a batch read.
    pub fn record_batch(&self, requested: usize, found: usize, failed: bool, duration: Duration) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(metrics) = &self.metrics {
            let activity = if failed { Activity::Error } else { Activity::Ok };
            metrics.record(self.name, &Event::new(Operation::Batch, activity).duration(duration));
        }

        if self.logging_enabled {
            let duration_ms = duration.as_secs_f64() * 1000.0;
            if failed {
                tracing::error!(
                    pointread.name = self.name,
                    pointread.requested = requested,
                    pointread.found = found,
                    pointread.duration_ms = duration_ms,
                    "pointread.batch"
                );
            } else {
                tracing::info!(
                    pointread.name = self.name,
                    pointread.requested = requested,
                    pointread.found = found,
                    pointread.duration_ms = duration_ms,
                    "pointread.batch"
                );
            }
        }
    }

    /// Records the number of learned partition keys.
    #[cfg_attr(
        not(any(feature = "metrics", test)),
        expect(unused_variables, reason = "no-op without the metrics feature")
    )]
    pub fn record_cache_size(&self, cache: &PartitionKeyCache) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(metrics) = &self.metrics {
            metrics.record_cache_size(self.name, cache.len());
        }
    }

    fn emit(name: &'static str, event: &Event<'_>) {
        let operation = event.operation.as_str();
        let activity = event.activity.as_str();
        let partition_key = event.partition_key.map(ToString::to_string);
        let partition_key = partition_key.as_deref();
        let duration_ms = event.duration.as_secs_f64() * 1000.0;
        let id = event.id;
        let query = event.query;
        let result_count = event.result_count;
        let request_charge = event.request_charge;

        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    pointread.name = name,
                    pointread.operation = operation,
                    pointread.activity = activity,
                    pointread.id = id,
                    pointread.partition_key = partition_key,
                    pointread.query = query,
                    pointread.result_count = result_count,
                    pointread.duration_ms = duration_ms,
                    pointread.request_charge = request_charge,
                    "pointread.event"
                )
            };
        }

        match event.activity.severity() {
            Severity::Error => emit_event!(error),
            Severity::Warn => emit_event!(warn),
            Severity::Info => emit_event!(info),
            Severity::Debug => emit_event!(debug),
        }

        if event.activity == Activity::QueryFallback {
            tracing::warn!(
                pointread.name = name,
                pointread.id = id,
                "cross-partition query issued; provide a partition key for a cheaper point read"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::testing::{LogCapture, MetricTester};

    #[test]
    fn operation_as_str() {
        assert_eq!(Operation::Get.as_str(), "get");
        assert_eq!(Operation::Create.as_str(), "create");
        assert_eq!(Operation::Update.as_str(), "update");
        assert_eq!(Operation::Delete.as_str(), "delete");
        assert_eq!(Operation::Query.as_str(), "query");
        assert_eq!(Operation::Batch.as_str(), "batch");
    }

    #[test]
    fn activity_severity() {
        assert_eq!(Activity::NotFound.severity(), Severity::Debug);
        assert_eq!(Activity::PointRead.severity(), Severity::Info);
        assert_eq!(Activity::CachedHint.severity(), Severity::Info);
        assert_eq!(Activity::Resolved.severity(), Severity::Info);
        assert_eq!(Activity::Ok.severity(), Severity::Info);
        assert_eq!(Activity::StaleHint.severity(), Severity::Warn);
        assert_eq!(Activity::QueryFallback.severity(), Severity::Warn);
        assert_eq!(Activity::Ambiguous.severity(), Severity::Error);
        assert_eq!(Activity::Error.severity(), Severity::Error);
    }

    #[test]
    fn emit_contains_all_fields_and_values() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        let key = PartitionKey::from("tenant-a");

        Telemetry::emit(
            "users",
            &Event::new(Operation::Get, Activity::PointRead)
                .id("user-1")
                .partition_key(Some(&key))
                .query("SELECT * FROM c WHERE c.id = @id")
                .result_count(1)
                .duration(Duration::from_millis(12))
                .request_charge(Some(1.5)),
        );

        capture.assert_contains(attributes::NAME);
        capture.assert_contains(attributes::OPERATION);
        capture.assert_contains(attributes::ACTIVITY);
        capture.assert_contains(attributes::ID);
        capture.assert_contains(attributes::PARTITION_KEY);
        capture.assert_contains(attributes::QUERY);
        capture.assert_contains(attributes::RESULT_COUNT);
        capture.assert_contains(attributes::DURATION_MS);
        capture.assert_contains(attributes::REQUEST_CHARGE);
        capture.assert_contains(attributes::EVENT_NAME);

        capture.assert_contains("users");
        capture.assert_contains("user-1");
        capture.assert_contains("tenant-a");
        capture.assert_contains("point_read");
        capture.assert_contains("1.5");
        capture.assert_contains("c.id = @id");
        capture.assert_contains("pointread.result_count=1");
    }

    #[test]
    fn emit_at_correct_levels() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        Telemetry::emit("users", &Event::new(Operation::Get, Activity::Error).id("a"));
        capture.assert_contains("ERROR");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        Telemetry::emit("users", &Event::new(Operation::Get, Activity::StaleHint).id("a"));
        capture.assert_contains("WARN");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        Telemetry::emit("users", &Event::new(Operation::Create, Activity::Ok).id("a"));
        capture.assert_contains("INFO");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        Telemetry::emit("users", &Event::new(Operation::Get, Activity::NotFound).id("a"));
        capture.assert_contains("DEBUG");
    }

    #[test]
    fn query_fallback_suggests_partition_key() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        Telemetry::emit("users", &Event::new(Operation::Get, Activity::QueryFallback).id("a"));

        capture.assert_contains("provide a partition key");
    }

    #[test]
    fn logging_disabled_emits_nothing() {
        let telemetry = Telemetry::new("users", false);
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        telemetry.record(&Event::new(Operation::Get, Activity::Error).id("a"));
        telemetry.record_batch(3, 1, false, Duration::from_millis(5));

        assert!(capture.output().is_empty());
    }

    #[test]
    fn batch_summary_contains_counts() {
        let telemetry = Telemetry::new("users", true);
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        telemetry.record_batch(3, 2, false, Duration::from_millis(5));

        capture.assert_contains("pointread.batch");
        capture.assert_contains("pointread.requested=3");
        capture.assert_contains("pointread.found=2");
    }

    #[test]
    fn record_feeds_metrics() {
        let tester = MetricTester::new();
        let telemetry = Telemetry::new("users", false).with_metrics(Some(Metrics::new(tester.meter_provider())));

        telemetry.record(
            &Event::new(Operation::Get, Activity::Resolved).id("a")
                .duration(Duration::from_millis(3))
                .request_charge(Some(2.0)),
        );
        let cache = PartitionKeyCache::new(tick::Clock::new_frozen());
        cache.put("a", PartitionKey::from("tenant-a"));
        telemetry.record_cache_size(&cache);

        tester.assert_attributes_contain(&[
            opentelemetry::KeyValue::new(attributes::NAME, "users"),
            opentelemetry::KeyValue::new(attributes::OPERATION, Operation::Get.as_str()),
            opentelemetry::KeyValue::new(attributes::ACTIVITY, Activity::Resolved.as_str()),
        ]);

        let names = tester.metric_names();
        for expected in [
            "pointread.event.count",
            "pointread.operation.duration",
            "pointread.request_charge",
            "pointread.cache.size",
        ] {
            assert!(names.iter().any(|name| name == expected), "{expected} missing from {names:?}");
        }
    }
}
