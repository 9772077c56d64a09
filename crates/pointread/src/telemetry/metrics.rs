// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use opentelemetry::{
    InstrumentationScope, KeyValue,
    metrics::{Counter, Gauge, Histogram, Meter, MeterProvider},
};

use super::{Event, attributes};

const METER_NAME: &str = "pointread";
const VERSION: &str = "v0.1.0";
const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.47.0";
const EVENT_COUNT_NAME: &str = "pointread.event.count";
const OPERATION_DURATION_NAME: &str = "pointread.operation.duration";
const REQUEST_CHARGE_NAME: &str = "pointread.request_charge";
const CACHE_SIZE_NAME: &str = "pointread.cache.size";

#[derive(Clone, Debug)]
pub(crate) struct Metrics {
    event_counter: Counter<u64>,
    operation_duration: Histogram<f64>,
    request_charge: Histogram<f64>,
    cache_size: Gauge<u64>,
}

impl Metrics {
    pub fn new(meter_provider: &dyn MeterProvider) -> Self {
        let meter = create_meter(meter_provider);
        Self {
            event_counter: meter
                .u64_counter(EVENT_COUNT_NAME)
                .with_description("Store calls issued by the reader")
                .with_unit("{event}")
                .build(),
            operation_duration: meter
                .f64_histogram(OPERATION_DURATION_NAME)
                .with_description("Store call duration")
                .with_unit("s")
                .build(),
            request_charge: meter
                .f64_histogram(REQUEST_CHARGE_NAME)
                .with_description("Store-reported request charge")
                .with_unit("{charge}")
                .build(),
            cache_size: meter
                .u64_gauge(CACHE_SIZE_NAME)
                .with_description("Number of learned partition keys")
                .with_unit("{entry}")
                .build(),
        }
    }

    pub fn record(&self, name: &'static str, event: &Event<'_>) {
        let attrs = [
            KeyValue::new(attributes::NAME, name),
            KeyValue::new(attributes::OPERATION, event.operation.as_str()),
            KeyValue::new(attributes::ACTIVITY, event.activity.as_str()),
        ];

        self.event_counter.add(1, &attrs);
        self.operation_duration.record(event.duration.as_secs_f64(), &attrs);

        if let Some(charge) = event.request_charge {
            self.request_charge.record(charge, &attrs);
        }
    }

    pub fn record_cache_size(&self, name: &'static str, size: usize) {
        let attrs = [KeyValue::new(attributes::NAME, name)];
        self.cache_size.record(u64::try_from(size).unwrap_or(u64::MAX), &attrs);
    }
}

fn create_meter(meter_provider: &dyn MeterProvider) -> Meter {
    meter_provider.meter_with_scope(
        InstrumentationScope::builder(METER_NAME)
            .with_version(VERSION)
            .with_schema_url(SCHEMA_URL)
            .build(),
    )
}
