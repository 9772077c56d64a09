// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Attribute and field names shared by logs and metrics.

pub(crate) const NAME: &str = "pointread.name";

pub(crate) const OPERATION: &str = "pointread.operation";

pub(crate) const ACTIVITY: &str = "pointread.activity";

#[cfg(test)]
pub(crate) const EVENT_NAME: &str = "pointread.event";

#[cfg(test)]
pub(crate) const ID: &str = "pointread.id";

#[cfg(test)]
pub(crate) const PARTITION_KEY: &str = "pointread.partition_key";

#[cfg(test)]
pub(crate) const QUERY: &str = "pointread.query";

#[cfg(test)]
pub(crate) const RESULT_COUNT: &str = "pointread.result_count";

#[cfg(test)]
pub(crate) const DURATION_MS: &str = "pointread.duration_ms";

#[cfg(test)]
pub(crate) const REQUEST_CHARGE: &str = "pointread.request_charge";
