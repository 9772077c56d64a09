// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for store calls and reader operations.

use std::fmt;
use std::time::Duration;

use ohno::ErrorExt;
use recoverable::{Recovery, RecoveryInfo};

/// Classifies a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StoreErrorKind {
    /// The store did not answer in time.
    Timeout,
    /// The call was cancelled before the store answered.
    Cancelled,
    /// The store rejected the call because the caller exceeded its allowance.
    Throttled,
    /// The store is down or unreachable.
    Unavailable,
    /// The store rejected the call as malformed.
    BadRequest,
    /// The call conflicts with the current state of the document.
    Conflict,
    /// Anything else.
    Other,
}

impl StoreErrorKind {
    /// Returns the kind as a static string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Throttled => "throttled",
            Self::Unavailable => "unavailable",
            Self::BadRequest => "bad_request",
            Self::Conflict => "conflict",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported by a [`DocumentStore`](crate::DocumentStore) implementation.
///
/// Not-found is not a failure: stores report it as `None` or `false`.
///
/// # Examples
///
/// ```
/// use pointread::{StoreError, StoreErrorKind};
/// use recoverable::{Recovery, RecoveryKind};
///
/// let error = StoreError::from_kind(StoreErrorKind::Throttled, "request rate too large");
/// assert_eq!(error.kind(), StoreErrorKind::Throttled);
/// assert_eq!(error.recovery().kind(), RecoveryKind::Retry);
/// ```
#[ohno::error]
#[derive(Clone)]
#[display("store call failed: {kind}")]
pub struct StoreError {
    kind: StoreErrorKind,
    retry_after: Option<Duration>,
}

impl StoreError {
    /// Creates a store error of the given kind from any cause.
    pub fn from_kind(kind: StoreErrorKind, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(kind, None::<Duration>, cause)
    }

    /// Creates a [`StoreErrorKind::Timeout`] error.
    pub fn timeout(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::from_kind(StoreErrorKind::Timeout, cause)
    }

    /// Creates a [`StoreErrorKind::Unavailable`] error.
    pub fn unavailable(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::from_kind(StoreErrorKind::Unavailable, cause)
    }

    /// Creates a [`StoreErrorKind::Throttled`] error carrying the delay the store asked for.
    pub fn throttled(retry_after: Duration, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(StoreErrorKind::Throttled, Some(retry_after), cause)
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    /// Returns the delay the store asked the caller to wait before retrying, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }
}

impl Recovery for StoreError {
    fn recovery(&self) -> RecoveryInfo {
        match self.kind {
            StoreErrorKind::Timeout => RecoveryInfo::retry(),
            StoreErrorKind::Throttled => match self.retry_after {
                Some(delay) => RecoveryInfo::retry().delay(delay),
                None => RecoveryInfo::retry(),
            },
            StoreErrorKind::Unavailable => RecoveryInfo::unavailable(),
            StoreErrorKind::BadRequest | StoreErrorKind::Conflict => RecoveryInfo::never(),
            StoreErrorKind::Cancelled | StoreErrorKind::Other => RecoveryInfo::unknown(),
        }
    }
}

/// Classifies an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The store call failed; the [`StoreError`] is the cause.
    Store,
    /// A query by id matched more than one document, so no single document could be chosen.
    AmbiguousResolution,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => f.write_str("store"),
            Self::AmbiguousResolution => f.write_str("ambiguous_resolution"),
        }
    }
}

/// An error from a [`HybridReader`](crate::HybridReader) operation.
///
/// The display output names the failed operation followed by the cause chain, for example
/// `get failed` then `caused by: store call failed: timeout`.
#[ohno::error]
#[derive(Clone)]
#[display("{operation} failed")]
pub struct Error {
    operation: &'static str,
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn store(operation: &'static str, cause: StoreError) -> Self {
        Self::caused_by(operation, ErrorKind::Store, cause)
    }

    pub(crate) fn ambiguous(operation: &'static str, id: &str, matches: usize) -> Self {
        Self::caused_by(
            operation,
            ErrorKind::AmbiguousResolution,
            format!("{matches} documents share the id '{id}'"),
        )
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the name of the failed operation, such as `get` or `delete`.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Returns `true` if a lookup by id matched more than one document.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.kind == ErrorKind::AmbiguousResolution
    }

    /// Returns the store failure that caused this error, if any.
    #[must_use]
    pub fn store_error(&self) -> Option<&StoreError> {
        self.find_source::<StoreError>()
    }
}

impl Recovery for Error {
    fn recovery(&self) -> RecoveryInfo {
        match self.kind {
            ErrorKind::Store => self.store_error().map_or_else(RecoveryInfo::unknown, Recovery::recovery),
            ErrorKind::AmbiguousResolution => RecoveryInfo::never(),
        }
    }
}

/// A specialized [`Result`] type for reader operations.
pub type Result<T> = std::result::Result<T, Error>;
