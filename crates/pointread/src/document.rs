// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// A document held by a [`DocumentStore`](crate::DocumentStore).
///
/// The only thing the reader needs to know about a document is its id, which must be unique
/// across all partitions of a store.
pub trait Document: Clone + Send + Sync + 'static {
    /// Returns the document id.
    fn id(&self) -> &str;
}

/// A store result together with the cost the store reported for producing it.
///
/// The request charge is observability data only: it is logged and recorded as a metric but
/// never influences control flow.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreResponse<T> {
    /// The value returned by the store.
    pub resource: T,
    /// Store-reported cost of the operation, if the store reports one.
    pub request_charge: Option<f64>,
}

impl<T> StoreResponse<T> {
    /// Creates a response without a request charge.
    pub fn new(resource: T) -> Self {
        Self {
            resource,
            request_charge: None,
        }
    }

    /// Creates a response with a request charge.
    pub fn charged(resource: T, request_charge: f64) -> Self {
        Self {
            resource,
            request_charge: Some(request_charge),
        }
    }

    /// Consumes the response and returns the value.
    pub fn into_resource(self) -> T {
        self.resource
    }
}

/// A named query parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryParameter {
    /// Parameter name as referenced by the query text, including the `@` prefix.
    pub name: String,
    /// Parameter value.
    pub value: String,
}

/// A parameterized predicate query.
///
/// # Examples
///
/// ```
/// use pointread::QuerySpec;
///
/// let spec = QuerySpec::by_id("user-1");
/// assert_eq!(spec.query, "SELECT * FROM c WHERE c.id = @id");
/// assert_eq!(spec.parameter("@id"), Some("user-1"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QuerySpec {
    /// Query text.
    pub query: String,
    /// Values bound to the parameters referenced by the query text.
    pub parameters: Vec<QueryParameter>,
}

impl QuerySpec {
    /// Creates a query without parameters.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates the query that finds a document by id in every partition.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new("SELECT * FROM c WHERE c.id = @id").with_parameter("@id", id)
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(QueryParameter {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Returns the value bound to `name`, if any.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == name)
            .map(|parameter| parameter.value.as_str())
    }
}
