// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// The value that selects the physical partition holding a document.
///
/// Stores partition either by a single value or by a hierarchy of values. Both shapes are
/// opaque to this crate: keys are only compared, hashed, cloned and displayed.
///
/// # Examples
///
/// ```
/// use keyhint::PartitionKey;
///
/// let single = PartitionKey::from("tenant-a");
/// assert_eq!(single.to_string(), "tenant-a");
///
/// let composite = PartitionKey::from(vec!["tenant-a".to_string(), "region-1".to_string()]);
/// assert_eq!(composite.to_string(), "tenant-a/region-1");
/// assert_eq!(composite.components().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum PartitionKey {
    /// A key made of one value.
    Single(String),
    /// A hierarchical key made of several values, outermost first.
    Composite(Vec<String>),
}

impl PartitionKey {
    /// Returns the key components, outermost first.
    ///
    /// A single key has exactly one component.
    #[must_use]
    pub fn components(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Composite(values) => values,
        }
    }

    /// Returns `true` if this is a hierarchical key.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => f.write_str(value),
            Self::Composite(values) => f.write_str(&values.join("/")),
        }
    }
}

impl From<&str> for PartitionKey {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<String> for PartitionKey {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&String> for PartitionKey {
    fn from(value: &String) -> Self {
        Self::Single(value.clone())
    }
}

impl From<Vec<String>> for PartitionKey {
    fn from(values: Vec<String>) -> Self {
        Self::Composite(values)
    }
}

impl<const N: usize> From<[&str; N]> for PartitionKey {
    fn from(values: [&str; N]) -> Self {
        Self::Composite(values.iter().map(|v| (*v).to_owned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_key_has_one_component() {
        let key = PartitionKey::from("a");
        assert_eq!(key.components(), ["a".to_string()]);
        assert!(!key.is_composite());
    }

    #[test]
    fn composite_display_joins_components() {
        let key = PartitionKey::from(["a", "b", "c"]);
        assert!(key.is_composite());
        assert_eq!(key.to_string(), "a/b/c");
    }

    #[test]
    fn single_and_composite_with_same_text_differ() {
        assert_ne!(PartitionKey::from("a"), PartitionKey::from(["a"]));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_plain_json_shapes() {
        let single: PartitionKey = serde_json::from_str("\"tenant\"").unwrap();
        assert_eq!(single, PartitionKey::from("tenant"));

        let composite: PartitionKey = serde_json::from_str("[\"tenant\",\"region\"]").unwrap();
        assert_eq!(composite, PartitionKey::from(["tenant", "region"]));

        assert_eq!(serde_json::to_string(&composite).unwrap(), "[\"tenant\",\"region\"]");
    }
}
