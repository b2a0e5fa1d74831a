//! Ordered sets of column names
//!
//! `ColumnList` is immutable; lists are assembled with a `ColumnListBuilder`
//! (which silently drops repeated names) or parsed from comma-joined text.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Ordered collection of unique, case-sensitive column names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "ColumnParts")]
pub struct ColumnList {
    names: Vec<String>,
}

/// Decoded form; names are checked for emptiness and repeats
#[derive(Deserialize)]
struct ColumnParts {
    names: Vec<String>,
}

impl TryFrom<ColumnParts> for ColumnList {
    type Error = Error;

    fn try_from(parts: ColumnParts) -> Result<Self> {
        ColumnList::new(parts.names)
    }
}

impl ColumnList {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from names, rejecting empty and repeated names
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Vec::new();
        for name in names {
            let name = name.into();
            if name.is_empty() {
                return Err(Error::EmptyColumnName);
            }
            if list.contains(&name) {
                return Err(Error::DuplicateColumn(name));
            }
            list.push(name);
        }
        Ok(Self { names: list })
    }

    /// Parse comma-joined text such as `"Id, Name,Date"`; blank text is an
    /// empty list
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        Self::new(text.split(',').map(str::trim))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.names.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn contains_any(&self, other: &ColumnList) -> bool {
        other.iter().any(|n| self.contains(n))
    }

    pub fn contains_all(&self, other: &ColumnList) -> bool {
        other.iter().all(|n| self.contains(n))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Names of `self` followed by the names of `other` not already present
    pub fn union(&self, other: &ColumnList) -> ColumnList {
        let mut builder = self.to_builder();
        builder.extend_from(other);
        builder.build()
    }

    /// Names of `self` not present in `other`
    pub fn difference(&self, other: &ColumnList) -> ColumnList {
        Self {
            names: self
                .names
                .iter()
                .filter(|n| !other.contains(n))
                .cloned()
                .collect(),
        }
    }

    /// Names of `self` also present in `other`, in `self`'s order
    pub fn intersection(&self, other: &ColumnList) -> ColumnList {
        Self {
            names: self
                .names
                .iter()
                .filter(|n| other.contains(n))
                .cloned()
                .collect(),
        }
    }

    pub fn with_prefix(&self, prefix: &str) -> ColumnList {
        Self {
            names: self.names.iter().map(|n| format!("{prefix}{n}")).collect(),
        }
    }

    pub fn with_suffix(&self, suffix: &str) -> ColumnList {
        Self {
            names: self.names.iter().map(|n| format!("{n}{suffix}")).collect(),
        }
    }

    pub fn to_builder(&self) -> ColumnListBuilder {
        ColumnListBuilder {
            seen: self.names.iter().cloned().collect(),
            names: self.names.clone(),
        }
    }
}

impl fmt::Display for ColumnList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join(","))
    }
}

impl FromStr for ColumnList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<'a> IntoIterator for &'a ColumnList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

impl IntoIterator for ColumnList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

/// Mutable accumulator for a [`ColumnList`]. Adding a name that is already
/// present is a no-op, so traversals can append every occurrence they see.
#[derive(Debug, Clone, Default)]
pub struct ColumnListBuilder {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl ColumnListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name; returns whether it was new
    pub fn add(&mut self, name: impl Into<String>) -> Result<bool> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyColumnName);
        }
        Ok(self.insert(name))
    }

    /// Add every name of a comma-joined text
    pub fn add_text(&mut self, text: &str) {
        for name in text.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            self.insert(name.to_string());
        }
    }

    pub fn extend_from(&mut self, list: &ColumnList) {
        for name in list {
            self.insert(name.clone());
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        if self.seen.remove(name) {
            self.names.retain(|n| n != name);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn build(self) -> ColumnList {
        ColumnList { names: self.names }
    }

    /// Names referenced by expressions are validated at construction, so
    /// traversals go through this unchecked path.
    pub(crate) fn insert(&mut self, name: String) -> bool {
        if self.seen.contains(&name) {
            return false;
        }
        self.seen.insert(name.clone());
        self.names.push(name);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(text: &str) -> ColumnList {
        ColumnList::parse(text).unwrap()
    }

    #[test]
    fn test_decoding_rejects_repeats() {
        let repeated = ColumnList {
            names: vec!["A".into(), "A".into()],
        };
        let bytes = crate::codec::encode(&repeated).unwrap();
        assert!(crate::codec::decode::<ColumnList>(&bytes).is_err());
        let bytes = crate::codec::encode(&list("A,B")).unwrap();
        assert_eq!(crate::codec::decode::<ColumnList>(&bytes).unwrap(), list("A,B"));
    }

    #[test]
    fn test_parse_trims_and_keeps_order() {
        let columns = list(" Id, Name ,Date");
        assert_eq!(columns.as_slice(), &["Id", "Name", "Date"]);
        assert_eq!(columns.to_string(), "Id,Name,Date");
        assert!(list("").is_empty());
    }

    #[test]
    fn test_duplicates_and_empty_names_rejected() {
        assert_eq!(
            ColumnList::parse("A,B,A"),
            Err(Error::DuplicateColumn("A".into()))
        );
        assert_eq!(ColumnList::parse("A,,B"), Err(Error::EmptyColumnName));
        // Identity is case-sensitive
        assert_eq!(list("a,A").len(), 2);
    }

    #[test]
    fn test_set_algebra() {
        let a = list("A,B,C");
        let b = list("C,D,A");
        assert_eq!(a.union(&b), list("A,B,C,D"));
        assert_eq!(a.difference(&b), list("B"));
        assert_eq!(a.intersection(&b), list("A,C"));
        assert!(a.contains_any(&b));
        assert!(!a.contains_all(&b));
        assert!(a.contains_all(&list("C,A")));
    }

    #[test]
    fn test_prefix_and_suffix() {
        let a = list("A,B");
        assert_eq!(a.with_prefix("T."), list("T.A,T.B"));
        assert_eq!(a.with_suffix("_old"), list("A_old,B_old"));
    }

    #[test]
    fn test_builder_deduplicates() {
        let mut builder = ColumnListBuilder::new();
        assert!(builder.add("A").unwrap());
        assert!(!builder.add("A").unwrap());
        builder.add_text("B, A, C");
        assert!(builder.add("").is_err());
        assert!(builder.remove("B"));
        assert!(!builder.remove("B"));
        assert_eq!(builder.build(), list("A,C"));
    }
}
