//! Named-value sources
//!
//! Anything that can answer "what is the value of column X" can be used to
//! evaluate expressions and test filters without going through SQL.

use crate::types::Value;
use std::collections::{BTreeMap, HashMap};

/// A source of values looked up by column name
pub trait NamedValues {
    /// The value of `name`, or `None` when the source has no such column.
    /// A present column holding NULL returns `Some(Value::Null)`.
    fn get_value(&self, name: &str) -> Option<Value>;

    /// Whether the source has a column called `name`
    fn contains(&self, name: &str) -> bool {
        self.get_value(name).is_some()
    }
}

impl NamedValues for HashMap<String, Value> {
    fn get_value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl NamedValues for BTreeMap<String, Value> {
    fn get_value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl<T: NamedValues + ?Sized> NamedValues for &T {
    fn get_value(&self, name: &str) -> Option<Value> {
        (**self).get_value(name)
    }

    fn contains(&self, name: &str) -> bool {
        (**self).contains(name)
    }
}

/// Build a `HashMap` source from `(name, value)` pairs
pub fn named_values<I, K, V>(pairs: I) -> HashMap<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_source() {
        let source = named_values([("A", Value::I32(1)), ("B", Value::Null)]);
        assert_eq!(source.get_value("A"), Some(Value::I32(1)));
        assert_eq!(source.get_value("B"), Some(Value::Null));
        assert!(source.contains("B"));
        assert!(!source.contains("C"));
        assert_eq!(source.get_value("C"), None);
    }
}
