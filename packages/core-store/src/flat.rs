//! The FlatRecord type - one structured object as a table row.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A mapping from dotted column key (`address.city`) to a string-encoded
/// scalar.
///
/// Keys are unique and iterate in lexicographic order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord {
    columns: BTreeMap<String, String>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, returning the previous value if there was one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.columns.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.columns.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.columns.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.columns
    }
}

impl From<BTreeMap<String, String>> for FlatRecord {
    fn from(columns: BTreeMap<String, String>) -> Self {
        Self { columns }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for FlatRecord {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl<'a> IntoIterator for &'a FlatRecord {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_sorted() {
        let record: FlatRecord = [("name", "a"), ("address.city", "NY"), ("id", "1")]
            .into_iter()
            .collect();
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["address.city", "id", "name"]);
    }

    #[test]
    fn insert_replaces() {
        let mut record = FlatRecord::new();
        assert_eq!(record.insert("id", "1"), None);
        assert_eq!(record.insert("id", "2"), Some("1".to_string()));
        assert_eq!(record.get("id"), Some("2"));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn serializes_as_plain_object() {
        let record: FlatRecord = [("address.city", "NY")].into_iter().collect();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"address.city":"NY"}"#);
    }
}
