//! SelectionFilter - a structured equality predicate over field paths.

use std::collections::BTreeMap;

use crate::Value;

/// A where-clause handed to [`BackingStore::read_with_filter`].
///
/// The clause mirrors the shape of the values it selects: `{"address":
/// {"city": "NY"}}` selects values whose `address.city` is `NY`. Every leaf
/// of the clause must hold for a value to match.
///
/// [`BackingStore::read_with_filter`]: crate::BackingStore::read_with_filter
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionFilter {
    where_clause: BTreeMap<String, Value>,
}

impl SelectionFilter {
    pub fn new(where_clause: BTreeMap<String, Value>) -> Self {
        Self { where_clause }
    }

    pub fn where_clause(&self) -> &BTreeMap<String, Value> {
        &self.where_clause
    }

    /// Whether the clause places no constraint at all.
    pub fn is_empty(&self) -> bool {
        self.where_clause.is_empty()
    }

    /// Evaluate the clause against a stored value.
    ///
    /// Scalars compare by their canonical string encoding, so a clause built
    /// from string arguments (`{"id": "1"}`) matches an integer field `1`.
    /// A `null` in the clause matches an absent or null field.
    pub fn matches(&self, value: &Value) -> bool {
        match value {
            Value::Map(fields) => clause_matches(&self.where_clause, fields),
            _ => self.where_clause.is_empty(),
        }
    }
}

fn clause_matches(clause: &BTreeMap<String, Value>, fields: &BTreeMap<String, Value>) -> bool {
    clause
        .iter()
        .all(|(name, expected)| leaf_matches(expected, fields.get(name)))
}

fn leaf_matches(expected: &Value, actual: Option<&Value>) -> bool {
    match (expected, actual) {
        (Value::Null, None) | (Value::Null, Some(Value::Null)) => true,
        (Value::Map(clause), Some(Value::Map(fields))) => clause_matches(clause, fields),
        (Value::Array(_), Some(actual)) => expected == actual,
        (expected, Some(actual)) if expected.is_scalar() && actual.is_scalar() => {
            expected.scalar_string() == actual.scalar_string()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;

    fn contact() -> Value {
        Value::Map(btree! {
            "id".into() => Value::Integer(1),
            "name".into() => Value::from("Ada"),
            "address".into() => Value::Map(btree! {
                "city".into() => Value::from("NY"),
            }),
        })
    }

    #[test]
    fn string_argument_matches_integer_field() {
        let filter = SelectionFilter::new(btree! { "id".into() => Value::from("1") });
        assert!(filter.matches(&contact()));

        let filter = SelectionFilter::new(btree! { "id".into() => Value::from("2") });
        assert!(!filter.matches(&contact()));
    }

    #[test]
    fn nested_clause() {
        let filter = SelectionFilter::new(btree! {
            "address".into() => Value::Map(btree! { "city".into() => Value::from("NY") }),
        });
        assert!(filter.matches(&contact()));

        let filter = SelectionFilter::new(btree! {
            "address".into() => Value::Map(btree! { "city".into() => Value::from("LA") }),
        });
        assert!(!filter.matches(&contact()));
    }

    #[test]
    fn all_leaves_must_hold() {
        let filter = SelectionFilter::new(btree! {
            "id".into() => Value::from("1"),
            "name".into() => Value::from("Grace"),
        });
        assert!(!filter.matches(&contact()));
    }

    #[test]
    fn null_matches_absent() {
        let filter = SelectionFilter::new(btree! { "nickname".into() => Value::Null });
        assert!(filter.matches(&contact()));

        let filter = SelectionFilter::new(btree! { "name".into() => Value::Null });
        assert!(!filter.matches(&contact()));
    }

    #[test]
    fn empty_clause_matches_everything() {
        assert!(SelectionFilter::default().matches(&contact()));
        assert!(SelectionFilter::default().matches(&Value::from("x")));
    }

    #[test]
    fn scalar_clause_never_matches_map() {
        let filter = SelectionFilter::new(btree! { "address".into() => Value::from("NY") });
        assert!(!filter.matches(&contact()));
    }
}
