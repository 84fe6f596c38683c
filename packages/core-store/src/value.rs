//! The Value type - a structured object as the backing store sees it.
//!
//! Interior nodes are string-keyed maps, leaves are scalars. `Array` exists
//! only so that values decoded from a store can be represented faithfully
//! and rejected by the codec; no column can address an element.

use std::collections::BTreeMap;

use crate::{Error, FieldPath};

/// A tree-shaped structured value.
///
/// # Design Notes
///
/// - Uses `BTreeMap` so that visiting fields is lexicographic, which makes
///   flattened column order deterministic
/// - Uses `i64` for all integral kinds and `f64` for both float kinds; the
///   declared width lives in the type descriptor, not in the value
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absent field value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered sequence of values. Never representable as columns.
    Array(Vec<Value>),
    /// Field name to value.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Whether this is a boolean, number or string leaf.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Integer(_) | Value::Float(_) | Value::String(_)
        )
    }

    /// A short name for the value's shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// The canonical string encoding of a scalar leaf.
    ///
    /// Booleans encode as `"true"`/`"false"`, numbers in their shortest
    /// round-tripping decimal form, strings as themselves. Returns `None`
    /// for anything that is not a scalar.
    pub fn scalar_string(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Get a reference to a nested field.
    ///
    /// Returns `None` if the path does not exist or passes through a leaf.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let mut current = self;
        for component in path.iter() {
            current = match current {
                Value::Map(map) => map.get(component)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Get a mutable reference to a nested field.
    pub fn get_mut(&mut self, path: &FieldPath) -> Option<&mut Value> {
        let mut current = self;
        for component in path.iter() {
            current = match current {
                Value::Map(map) => map.get_mut(component)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Set a field, creating intermediate maps as needed.
    ///
    /// # Errors
    ///
    /// `DataConflict` if the path passes through a non-map value (e.g.,
    /// setting `address.city` when `address` is a string).
    pub fn set(&mut self, path: &FieldPath, value: Value) -> Result<(), Error> {
        let Some((parent, last)) = path.split_last() else {
            *self = value;
            return Ok(());
        };

        // `walked` is always the path of `current`
        let mut current = self;
        let mut walked = FieldPath::root();
        for component in parent.iter() {
            if current.is_null() {
                *current = Value::map();
            }
            current = match current {
                Value::Map(map) => map.entry(component.clone()).or_insert_with(Value::map),
                _ => {
                    return Err(Error::DataConflict {
                        path: walked.to_key(),
                    })
                }
            };
            walked = walked.child(component);
        }

        if current.is_null() {
            *current = Value::map();
        }
        match current {
            Value::Map(map) => {
                map.insert(last.to_string(), value);
                Ok(())
            }
            _ => Err(Error::DataConflict {
                path: walked.to_key(),
            }),
        }
    }

    /// Remove a field, returning it if it existed.
    pub fn remove(&mut self, path: &FieldPath) -> Option<Value> {
        let Some((parent, last)) = path.split_last() else {
            return Some(std::mem::take(self));
        };

        match self.get_mut(&parent)? {
            Value::Map(map) => map.remove(last),
            _ => None,
        }
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}
