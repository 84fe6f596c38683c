//! Conversions between [`Value`] and JSON or serde types.
//!
//! JSON numbers become `Integer` when they fit an `i64` and `Float`
//! otherwise, except unsigned integers past `i64::MAX`, which keep their
//! exact digits as a `String`. Non-finite floats have no JSON form and
//! encode as `null`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Number, Value as Json};

use rowmap_core::{Error, StoreError, Value};

/// Deserialize a Rust type from a structured value.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, Error> {
    serde_json::from_value(value_to_json(value)).map_err(serialization)
}

/// Serialize a Rust type into a structured value.
pub fn to_value<T: Serialize>(data: &T) -> Result<Value, Error> {
    serde_json::to_value(data)
        .map(json_to_value)
        .map_err(serialization)
}

/// Encode a structured value as compact JSON text.
pub fn to_json_string(value: &Value) -> Result<String, Error> {
    serde_json::to_string(&value_to_json(value)).map_err(serialization)
}

fn serialization(e: serde_json::Error) -> Error {
    Error::Store(StoreError::Serialization {
        message: e.to_string(),
    })
}

pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(i) => Json::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Map(fields) => Json::Object(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), value_to_json(field)))
                .collect(),
        ),
    }
}

pub fn json_to_value(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match (n.as_i64(), n.is_u64()) {
            (Some(i), _) => Value::Integer(i),
            (None, true) => Value::String(n.to_string()),
            (None, false) => n.as_f64().map_or(Value::Null, Value::Float),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::Array(items.into_iter().map(json_to_value).collect()),
        Json::Object(fields) => Value::Map(
            fields
                .into_iter()
                .map(|(name, field)| (name, json_to_value(field)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Address {
        city: String,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Contact {
        id: u32,
        name: String,
        active: bool,
        address: Address,
    }

    #[test]
    fn struct_through_value() {
        let contact = Contact {
            id: 7,
            name: "Alice".to_string(),
            active: true,
            address: Address {
                city: "NY".to_string(),
            },
        };

        let value = to_value(&contact).unwrap();
        let city = rowmap_core::FieldPath::parse("address.city").unwrap();
        assert_eq!(value.get(&city), Some(&Value::from("NY")));
        assert_eq!(from_value::<Contact>(&value).unwrap(), contact);
    }

    #[test]
    fn mismatched_shape_is_a_serialization_error() {
        let result: Result<Contact, Error> = from_value(&Value::from("not a contact"));
        assert!(matches!(
            result,
            Err(Error::Store(StoreError::Serialization { .. }))
        ));
    }

    #[test]
    fn number_mapping() {
        assert_eq!(json_to_value(json!(-100)), Value::Integer(-100));
        assert_eq!(json_to_value(json!(2.75)), Value::Float(2.75));
        assert_eq!(
            json_to_value(json!(u64::MAX)),
            Value::String(u64::MAX.to_string())
        );
        assert_eq!(value_to_json(&Value::Float(f64::NAN)), Json::Null);
    }

    #[test]
    fn json_string_is_compact_and_sorted() {
        let value = json_to_value(json!({"id": 1, "tags": ["a"], "address": {"city": "NY"}}));
        assert_eq!(
            to_json_string(&value).unwrap(),
            r#"{"address":{"city":"NY"},"id":1,"tags":["a"]}"#
        );
    }
}
