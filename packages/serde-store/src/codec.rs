//! JSON row codec implementation.

use rowmap_core::{
    flatten, merge, unflatten_typed, Error, FlatRecord, RowCodec, TypeDescriptor, Value,
};

use crate::convert::{json_to_value, to_json_string};

/// The single column [`JsonCodec`] rows carry.
pub const DATA_COLUMN: &str = "data";

/// A codec that keeps the whole object as JSON text in one column.
///
/// Use this instead of [`PathCodec`](rowmap_core::PathCodec) when the host
/// wants opaque documents rather than one column per field. Rows have the
/// single column [`DATA_COLUMN`].
///
/// # Example
///
/// ```rust
/// use rowmap_serde::{JsonCodec, DATA_COLUMN};
/// use rowmap_core::{RowCodec, Value};
///
/// let codec = JsonCodec;
/// let value: Value = [("name", Value::from("Ada"))]
///     .into_iter()
///     .map(|(k, v)| (k.to_string(), v))
///     .collect::<std::collections::BTreeMap<_, _>>()
///     .into();
///
/// let row = codec.to_row(&value, None).unwrap();
/// assert_eq!(row.get(DATA_COLUMN), Some(r#"{"name":"Ada"}"#));
/// assert_eq!(codec.to_value(&row, None).unwrap(), value);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    fn decode(row: &FlatRecord) -> Result<Value, Error> {
        let text = row.get(DATA_COLUMN).ok_or_else(|| Error::FieldNotFound {
            path: DATA_COLUMN.to_string(),
        })?;

        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|e| Error::MalformedCell {
                column: DATA_COLUMN.to_string(),
                message: e.to_string(),
            })?;

        match json_to_value(json) {
            value @ Value::Map(_) => Ok(value),
            other => Err(Error::UnsupportedShape {
                path: DATA_COLUMN.to_string(),
                found: other.kind_name(),
            }),
        }
    }
}

impl RowCodec for JsonCodec {
    fn to_value(&self, row: &FlatRecord, descriptor: Option<&TypeDescriptor>) -> Result<Value, Error> {
        let value = Self::decode(row)?;
        match descriptor {
            // Re-derive through the typed path so declared kinds are enforced
            Some(descriptor) => unflatten_typed(&flatten(&value)?, descriptor),
            None => Ok(value),
        }
    }

    fn to_row(&self, value: &Value, _descriptor: Option<&TypeDescriptor>) -> Result<FlatRecord, Error> {
        let mut row = FlatRecord::new();
        row.insert(DATA_COLUMN, to_json_string(value)?);
        Ok(row)
    }

    fn merge(
        &self,
        target: &mut Value,
        patch: &FlatRecord,
        descriptor: Option<&TypeDescriptor>,
    ) -> Result<(), Error> {
        let patch = flatten(&Self::decode(patch)?)?;
        merge(target, &patch, descriptor)
    }
}
