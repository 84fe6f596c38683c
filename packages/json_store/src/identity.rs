//! Identity handling shared by the reference stores.

use rowmap_core::{FieldPath, StoreError, Value};
use uuid::Uuid;

/// The identity field a store uses when none is configured.
pub const DEFAULT_IDENTITY: &str = "id";

pub(crate) fn default_identity() -> FieldPath {
    FieldPath {
        components: vec![DEFAULT_IDENTITY.to_string()],
    }
}

/// Read the identity of `value`, assigning a fresh v4 UUID when it has none.
pub(crate) fn ensure_identity(identity: &FieldPath, value: &mut Value) -> Result<String, StoreError> {
    if let Some(id) = value.get(identity).and_then(Value::scalar_string) {
        return Ok(id);
    }

    if !value.is_map() {
        return Err(StoreError::Other {
            message: format!("cannot store a {} without an identity", value.kind_name()),
        });
    }

    let id = Uuid::new_v4().to_string();
    value
        .set(identity, Value::String(id.clone()))
        .map_err(|e| StoreError::Other {
            message: e.to_string(),
        })?;
    tracing::debug!(%id, field = %identity, "assigned identity");
    Ok(id)
}
