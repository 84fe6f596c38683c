//! Structured-type descriptors: which fields a type declares, each field's
//! scalar kind, and which field carries the value's identity.
//!
//! Descriptors are plain data and deserialize from JSON:
//!
//! ```json
//! {
//!   "identity": "id",
//!   "fields": {
//!     "id": "int",
//!     "name": "string",
//!     "address": { "city": "string", "zip": "short" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, FieldPath, Value};

/// The declared kind of a scalar field.
///
/// The kind decides how a string-encoded column value is converted back to
/// a native value. It is never inferred from the text itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
}

impl ScalarKind {
    /// The kind a schema-less field takes from its current value.
    pub fn of(value: &Value) -> Option<ScalarKind> {
        match value {
            Value::Bool(_) => Some(ScalarKind::Boolean),
            Value::Integer(_) => Some(ScalarKind::Long),
            Value::Float(_) => Some(ScalarKind::Double),
            Value::String(_) => Some(ScalarKind::String),
            _ => None,
        }
    }

    /// Convert a column string to a value of this kind.
    ///
    /// `path` is only used to describe a failure.
    pub fn coerce(self, path: &FieldPath, text: &str) -> Result<Value, Error> {
        let invalid = || Error::InvalidScalar {
            path: path.to_key(),
            kind: self,
            value: text.to_string(),
        };

        let value = match self {
            // Anything other than "true" (ignoring case) is false.
            ScalarKind::Boolean => Value::Bool(text.eq_ignore_ascii_case("true")),
            ScalarKind::Byte => Value::Integer(text.parse::<i8>().map_err(|_| invalid())?.into()),
            ScalarKind::Short => {
                Value::Integer(text.parse::<i16>().map_err(|_| invalid())?.into())
            }
            ScalarKind::Int => Value::Integer(text.parse::<i32>().map_err(|_| invalid())?.into()),
            ScalarKind::Long => Value::Integer(text.parse::<i64>().map_err(|_| invalid())?),
            ScalarKind::Float => {
                // Validate as single precision, keep the written digits
                let trimmed = text.trim();
                trimmed.parse::<f32>().map_err(|_| invalid())?;
                Value::Float(trimmed.parse::<f64>().map_err(|_| invalid())?)
            }
            ScalarKind::Double => Value::Float(text.trim().parse::<f64>().map_err(|_| invalid())?),
            ScalarKind::Char => {
                let c = text.chars().next().ok_or_else(invalid)?;
                Value::String(c.to_string())
            }
            ScalarKind::String => Value::String(text.to_string()),
        };

        Ok(value)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Boolean => "boolean",
            ScalarKind::Byte => "byte",
            ScalarKind::Short => "short",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Char => "char",
            ScalarKind::String => "string",
        };
        write!(f, "{}", name)
    }
}

/// A declared field: either a scalar or a nested object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Object(BTreeMap<String, FieldKind>),
}

/// Schema metadata for one kind of structured object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Dotted path of the field whose value identifies a stored object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,

    pub fields: BTreeMap<String, FieldKind>,
}

impl TypeDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a scalar field.
    #[must_use]
    pub fn with_scalar(mut self, name: &str, kind: ScalarKind) -> Self {
        self.fields
            .insert(name.to_string(), FieldKind::Scalar(kind));
        self
    }

    /// Declare a nested object field with the fields of `nested`.
    ///
    /// The nested descriptor's identity, if any, is ignored.
    #[must_use]
    pub fn with_object(mut self, name: &str, nested: TypeDescriptor) -> Self {
        self.fields
            .insert(name.to_string(), FieldKind::Object(nested.fields));
        self
    }

    /// Declare the identity field.
    #[must_use]
    pub fn with_identity(mut self, path: &str) -> Self {
        self.identity = Some(path.to_string());
        self
    }

    /// Check field names and that the identity names a declared scalar.
    pub fn validate(&self) -> Result<(), Error> {
        fn check(prefix: &FieldPath, fields: &BTreeMap<String, FieldKind>) -> Result<(), Error> {
            for (name, kind) in fields {
                // Validates the name as an identifier
                let path = FieldPath::parse(name).map(|_| prefix.child(name))?;
                if let FieldKind::Object(nested) = kind {
                    check(&path, nested)?;
                }
            }
            Ok(())
        }

        check(&FieldPath::root(), &self.fields)?;

        if let Some(identity) = &self.identity {
            let path = FieldPath::parse(identity)?;
            if self.scalar_kind_at(&path).is_none() {
                return Err(Error::FieldNotFound {
                    path: identity.clone(),
                });
            }
        }

        Ok(())
    }

    /// The declared kind at `path`, if any.
    pub fn kind_at(&self, path: &FieldPath) -> Option<&FieldKind> {
        let (first, rest) = path.components.split_first()?;
        let mut kind = self.fields.get(first)?;
        for component in rest {
            kind = match kind {
                FieldKind::Object(fields) => fields.get(component)?,
                FieldKind::Scalar(_) => return None,
            };
        }
        Some(kind)
    }

    /// The declared scalar kind at `path`, if the path names a scalar field.
    pub fn scalar_kind_at(&self, path: &FieldPath) -> Option<ScalarKind> {
        match self.kind_at(path)? {
            FieldKind::Scalar(kind) => Some(*kind),
            FieldKind::Object(_) => None,
        }
    }

    /// Read the identity of `value` as a string.
    ///
    /// Returns `None` when no identity field is declared or the value does
    /// not carry a scalar at that field.
    pub fn identity_of(&self, value: &Value) -> Option<String> {
        let path = FieldPath::parse(self.identity.as_deref()?).ok()?;
        value.get(&path)?.scalar_string()
    }
}
