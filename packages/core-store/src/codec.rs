//! PathCodec: structured values to flat column maps and back.
//!
//! A value flattens to one column per scalar leaf, keyed by the dotted path
//! from the root. Only trees of maps and scalars are representable; a
//! sequence anywhere in the tree is rejected rather than silently dropped,
//! so `unflatten(flatten(v)) == v` holds for every value `flatten` accepts
//! (up to the string encoding of scalars, which a descriptor undoes).

use crate::schema::{FieldKind, ScalarKind, TypeDescriptor};
use crate::traits::RowCodec;
use crate::{Error, FieldPath, FlatRecord, Value};

/// Flatten a structured value into columns.
///
/// Fields are visited in lexicographic order. Empty nested maps produce no
/// column.
///
/// # Errors
///
/// `UnsupportedShape` if the root is not a map, any field holds a sequence
/// or `Null`, or a field name is not a valid key component (see
/// [`FieldPath::is_field_name`]).
pub fn flatten(value: &Value) -> Result<FlatRecord, Error> {
    if !value.is_map() {
        return Err(Error::UnsupportedShape {
            path: String::new(),
            found: value.kind_name(),
        });
    }

    let mut record = FlatRecord::new();
    flatten_into(value, &FieldPath::root(), &mut record)?;
    Ok(record)
}

fn flatten_into(value: &Value, path: &FieldPath, record: &mut FlatRecord) -> Result<(), Error> {
    match value {
        Value::Map(fields) => {
            for (name, child) in fields {
                let child_path = path.child(name);
                if !FieldPath::is_field_name(name) {
                    return Err(Error::UnsupportedShape {
                        path: child_path.to_key(),
                        found: "field name",
                    });
                }
                flatten_into(child, &child_path, record)?;
            }
            Ok(())
        }
        Value::Array(_) => Err(Error::UnsupportedShape {
            path: path.to_key(),
            found: "array",
        }),
        scalar => {
            // Null has no encoding and is rejected here
            let encoded = scalar.scalar_string().ok_or_else(|| Error::UnsupportedShape {
                path: path.to_key(),
                found: scalar.kind_name(),
            })?;
            record.insert(path.to_key(), encoded);
            Ok(())
        }
    }
}

/// Rebuild a structured value from columns without a schema.
///
/// Every leaf becomes a `Value::String`; use [`unflatten_typed`] to restore
/// native scalar kinds.
///
/// # Errors
///
/// `InvalidPath` for a malformed column key, `DataConflict` when one column
/// names a leaf and another names a field beneath it.
pub fn unflatten(record: &FlatRecord) -> Result<Value, Error> {
    let mut root = Value::map();
    for (key, text) in record.iter() {
        let path = FieldPath::parse(key)?;
        insert_leaf(&mut root, &path, Value::String(text.to_string()))?;
    }
    Ok(root)
}

/// Rebuild a structured value from columns, coercing each cell to the kind
/// the descriptor declares for it.
///
/// # Errors
///
/// `FieldNotFound` for a column the descriptor does not declare,
/// `DataConflict` for a column naming an object field, `InvalidScalar` when
/// a cell cannot be coerced.
pub fn unflatten_typed(record: &FlatRecord, descriptor: &TypeDescriptor) -> Result<Value, Error> {
    let mut root = Value::map();
    for (key, text) in record.iter() {
        let path = FieldPath::parse(key)?;
        let kind = match descriptor.kind_at(&path) {
            Some(FieldKind::Scalar(kind)) => *kind,
            Some(FieldKind::Object(_)) => {
                return Err(Error::DataConflict {
                    path: key.to_string(),
                })
            }
            None => {
                return Err(Error::FieldNotFound {
                    path: key.to_string(),
                })
            }
        };
        insert_leaf(&mut root, &path, kind.coerce(&path, text)?)?;
    }
    Ok(root)
}

fn insert_leaf(root: &mut Value, path: &FieldPath, leaf: Value) -> Result<(), Error> {
    if root.get(path).is_some_and(Value::is_map) {
        return Err(Error::DataConflict {
            path: path.to_key(),
        });
    }
    root.set(path, leaf)
}

/// Overwrite existing fields of `target` with the columns of `patch`.
///
/// Each patch cell is coerced by the kind of the field it overwrites: the
/// descriptor's declared kind when there is one, otherwise the kind of the
/// target's current value. Missing intermediate objects are created when the
/// descriptor declares them; the terminal field is never introduced.
///
/// The merge is all-or-nothing: on error `target` is left unchanged.
///
/// # Errors
///
/// `FieldNotFound` if a column does not name an existing scalar field,
/// `InvalidScalar` if a cell cannot be coerced.
pub fn merge(
    target: &mut Value,
    patch: &FlatRecord,
    descriptor: Option<&TypeDescriptor>,
) -> Result<(), Error> {
    let mut merged = target.clone();

    for (key, text) in patch.iter() {
        let path = FieldPath::parse(key)?;
        let kind = match descriptor {
            Some(descriptor) => descriptor.scalar_kind_at(&path),
            None => merged.get(&path).and_then(ScalarKind::of),
        }
        .ok_or_else(|| Error::FieldNotFound {
            path: key.to_string(),
        })?;

        merged.set(&path, kind.coerce(&path, text)?)?;
    }

    *target = merged;
    Ok(())
}

/// The default [`RowCodec`]: dotted-path flattening with descriptor-driven
/// coercion.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathCodec;

impl RowCodec for PathCodec {
    fn to_value(
        &self,
        row: &FlatRecord,
        descriptor: Option<&TypeDescriptor>,
    ) -> Result<Value, Error> {
        match descriptor {
            Some(descriptor) => unflatten_typed(row, descriptor),
            None => unflatten(row),
        }
    }

    fn to_row(&self, value: &Value, _descriptor: Option<&TypeDescriptor>) -> Result<FlatRecord, Error> {
        flatten(value)
    }

    fn merge(
        &self,
        target: &mut Value,
        patch: &FlatRecord,
        descriptor: Option<&TypeDescriptor>,
    ) -> Result<(), Error> {
        merge(target, patch, descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;

    fn contact_descriptor() -> TypeDescriptor {
        TypeDescriptor::new()
            .with_scalar("id", ScalarKind::Int)
            .with_scalar("name", ScalarKind::String)
            .with_scalar("active", ScalarKind::Boolean)
            .with_scalar("score", ScalarKind::Double)
            .with_object(
                "address",
                TypeDescriptor::new()
                    .with_scalar("city", ScalarKind::String)
                    .with_scalar("zip", ScalarKind::Short),
            )
            .with_identity("id")
    }

    fn contact() -> Value {
        Value::Map(btree! {
            "id".into() => Value::Integer(42),
            "name".into() => Value::from("Ada"),
            "active".into() => Value::Bool(true),
            "score".into() => Value::Float(9.5),
            "address".into() => Value::Map(btree! {
                "city".into() => Value::from("NY"),
                "zip".into() => Value::Integer(10001),
            }),
        })
    }

    #[test]
    fn flatten_nested() {
        let record = flatten(&contact()).unwrap();
        let expected: FlatRecord = [
            ("active", "true"),
            ("address.city", "NY"),
            ("address.zip", "10001"),
            ("id", "42"),
            ("name", "Ada"),
            ("score", "9.5"),
        ]
        .into_iter()
        .collect();
        assert_eq!(record, expected);
    }

    #[test]
    fn flatten_orders_columns_lexicographically() {
        let record = flatten(&contact()).unwrap();
        let keys: Vec<&str> = record.keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn flatten_rejects_arrays() {
        let mut value = contact();
        value
            .set(
                &FieldPath::parse("address.lines").unwrap(),
                Value::from(vec!["a", "b"]),
            )
            .unwrap();

        let err = flatten(&value).unwrap_err();
        assert!(
            matches!(err, Error::UnsupportedShape { ref path, found: "array" } if path == "address.lines")
        );
    }

    #[test]
    fn flatten_rejects_scalar_root() {
        assert!(matches!(
            flatten(&Value::from("loose")),
            Err(Error::UnsupportedShape { found: "string", .. })
        ));
    }

    #[test]
    fn flatten_rejects_nulls() {
        let value = Value::Map(btree! {
            "id".into() => Value::Integer(1),
            "nickname".into() => Value::Null,
        });
        assert!(matches!(
            flatten(&value),
            Err(Error::UnsupportedShape { ref path, found: "null" }) if path == "nickname"
        ));
    }

    #[test]
    fn flatten_rejects_names_unflatten_cannot_parse() {
        for name in ["first-name", "zip code", "1st", "a.b", ""] {
            let value = Value::Map(btree! {
                name.into() => Value::from("Ada"),
            });
            assert!(
                matches!(
                    flatten(&value),
                    Err(Error::UnsupportedShape { found: "field name", .. })
                ),
                "{name:?}"
            );
        }

        let nested = Value::Map(btree! {
            "person".into() => Value::Map(btree! {
                "first-name".into() => Value::from("Ada"),
            }),
        });
        assert!(matches!(
            flatten(&nested),
            Err(Error::UnsupportedShape { ref path, .. }) if path == "person.first-name"
        ));
    }

    #[test]
    fn unicode_names_roundtrip() {
        let value = Value::Map(btree! {
            "_id".into() => Value::from("1"),
            "usuario".into() => Value::Map(btree! {
                "名前".into() => Value::from("Ada"),
            }),
        });
        let record = flatten(&value).unwrap();
        assert_eq!(unflatten(&record).unwrap(), value);
    }

    #[test]
    fn unflatten_builds_string_tree() {
        let record: FlatRecord = [("id", "1"), ("address.city", "NY")].into_iter().collect();
        let value = unflatten(&record).unwrap();
        assert_eq!(
            value,
            Value::Map(btree! {
                "id".into() => Value::from("1"),
                "address".into() => Value::Map(btree! {
                    "city".into() => Value::from("NY"),
                }),
            })
        );
    }

    #[test]
    fn unflatten_detects_conflicts() {
        let record: FlatRecord = [("address", "x"), ("address.city", "NY")]
            .into_iter()
            .collect();
        assert!(matches!(
            unflatten(&record),
            Err(Error::DataConflict { .. })
        ));
    }

    #[test]
    fn unflatten_rejects_bad_keys() {
        let record: FlatRecord = [("address..city", "NY")].into_iter().collect();
        assert!(matches!(unflatten(&record), Err(Error::InvalidPath { .. })));
    }

    #[test]
    fn typed_roundtrip() {
        let original = contact();
        let record = flatten(&original).unwrap();
        let back = unflatten_typed(&record, &contact_descriptor()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn typed_unflatten_rejects_undeclared_columns() {
        let record: FlatRecord = [("id", "1"), ("email", "a@b")].into_iter().collect();
        assert!(matches!(
            unflatten_typed(&record, &contact_descriptor()),
            Err(Error::FieldNotFound { path }) if path == "email"
        ));
    }

    #[test]
    fn typed_unflatten_rejects_object_as_leaf() {
        let record: FlatRecord = [("address", "NY")].into_iter().collect();
        assert!(matches!(
            unflatten_typed(&record, &contact_descriptor()),
            Err(Error::DataConflict { .. })
        ));
    }

    #[test]
    fn typed_unflatten_reports_bad_cells() {
        let record: FlatRecord = [("id", "forty-two")].into_iter().collect();
        assert!(matches!(
            unflatten_typed(&record, &contact_descriptor()),
            Err(Error::InvalidScalar { kind: ScalarKind::Int, .. })
        ));
    }

    #[test]
    fn merge_coerces_by_declared_kind() {
        let mut value = contact();
        let patch: FlatRecord = [("address.zip", "94107"), ("active", "false"), ("name", "123")]
            .into_iter()
            .collect();

        merge(&mut value, &patch, Some(&contact_descriptor())).unwrap();

        let zip = FieldPath::parse("address.zip").unwrap();
        let active = FieldPath::parse("active").unwrap();
        let name = FieldPath::parse("name").unwrap();
        assert_eq!(value.get(&zip), Some(&Value::Integer(94107)));
        assert_eq!(value.get(&active), Some(&Value::Bool(false)));
        // Declared string: numeric-looking text stays a string
        assert_eq!(value.get(&name), Some(&Value::from("123")));
    }

    #[test]
    fn merge_unknown_field_leaves_target_unchanged() {
        let mut value = contact();
        let patch: FlatRecord = [("name", "Grace"), ("nonexistent", "1")]
            .into_iter()
            .collect();

        let err = merge(&mut value, &patch, Some(&contact_descriptor())).unwrap_err();
        assert!(matches!(err, Error::FieldNotFound { path } if path == "nonexistent"));
        assert_eq!(value, contact());
    }

    #[test]
    fn merge_bad_cell_leaves_target_unchanged() {
        let mut value = contact();
        let patch: FlatRecord = [("address.city", "LA"), ("id", "x")].into_iter().collect();

        assert!(merge(&mut value, &patch, Some(&contact_descriptor())).is_err());
        assert_eq!(value, contact());
    }

    #[test]
    fn merge_creates_declared_intermediates() {
        let mut value = Value::Map(btree! { "id".into() => Value::Integer(1) });
        let patch: FlatRecord = [("address.city", "LA")].into_iter().collect();

        merge(&mut value, &patch, Some(&contact_descriptor())).unwrap();
        assert_eq!(
            value.get(&FieldPath::parse("address.city").unwrap()),
            Some(&Value::from("LA"))
        );
    }

    #[test]
    fn schemaless_merge_uses_current_kind() {
        let mut value = Value::Map(btree! {
            "count".into() => Value::Integer(1),
            "label".into() => Value::from("a"),
        });
        let patch: FlatRecord = [("count", "5"), ("label", "7")].into_iter().collect();

        merge(&mut value, &patch, None).unwrap();
        assert_eq!(
            value,
            Value::Map(btree! {
                "count".into() => Value::Integer(5),
                "label".into() => Value::from("7"),
            })
        );

        let patch: FlatRecord = [("missing", "1")].into_iter().collect();
        assert!(matches!(
            merge(&mut value, &patch, None),
            Err(Error::FieldNotFound { .. })
        ));
    }
}
