//! FilterBuilder - parameterized selection text to a structured filter.
//!
//! A selection template carries one `?` per argument. Each argument is
//! quoted as a JSON string literal before it is spliced in, so argument text
//! can never change the shape of the predicate. The substituted text must
//! then be one of:
//!
//! - a JSON object: `{"id": ?}` or `{"address": {"city": ?}}`
//! - a conjunction of equalities: `id = ? and address.city = ?`
//!   (`and` in any case, or `,`, separates terms)
//!
//! Dotted keys nest in both forms, so `{"address.city": ?}`,
//! `address.city = ?` and `{"address": {"city": ?}}` build the same filter.

use std::collections::BTreeMap;

use rowmap_core::{Error, FieldPath, SelectionFilter, Value};

use crate::convert::json_to_value;

/// The placeholder character in selection templates.
pub const PLACEHOLDER: char = '?';

/// Builds [`SelectionFilter`]s from parameterized selection text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterBuilder;

impl FilterBuilder {
    /// Substitute `args` into `template` and parse the result.
    ///
    /// An absent argument (`None`) is spliced in as `null`.
    ///
    /// # Errors
    ///
    /// `FilterArityMismatch` if the template's placeholder count differs
    /// from `args.len()`; `MalformedSelection` if the substituted text is
    /// not a predicate. Neither is retryable.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rowmap_serde::FilterBuilder;
    ///
    /// let filter = FilterBuilder::build("id = ?", &[Some("1".to_string())]).unwrap();
    /// assert_eq!(filter.where_clause().len(), 1);
    /// ```
    pub fn build(template: &str, args: &[Option<String>]) -> Result<SelectionFilter, Error> {
        let text = substitute(template, args)?;

        let terms = if text.trim_start().starts_with('{') {
            parse_object(&text)?
        } else {
            parse_conjunction(&text)?
        };

        let mut clause = Value::map();
        for (key, value) in terms {
            let path = FieldPath::parse(&key).map_err(|e| malformed(&text, e.to_string()))?;
            clause
                .set(&path, value)
                .map_err(|e| malformed(&text, e.to_string()))?;
        }

        match clause {
            Value::Map(where_clause) => Ok(SelectionFilter::new(where_clause)),
            _ => Err(malformed(&text, "selection is not an object".to_string())),
        }
    }
}

fn substitute(template: &str, args: &[Option<String>]) -> Result<String, Error> {
    let fragments: Vec<&str> = template.split(PLACEHOLDER).collect();
    let placeholders = fragments.len() - 1;
    if placeholders != args.len() {
        return Err(Error::FilterArityMismatch {
            placeholders,
            args: args.len(),
        });
    }

    let mut text = String::with_capacity(template.len() + args.len() * 10);
    for (i, fragment) in fragments.iter().enumerate() {
        text.push_str(fragment);
        if let Some(arg) = args.get(i) {
            text.push_str(&quote(arg.as_deref()));
        }
    }
    Ok(text)
}

fn quote(arg: Option<&str>) -> String {
    match arg {
        Some(arg) => serde_json::Value::String(arg.to_string()).to_string(),
        None => "null".to_string(),
    }
}

fn malformed(selection: &str, message: String) -> Error {
    Error::MalformedSelection {
        selection: selection.to_string(),
        message,
    }
}

fn parse_object(text: &str) -> Result<Vec<(String, Value)>, Error> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| malformed(text, e.to_string()))?;

    match json {
        serde_json::Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| (key, json_to_value(value)))
            .collect()),
        other => Err(malformed(text, format!("expected an object, found {}", other))),
    }
}

fn parse_conjunction(text: &str) -> Result<Vec<(String, Value)>, Error> {
    let mut terms = Vec::new();
    let mut rest = text.trim();
    if rest.is_empty() {
        return Err(malformed(text, "empty selection".to_string()));
    }

    loop {
        // Field path up to the operator
        let op = rest
            .find('=')
            .ok_or_else(|| malformed(text, format!("expected '=' in '{}'", rest)))?;
        let key = rest[..op].trim();
        if key.is_empty() {
            return Err(malformed(text, "missing field before '='".to_string()));
        }
        rest = rest[op + 1..].strip_prefix('=').unwrap_or(&rest[op + 1..]);
        rest = rest.trim_start();

        // One JSON literal as the operand
        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<serde_json::Value>();
        let operand = match stream.next() {
            Some(Ok(operand)) => operand,
            Some(Err(e)) => return Err(malformed(text, e.to_string())),
            None => return Err(malformed(text, format!("missing value for '{}'", key))),
        };
        if operand.is_object() || operand.is_array() {
            return Err(malformed(text, format!("value for '{}' must be a scalar", key)));
        }
        let consumed = stream.byte_offset();
        terms.push((key.to_string(), json_to_value(operand)));

        rest = rest[consumed..].trim_start();
        if rest.is_empty() {
            return Ok(terms);
        }
        rest = strip_separator(rest)
            .ok_or_else(|| malformed(text, format!("unexpected '{}'", rest)))?
            .trim_start();
    }
}

fn strip_separator(rest: &str) -> Option<&str> {
    if let Some(after) = rest.strip_prefix(',') {
        return Some(after);
    }
    let word = rest.get(..3)?;
    let after = &rest[3..];
    if word.eq_ignore_ascii_case("and") && after.starts_with(char::is_whitespace) {
        Some(after)
    } else {
        None
    }
}

/// The where-clause of `filter` keyed by dotted paths, for display.
pub fn describe(filter: &SelectionFilter) -> BTreeMap<String, String> {
    fn walk(prefix: &FieldPath, clause: &BTreeMap<String, Value>, out: &mut BTreeMap<String, String>) {
        for (name, value) in clause {
            let path = prefix.child(name);
            match value {
                Value::Map(nested) => walk(&path, nested, out),
                other => {
                    out.insert(
                        path.to_key(),
                        other.scalar_string().unwrap_or_else(|| other.kind_name().to_string()),
                    );
                }
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(&FieldPath::root(), filter.where_clause(), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;

    fn args(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn conjunction_form() {
        let filter = FilterBuilder::build("id = ? and address.city = ?", &args(&["1", "NY"])).unwrap();
        assert_eq!(
            filter.where_clause(),
            &btree! {
                "id".into() => Value::from("1"),
                "address".into() => Value::Map(btree! { "city".into() => Value::from("NY") }),
            }
        );
    }

    #[test]
    fn compact_conjunction() {
        let filter = FilterBuilder::build("id=?", &args(&["1"])).unwrap();
        assert_eq!(
            filter.where_clause(),
            &btree! { "id".into() => Value::from("1") }
        );

        let filter = FilterBuilder::build("a==?,b=? AND c=true", &args(&["x", "y"])).unwrap();
        assert_eq!(filter.where_clause().len(), 3);
        assert_eq!(filter.where_clause().get("c"), Some(&Value::Bool(true)));
    }

    #[test]
    fn object_form() {
        let filter = FilterBuilder::build(r#"{"address": {"city": ?}}"#, &args(&["NY"])).unwrap();
        let dotted = FilterBuilder::build(r#"{"address.city": ?}"#, &args(&["NY"])).unwrap();
        let conj = FilterBuilder::build("address.city = ?", &args(&["NY"])).unwrap();
        assert_eq!(filter, dotted);
        assert_eq!(filter, conj);
    }

    #[test]
    fn arity_mismatch() {
        assert!(matches!(
            FilterBuilder::build("a=? and b=?", &args(&["x"])),
            Err(Error::FilterArityMismatch {
                placeholders: 2,
                args: 1
            })
        ));
        assert!(matches!(
            FilterBuilder::build("a=?", &args(&["x", "y"])),
            Err(Error::FilterArityMismatch { .. })
        ));
    }

    #[test]
    fn arguments_cannot_inject() {
        let hostile = r#"1" and admin = "true"#;
        let filter = FilterBuilder::build("id = ?", &args(&[hostile])).unwrap();
        assert_eq!(filter.where_clause().len(), 1);
        assert_eq!(
            filter.where_clause().get("id"),
            Some(&Value::from(hostile))
        );

        let filter = FilterBuilder::build(r#"{"id": ?}"#, &args(&[r#"x"}, "admin": {"#])).unwrap();
        assert_eq!(filter.where_clause().len(), 1);
    }

    #[test]
    fn absent_argument_is_null() {
        let filter = FilterBuilder::build("nickname = ?", &[None]).unwrap();
        assert_eq!(filter.where_clause().get("nickname"), Some(&Value::Null));
    }

    #[test]
    fn malformed_selections() {
        for template in ["id ?", "= ?", "id = ? or name = ?", "{\"id\": ?", "[?]", ""] {
            let placeholders = template.matches('?').count();
            let result = FilterBuilder::build(template, &args(&vec!["x"; placeholders]));
            assert!(
                matches!(result, Err(Error::MalformedSelection { .. })),
                "expected malformed for {:?}, got {:?}",
                template,
                result
            );
        }
    }

    #[test]
    fn bad_field_names_are_malformed() {
        assert!(matches!(
            FilterBuilder::build("first name = ?", &args(&["a"])),
            Err(Error::MalformedSelection { .. })
        ));
        assert!(matches!(
            FilterBuilder::build("a = ? and a.b = ?", &args(&["x", "y"])),
            Err(Error::MalformedSelection { .. })
        ));
    }

    #[test]
    fn describe_flattens_clause() {
        let filter = FilterBuilder::build("id = ? and address.city = ?", &args(&["1", "NY"])).unwrap();
        let described = describe(&filter);
        assert_eq!(described.get("address.city").map(String::as_str), Some("NY"));
        assert_eq!(described.get("id").map(String::as_str), Some("1"));
    }
}
