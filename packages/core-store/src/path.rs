//! Dotted field paths with validated identifier components.

use std::fmt;

use crate::Error;

/// Separator between field names in a column key (`address.city`).
pub const SEPARATOR: char = '.';

/// A validated path from the root of a structured value to one of its fields.
///
/// Components must be valid Unicode identifiers (per UAX#31), matching the
/// field names a structured type can declare. Unlike column keys, the empty
/// path is allowed and addresses the root itself.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldPath {
    pub components: Vec<String>,
}

impl FieldPath {
    /// The root path (no components).
    pub fn root() -> Self {
        FieldPath {
            components: Vec::new(),
        }
    }

    /// Parse a column key such as `address.city`.
    ///
    /// Empty keys and empty components (`a..b`, `.a`, `a.`) are rejected:
    /// a column always names at least one field.
    ///
    /// ```rust
    /// use rowmap_core::FieldPath;
    ///
    /// let path = FieldPath::parse("address.city").unwrap();
    /// assert_eq!(path.len(), 2);
    /// assert!(FieldPath::parse("address..city").is_err());
    /// ```
    pub fn parse(key: &str) -> Result<Self, Error> {
        if key.is_empty() {
            return Err(Error::InvalidPath {
                path: key.to_string(),
                message: "empty column key".to_string(),
            });
        }

        let components: Vec<String> = key.split(SEPARATOR).map(str::to_string).collect();
        for component in &components {
            Self::validate_component(key, component)?;
        }

        Ok(FieldPath { components })
    }

    fn validate_component(key: &str, component: &str) -> Result<(), Error> {
        match component_problem(component) {
            Some(message) => Err(Error::InvalidPath {
                path: key.to_string(),
                message,
            }),
            None => Ok(()),
        }
    }

    /// Whether `name` can appear as one component of a column key.
    ///
    /// `flatten` refuses any field name for which this is false, so every
    /// column it produces parses back.
    pub fn is_field_name(name: &str) -> bool {
        component_problem(name).is_none()
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.components.iter()
    }

    /// Append one field name.
    #[must_use]
    pub fn child(&self, field: &str) -> FieldPath {
        let mut components = self.components.clone();
        components.push(field.to_string());
        FieldPath { components }
    }

    /// Split into the parent path and the terminal field name.
    ///
    /// Returns `None` for the root path.
    pub fn split_last(&self) -> Option<(FieldPath, &str)> {
        let (last, parent) = self.components.split_last()?;
        Some((
            FieldPath {
                components: parent.to_vec(),
            },
            last.as_str(),
        ))
    }

    /// The column key for this path: components joined by `.`.
    pub fn to_key(&self) -> String {
        self.components.join(".")
    }
}

fn component_problem(component: &str) -> Option<String> {
    let mut chars = component.chars();
    let Some(first) = chars.next() else {
        return Some("empty component".to_string());
    };

    // First char: XID_Start, or underscore followed by XID_Continue
    let valid_start = unicode_ident::is_xid_start(first)
        || (first == '_'
            && chars
                .clone()
                .next()
                .is_some_and(unicode_ident::is_xid_continue));
    if !valid_start {
        return Some(format!(
            "component '{}' must start with a letter or underscore",
            component
        ));
    }

    chars
        .find(|c| !unicode_ident::is_xid_continue(*c))
        .map(|c| format!("invalid character '{}' in component '{}'", c, component))
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

impl std::ops::Index<usize> for FieldPath {
    type Output = String;

    fn index(&self, i: usize) -> &Self::Output {
        &self.components[i]
    }
}

/// Macro for creating field paths from literals.
///
/// # Example
///
/// ```rust
/// use rowmap_core::field_path;
///
/// let p = field_path!("address.city");
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! field_path {
    ($s:expr) => {
        $crate::FieldPath::parse($s).expect("invalid field path literal")
    };
}
