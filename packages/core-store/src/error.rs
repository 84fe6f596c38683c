//! Error types for the core layer.
//!
//! `Error` is the single failure type surfaced by every translation and
//! routing operation. `StoreError` carries failures reported by a backing
//! store; the router forwards those untouched inside `Error::Store`.

use std::time::Duration;

use crate::locator::ResourceLocator;
use crate::schema::ScalarKind;

/// Failures reported by a backing store implementation.
#[derive(Debug)]
pub enum StoreError {
    /// The store has not finished opening (or never will).
    NotOpen,

    /// The store's asynchronous open completed with a failure.
    OpenFailed { message: String },

    /// I/O failure in the store's persistence layer.
    Io(std::io::Error),

    /// The store could not encode or decode a persisted value.
    Serialization { message: String },

    /// Anything else the store wants to report.
    Other { message: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotOpen => write!(f, "store is not open"),
            StoreError::OpenFailed { message } => write!(f, "store failed to open: {}", message),
            StoreError::Io(e) => write!(f, "store I/O error: {}", e),
            StoreError::Serialization { message } => {
                write!(f, "store serialization error: {}", message)
            }
            StoreError::Other { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Errors surfaced to callers of the codec, the filter builder and the router.
#[derive(Debug)]
pub enum Error {
    /// A sequence or a non-scalar leaf was found where only maps and scalars
    /// are representable as columns.
    UnsupportedShape { path: String, found: &'static str },

    /// A flat record assigns both a leaf and an interior node at one path.
    DataConflict { path: String },

    /// A column names a field the target schema does not declare.
    FieldNotFound { path: String },

    /// A column value cannot be coerced to the field's declared kind.
    InvalidScalar {
        path: String,
        kind: ScalarKind,
        value: String,
    },

    /// A column key is not a valid dotted field path.
    InvalidPath { path: String, message: String },

    /// A cell's text could not be decoded into the value it encodes.
    MalformedCell { column: String, message: String },

    /// The substituted selection text is not a well-formed predicate.
    MalformedSelection { selection: String, message: String },

    /// The selection has a different number of placeholders than arguments.
    FilterArityMismatch { placeholders: usize, args: usize },

    /// No store is registered for the locator.
    UnknownLocator(ResourceLocator),

    /// The locator is registered but its store handle could not be resolved.
    StoreUnavailable(ResourceLocator),

    /// Registration named the same locator more than once.
    DuplicateLocator(ResourceLocator),

    /// The readiness wait for the locator's store exceeded its deadline.
    Timeout {
        locator: ResourceLocator,
        waited: Duration,
    },

    /// A matched value has no discoverable identity field.
    MissingIdentity { locator: ResourceLocator },

    /// The type descriptor and the backing store key values by different
    /// fields, so removals by descriptor identity would match nothing.
    IdentityMismatch {
        locator: ResourceLocator,
        descriptor: String,
        store: String,
    },

    /// A cursor was read with no current row or past its last column.
    CursorOutOfRange { row: Option<usize>, column: usize },

    /// Failure reported by the backing store.
    Store(StoreError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnsupportedShape { path, found } => {
                if path.is_empty() {
                    write!(f, "unsupported shape: {} at root", found)
                } else {
                    write!(f, "unsupported shape: {} at '{}'", found, path)
                }
            }
            Error::DataConflict { path } => {
                write!(f, "data conflict: '{}' is both a leaf and a parent", path)
            }
            Error::FieldNotFound { path } => write!(f, "field not found: '{}'", path),
            Error::InvalidScalar { path, kind, value } => {
                write!(f, "cannot coerce '{}' to {} for field '{}'", value, kind, path)
            }
            Error::InvalidPath { path, message } => {
                write!(f, "invalid field path '{}': {}", path, message)
            }
            Error::MalformedCell { column, message } => {
                write!(f, "cannot decode column '{}': {}", column, message)
            }
            Error::MalformedSelection { selection, message } => {
                write!(f, "malformed selection '{}': {}", selection, message)
            }
            Error::FilterArityMismatch { placeholders, args } => write!(
                f,
                "selection has {} placeholder(s) but {} argument(s) were supplied",
                placeholders, args
            ),
            Error::UnknownLocator(locator) => write!(f, "unknown locator: {}", locator),
            Error::StoreUnavailable(locator) => {
                write!(f, "store for {} does not exist", locator)
            }
            Error::DuplicateLocator(locator) => {
                write!(f, "locator {} is registered more than once", locator)
            }
            Error::Timeout { locator, waited } => write!(
                f,
                "store for {} did not open within {} ms",
                locator,
                waited.as_millis()
            ),
            Error::MissingIdentity { locator } => {
                write!(f, "value read from {} has no identity field", locator)
            }
            Error::IdentityMismatch {
                locator,
                descriptor,
                store,
            } => write!(
                f,
                "type for {} is identified by '{}' but its store keys values by '{}'",
                locator, descriptor, store
            ),
            Error::CursorOutOfRange { row: Some(row), column } => {
                write!(f, "cursor has no column {} at row {}", column, row)
            }
            Error::CursorOutOfRange { row: None, column } => {
                write!(f, "cursor is not on a row (reading column {})", column)
            }
            Error::Store(e) => write!(f, "store error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Error::Store(e)
    }
}

impl Error {
    /// Whether retrying the whole call may succeed.
    ///
    /// Only a readiness timeout is transient; every other kind indicates a
    /// caller, schema or configuration problem.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn unsupported_shape_display() {
        let e = Error::UnsupportedShape {
            path: "tags".to_string(),
            found: "array",
        };
        let display = format!("{}", e);
        assert!(display.contains("array"));
        assert!(display.contains("tags"));

        let e = Error::UnsupportedShape {
            path: String::new(),
            found: "string",
        };
        assert!(format!("{}", e).contains("root"));
    }

    #[test]
    fn arity_display() {
        let e = Error::FilterArityMismatch {
            placeholders: 2,
            args: 1,
        };
        assert_eq!(
            format!("{}", e),
            "selection has 2 placeholder(s) but 1 argument(s) were supplied"
        );
    }

    #[test]
    fn invalid_scalar_display() {
        let e = Error::InvalidScalar {
            path: "age".to_string(),
            kind: ScalarKind::Int,
            value: "old".to_string(),
        };
        let display = format!("{}", e);
        assert!(display.contains("old"));
        assert!(display.contains("int"));
        assert!(display.contains("age"));
    }

    #[test]
    fn timeout_display_and_retry() {
        let e = Error::Timeout {
            locator: ResourceLocator::new("content://test/Data"),
            waited: Duration::from_millis(250),
        };
        assert!(format!("{}", e).contains("250 ms"));
        assert!(e.is_retryable());
        assert!(!Error::UnknownLocator(ResourceLocator::new("x")).is_retryable());
    }

    #[test]
    fn identity_mismatch_display() {
        let e = Error::IdentityMismatch {
            locator: ResourceLocator::new("content://test/Data"),
            descriptor: "key".to_string(),
            store: "id".to_string(),
        };
        let display = format!("{}", e);
        assert!(display.contains("'key'"));
        assert!(display.contains("'id'"));
        assert!(!e.is_retryable());
    }

    #[test]
    fn store_error_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: Error = StoreError::from(io_err).into();
        assert!(matches!(e, Error::Store(StoreError::Io(_))));
        assert!(StdError::source(&e).is_some());
        assert!(StdError::source(StdError::source(&e).unwrap()).is_some());
    }

    #[test]
    fn other_store_error_display() {
        let e = StoreError::Other {
            message: "disk full".to_string(),
        };
        assert_eq!(format!("{}", e), "disk full");
        assert!(StdError::source(&e).is_none());
    }
}
