//! Serde Integration for rowmap
//!
//! This layer connects the core value model to JSON. It adds:
//! - `FilterBuilder`: parameterized selection text to a `SelectionFilter`
//! - `JsonCodec`: a row codec that keeps the whole object in one JSON column
//! - Value <-> serde conversions
//!
//! # Example
//!
//! ```rust
//! use rowmap_serde::FilterBuilder;
//!
//! let args = [Some("1".to_string()), Some("NY".to_string())];
//! let filter = FilterBuilder::build("id = ? and address.city = ?", &args).unwrap();
//! assert!(filter.where_clause().contains_key("address"));
//! ```

mod codec;
mod convert;
mod selection;

pub use codec::{JsonCodec, DATA_COLUMN};
pub use convert::{from_value, json_to_value, to_json_string, to_value, value_to_json};
pub use selection::{describe, FilterBuilder, PLACEHOLDER};

// Re-export core types for convenience
pub use rowmap_core::{Error, SelectionFilter, Value};
