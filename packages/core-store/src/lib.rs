//! rowmap core: structured values and their table-row encoding.
//!
//! This layer knows nothing about where values are stored or how requests
//! arrive. It provides:
//! - `Value`: a structured object (maps of scalars, arbitrarily nested)
//! - `FlatRecord`: the same object as a row of dotted-path columns
//! - `TypeDescriptor`: declared fields, scalar kinds and identity of a type
//! - PathCodec (`flatten`, `unflatten`, `unflatten_typed`, `merge`)
//! - `SelectionFilter`: the where-clause a backing store evaluates
//! - `BackingStore` and `RowCodec`: the seams the router is built on
//!
//! # Example
//!
//! ```rust
//! use rowmap_core::{flatten, unflatten_typed, FlatRecord, ScalarKind, TypeDescriptor};
//!
//! let contact = TypeDescriptor::new()
//!     .with_scalar("id", ScalarKind::Int)
//!     .with_object("address", TypeDescriptor::new().with_scalar("city", ScalarKind::String))
//!     .with_identity("id");
//!
//! let row: FlatRecord = [("id", "1"), ("address.city", "NY")].into_iter().collect();
//! let value = unflatten_typed(&row, &contact).unwrap();
//! assert_eq!(flatten(&value).unwrap(), row);
//! ```

mod codec;
mod error;
mod filter;
mod flat;
mod locator;
mod path;
mod schema;
mod traits;
mod value;

pub use codec::{flatten, merge, unflatten, unflatten_typed, PathCodec};
pub use error::{Error, StoreError};
pub use filter::SelectionFilter;
pub use flat::FlatRecord;
pub use locator::ResourceLocator;
pub use path::{FieldPath, SEPARATOR};
pub use schema::{FieldKind, ScalarKind, TypeDescriptor};
pub use traits::{BackingStore, OpenCallback, RowCodec};
pub use value::Value;
