//! rowmap: serve structured-object stores through a tabular row interface.
//!
//! Callers address a collection by [`ResourceLocator`] and exchange flat
//! rows whose columns are dotted field paths (`address.city`). The
//! [`StoreRouter`] translates rows to structured values and back, turns
//! parameterized selections into [`SelectionFilter`]s, and holds callers
//! until asynchronously opening stores are ready.
//!
//! # Crates
//!
//! - `rowmap-core`: values, flat rows, type descriptors and the path codec
//! - `rowmap-serde`: JSON conversion, selection parsing and the JSON row codec
//! - `rowmap-json-store`: in-memory and local JSON reference backing stores
//! - `rowmap-router`: registration, readiness gates, cursors and the router
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use rowmap::{
//!     BackingStore, FlatRecord, InMemoryStore, LocatorBinding, Registration, ResourceLocator,
//!     RouterConfig, ScalarKind, StoreRouter, TypeDescriptor,
//! };
//!
//! let contact = TypeDescriptor::new()
//!     .with_scalar("id", ScalarKind::Int)
//!     .with_scalar("name", ScalarKind::String)
//!     .with_identity("id");
//!
//! let mut stores: HashMap<String, Arc<dyn BackingStore>> = HashMap::new();
//! stores.insert("people".to_string(), Arc::new(InMemoryStore::new()));
//!
//! let router = StoreRouter::new(
//!     Registration::new().store("people", [LocatorBinding::typed("content://people", contact)]),
//!     &stores,
//!     RouterConfig::default(),
//! )
//! .unwrap();
//!
//! let people = ResourceLocator::new("content://people");
//! let row: FlatRecord = [("id", "1"), ("name", "Ada")].into_iter().collect();
//! router.insert(&people, &row).unwrap();
//!
//! let rows = router.query(&people, "id = ?", &[Some("1".to_string())]).unwrap();
//! assert_eq!(rows, vec![row]);
//! ```

pub use rowmap_core::{
    flatten, merge, unflatten, unflatten_typed, BackingStore, Error, FieldKind, FieldPath,
    FlatRecord, OpenCallback, PathCodec, ResourceLocator, RowCodec, ScalarKind, SelectionFilter,
    StoreError, TypeDescriptor, Value,
};
pub use rowmap_json_store::{InMemoryStore, LocalJsonStore};
pub use rowmap_router::{
    Cursor, GateState, JsonRowCursor, LocatorBinding, Readiness, ReadinessGate, Registration,
    RouterConfig, RowCursor, StoreProvider, StoreRouter,
};
pub use rowmap_serde::{FilterBuilder, JsonCodec};

#[cfg(feature = "async")]
pub use rowmap_router::AsyncStoreRouter;
