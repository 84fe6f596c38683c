//! rowmap router: tabular requests over structured-object stores.
//!
//! A [`StoreRouter`] is built once from a [`Registration`] (store name to
//! the locators it serves) and a [`StoreProvider`] that resolves store
//! names. It then serves insert, bulk insert, query, update and delete
//! requests addressed by [`ResourceLocator`](rowmap_core::ResourceLocator),
//! translating flat rows through a [`RowCodec`](rowmap_core::RowCodec) and
//! selections through [`FilterBuilder`](rowmap_serde::FilterBuilder).
//!
//! Stores that open asynchronously are guarded by a [`ReadinessGate`]:
//! operations block until the store has opened or
//! [`RouterConfig::open_timeout`] elapses.
//!
//! # Features
//!
//! - `async`: [`AsyncStoreRouter`], which runs operations on tokio's
//!   blocking pool.

mod config;
mod cursor;
mod gate;
mod registry;
mod router;

#[cfg(feature = "async")]
mod async_router;

pub use config::{RouterConfig, DEFAULT_OPEN_TIMEOUT, OPEN_TIMEOUT_ENV};
pub use cursor::{Cursor, JsonRowCursor, RowCursor, JSON_COLUMNS};
pub use gate::{GateState, Readiness, ReadinessGate};
pub use registry::{LocatorBinding, Registration, StoreProvider};
pub use router::{StoreRouter, CONTENT_TYPE};

#[cfg(feature = "async")]
pub use async_router::AsyncStoreRouter;
