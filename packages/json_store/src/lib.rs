//! Reference backing stores for rowmap.
//!
//! - `InMemoryStore`: values in memory, optionally opening asynchronously
//! - `LocalJsonStore`: one JSON document per value under a root directory
//!
//! Both assign a v4 UUID to values saved without an identity.

mod identity;
mod open_state;

pub mod in_memory;
pub mod local_disk;

pub use identity::DEFAULT_IDENTITY;
pub use in_memory::InMemoryStore;
pub use local_disk::LocalJsonStore;
