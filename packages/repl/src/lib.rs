//! # rowmap-repl
//!
//! An interactive shell over a [`StoreRouter`](rowmap_router::StoreRouter).
//!
//! Stores, locators and types come from a JSON configuration file (see
//! [`ShellConfig`]); without one the shell serves a single untyped
//! in-memory locator.
//!
//! ## Usage
//!
//! ```bash
//! rowmap --config stores.json
//!
//! # Inside the shell:
//! > insert {"id": 1, "name": "Ada", "address": {"city": "NY"}}
//! > query address.city = ? -- NY
//! > update {"name": "Ada L"} id = ? -- 1
//! > delete {"id": ?} -- 1
//! ```

pub mod commands;
pub mod completer;
pub mod config;
pub mod core;
pub mod error;
pub mod host;
pub mod io;
pub mod session;

pub use config::ShellConfig;
pub use error::ShellError;
pub use session::Session;

use crate::core::ReplCore;
use crate::host::TerminalHost;
use crate::io::ExitReason;

/// Build the router described by `config` and run the shell in the terminal.
pub fn run(config: &ShellConfig) -> Result<ExitReason, ShellError> {
    let session = Session::new(config.build_router()?);
    let mut host = TerminalHost::new(session.locator_names());
    Ok(ReplCore::new(session).run(&mut host)?)
}
