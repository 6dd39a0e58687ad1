//! # op-store
//!
//! Key-value storage for provider records.
//!
//! Records are JSON documents addressed by `(collection, key)`:
//!
//! | Collection | Key | Value |
//! |---|---|---|
//! | `clients` | client id | registered client metadata |
//! | `codes` | authorization code | authorization code record |
//! | `tokens` | `jti` | `{header, payload}` of an access token |
//! | `refresh` | refresh token | `{header, payload}` of the paired access token |
//!
//! Two implementations ship with the crate: [`MemoryStore`] for single
//! instances and tests, and [`FileStore`] which keeps one JSON file per
//! record.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;

pub use backend::{Backend, BackendExt, collections};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
