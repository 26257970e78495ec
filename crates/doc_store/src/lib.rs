//! Document storage for Quillshare.
//!
//! This crate provides the storage abstraction for users, projects,
//! folders, files, and chat rooms. The store offers point lookups and
//! updates by id or by field equality; there are no multi-document
//! transactions, so cross-document consistency is maintained by the
//! application layer. An in-memory implementation backs tests and
//! single-process mode; a SQLite implementation persists one JSON
//! document per row.

mod error;
mod memory;
mod sqlite;
mod traits;

pub use error::*;
pub use memory::*;
pub use sqlite::*;
pub use traits::*;
