//! REST API request/response definitions for Quillshare.
//!
//! This crate defines the wire types exchanged between the Quillshare API
//! server and its clients: request bodies, response bodies, client-facing
//! projections of the canonical entities, and the stable error codes
//! carried alongside human-readable error messages.

mod error;
mod requests;
mod responses;
mod types;

pub use error::*;
pub use requests::*;
pub use responses::*;
pub use types::*;
