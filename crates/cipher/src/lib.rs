//! Reversible message encryption for Quillshare.
//!
//! Inbox message bodies are encrypted at rest with a server-held secret:
//! text in, opaque token out, reversible only by the holder of the key.
//! Chat messages are intentionally not run through this.

mod error;
mod message;

pub use error::*;
pub use message::*;
