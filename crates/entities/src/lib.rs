//! Core entity definitions for Quillshare.
//!
//! This crate defines all the canonical data types used across the
//! Quillshare application: users and their profiles, projects, folders,
//! files, chat rooms, and inbox messages. Client-facing projections of
//! these types live in `api_protocol`, not here.

mod chat;
mod file;
mod folder;
mod message;
mod project;
mod user;

pub use chat::*;
pub use file::*;
pub use folder::*;
pub use message::*;
pub use project::*;
pub use user::*;
