//! Request middleware.

mod session;

pub use session::*;
