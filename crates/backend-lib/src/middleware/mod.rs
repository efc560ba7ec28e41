// crates/backend-lib/src/middleware/mod.rs

//! Request middleware and the identity extractors built on it.

pub mod identity;

pub use identity::{resolve_identity, ApiUser, AuthContext, CurrentUser};
