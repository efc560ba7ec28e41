// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! Route handlers.
pub mod api;
pub mod auth;
pub mod tasks;

use serde::Deserialize;

/// `?q=` search parameter
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}
