// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const AUTH_LOGIN_STARTED: &str = "auth.login.started";
pub const AUTH_LOGIN_SUCCEEDED: &str = "auth.login.succeeded";
pub const AUTH_LOGIN_DENIED: &str = "auth.login.denied";
pub const AUTH_LOGOUT: &str = "auth.logout";
pub const SESSION_REJECTED: &str = "session.rejected";
pub const TASK_CREATED: &str = "task.created";
pub const TASK_UPDATED: &str = "task.updated";
pub const TASK_DELETED: &str = "task.deleted";
