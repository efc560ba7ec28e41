// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.
pub mod cookie;
pub mod gate;
pub mod google;
pub mod provider;
pub mod session;
pub mod token_generator;

pub use cookie::SESSION_COOKIE_NAME;
pub use gate::{AuthGate, AuthState, CallbackParams, Transition, HOME_PATH, LOGIN_PATH};
pub use google::GoogleProvider;
pub use provider::{ExchangeError, IdentityProfile, IdentityProvider, ProviderRegistry};
pub use session::{PendingLogin, Session, SessionStore, SESSION_FORMAT_VERSION};
