// ============================
// crates/backend-lib/src/logging.rs
// ============================
//! Tracing subscriber setup.
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Settings;

/// Install the global subscriber. `RUST_LOG` wins over `log_level`.
/// Calling it twice is harmless; the second call is ignored.
pub fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if settings.log_json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    if result.is_ok() {
        tracing::debug!(json = settings.log_json, "tracing initialised");
    }
}
