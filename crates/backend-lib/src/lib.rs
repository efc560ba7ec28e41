// ============================
// taskboard-backend-lib/src/lib.rs
// ============================
//! Core functionality for the taskboard web server.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod search;
pub mod storage;
pub mod tasks;
pub mod validation;
pub mod views;

use std::sync::Arc;

use crate::auth::{AuthGate, GoogleProvider, ProviderRegistry, SessionStore};
use crate::config::Settings;
use crate::storage::TaskStorage;
use crate::tasks::TaskService;
use crate::views::Views;

pub use router::create_router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Settings the server was started with
    pub settings: Arc<Settings>,
    /// Session store and login state machine
    pub gate: AuthGate,
    /// Task operations over the storage backend
    pub tasks: TaskService,
    /// Compiled templates
    pub views: Views,
}

impl AppState {
    /// Build the state with the identity providers enabled in `settings`
    pub fn new(storage: Arc<dyn TaskStorage>, settings: Settings) -> anyhow::Result<Self> {
        let mut providers = ProviderRegistry::new();
        let google = &settings.oauth.google;
        if google.is_configured() {
            providers.register(Arc::new(GoogleProvider::new(
                google.clone(),
                settings.exchange_timeout(),
            )?));
        } else {
            tracing::warn!("no google client configured, login is unavailable");
        }
        Self::with_providers(storage, settings, providers)
    }

    /// Build the state with an explicit provider set
    pub fn with_providers(
        storage: Arc<dyn TaskStorage>,
        settings: Settings,
        providers: ProviderRegistry,
    ) -> anyhow::Result<Self> {
        let sessions = SessionStore::from_settings(&settings.session);
        let gate = AuthGate::new(sessions, providers, settings.exchange_timeout());
        let tasks = TaskService::new(storage, settings.list_delay());
        let views = Views::new()?;

        Ok(Self {
            settings: Arc::new(settings),
            gate,
            tasks,
            views,
        })
    }
}
