use crate::config::AppConfig;
use crate::relay::InMemoryRelay;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// Authoritative store and snapshot fan-out for every room
    pub relay: Arc<InMemoryRelay>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let relay = Arc::new(InMemoryRelay::new(&config));
        Self { config, relay }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
