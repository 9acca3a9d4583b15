//! Application state.

use std::sync::Arc;

use vnote_queue::JobStore;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<JobStore>,
}

impl AppState {
    /// Create application state around an existing store.
    pub fn new(config: ApiConfig, store: JobStore) -> Self {
        Self {
            config,
            store: Arc::new(store),
        }
    }

    /// Create application state with the store configured from the environment.
    pub fn from_env(config: ApiConfig) -> Self {
        Self::new(config, JobStore::from_env())
    }
}
