use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::{CoreInitError, CoreState, SessionArchive};

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Core layer state: the shared voice services and the session archive
    pub core_state: Arc<CoreState>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, CoreInitError> {
        let core_state = CoreState::new(&config)?;
        Ok(Self::with_core(config, core_state))
    }

    /// Build the state around an existing core, e.g. one with stand-in services.
    pub fn with_core(config: ServerConfig, core_state: Arc<CoreState>) -> Arc<Self> {
        Arc::new(Self { config, core_state })
    }

    /// Snapshots of current and recently finished sessions
    pub fn archive(&self) -> &Arc<SessionArchive> {
        &self.core_state.archive
    }
}
