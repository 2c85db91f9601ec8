use std::sync::Arc;

use crate::core::config::{load_portal_config, PortalConfig};
use crate::session::SessionStore;

/// Shared per-process state handed to every request handler.
///
/// Note what is *not* here: no browser pool and no session-file lock. Each
/// request launches and tears down its own browser, and the session file is
/// only contended when two requests hit an expired session at once — a
/// single-process, low-concurrency assumption this service runs under.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PortalConfig>,
    pub session_store: Arc<SessionStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("portal_url", &self.config.resolve_portal_url())
            .field("session_file", &self.session_store.path())
            .finish()
    }
}

impl AppState {
    pub fn new() -> Self {
        let config = load_portal_config();
        let session_store = SessionStore::new(config.resolve_session_file());
        Self {
            config: Arc::new(config),
            session_store: Arc::new(session_store),
        }
    }

    /// Build state around an explicit config and store — test doubles plug in here.
    pub fn with_parts(config: PortalConfig, session_store: SessionStore) -> Self {
        Self {
            config: Arc::new(config),
            session_store: Arc::new(session_store),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
