//! Shared application state.

use std::sync::Arc;

use storedash_postgres::{Dashboard, Directory};

use crate::session::SessionVerifier;

/// State handed to every handler: the data layer behind trait objects so
/// the router can be exercised without a database.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<dyn Dashboard>,
    pub directory: Arc<dyn Directory>,
    pub sessions: Arc<dyn SessionVerifier>,
}

impl AppState {
    /// Create the application state.
    pub fn new(
        dashboard: Arc<dyn Dashboard>,
        directory: Arc<dyn Directory>,
        sessions: Arc<dyn SessionVerifier>,
    ) -> Self {
        Self {
            dashboard,
            directory,
            sessions,
        }
    }
}
