//! services/api/src/web/state.rs
//!
//! Defines the application state shared by every handler.

use job_tracker_core::ports::DatabaseService;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
}
