//! Shared application state injected into every Axum handler.

use std::sync::Arc;

/// Application state shared across all request handlers.
///
/// Read-only after startup and cheaply cloneable, so Axum can clone it for
/// each request without copying.
#[derive(Clone)]
pub struct AppState {
    /// Greeting prefix substituted into every response (e.g. `"Hey"`).
    pub greeting: Arc<str>,
}

impl AppState {
    /// Create a new [`AppState`] with the configured greeting prefix.
    pub fn new(greeting: &str) -> Self {
        Self {
            greeting: Arc::from(greeting),
        }
    }
}
