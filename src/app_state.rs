//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::domain::Fanout;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Fanout that realtime sessions register with.
    pub fanout: Fanout,
    /// Static page locations and session keepalive settings.
    pub config: Arc<RelayConfig>,
}
