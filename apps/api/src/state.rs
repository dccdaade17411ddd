use std::sync::Arc;

use crate::generation::generator::OutreachGenerator;
use crate::prospects::sessions::SessionStore;
use crate::rate_limit::RateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Ingestor, completion client, template and annotator, wired once at startup.
    pub generator: Arc<OutreachGenerator>,
    /// One prospect log per session. Nothing is shared between sessions.
    pub sessions: Arc<SessionStore>,
    pub rate_limiter: Arc<RateLimiter>,
}
