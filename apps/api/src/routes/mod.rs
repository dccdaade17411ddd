pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::generation::handlers as generation;
use crate::prospects::handlers as prospects;
use crate::state::AppState;

/// Uploaded research PDFs may exceed axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Outreach API
        .route(
            "/api/v1/outreach/options",
            get(generation::handle_options),
        )
        .route(
            "/api/v1/outreach/generate",
            post(generation::handle_generate).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // Prospect Log API
        .route(
            "/api/v1/prospects",
            get(prospects::handle_list).delete(prospects::handle_clear),
        )
        .route(
            "/api/v1/prospects/export.csv",
            get(prospects::handle_export_csv),
        )
        .route(
            "/api/v1/prospects/export.json",
            get(prospects::handle_export_json),
        )
        .with_state(state)
}
