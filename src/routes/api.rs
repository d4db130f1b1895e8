use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::api;
use crate::state::AppState;
use std::sync::Arc;

/// Read-only views of session snapshots
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions/{id}/form-data", get(api::get_form_data))
        .route("/sessions/{id}/conversation", get(api::get_conversation))
        .layer(TraceLayer::new_for_http())
}
