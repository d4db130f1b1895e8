use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::ws;
use crate::state::AppState;
use std::sync::Arc;

/// Create the WebSocket router
///
/// `/ws/audio` is unauthenticated; deployments that need access control put
/// it behind a reverse proxy.
pub fn create_ws_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/audio", get(ws::ws_audio_handler))
        .layer(TraceLayer::new_for_http())
}
