pub mod api;
pub mod ws;

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::handlers;
use crate::state::AppState;

/// The full application: health check, session views and the audio socket.
pub fn create_app(state: Arc<AppState>) -> Router {
    let public_routes = Router::new().route("/", get(handlers::api::health_check));

    public_routes
        .merge(api::create_api_router())
        .merge(ws::create_ws_router())
        .with_state(state)
}
