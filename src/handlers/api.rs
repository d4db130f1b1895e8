use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};

use crate::core::dialogue::ConversationEntry;
use crate::core::session::SessionSnapshot;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Health check handler
/// Returns a simple JSON response indicating the server is running
pub async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "OK"
    })))
}

fn find_session(state: &AppState, session_id: &str) -> AppResult<SessionSnapshot> {
    state
        .archive()
        .get(session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))
}

/// Form fields collected so far in a session; unfilled fields are `null`.
pub async fn get_form_data(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> AppResult<Json<BTreeMap<String, Option<String>>>> {
    Ok(Json(find_session(&state, &session_id)?.form_fields))
}

/// The session's conversation log, oldest entry first.
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> AppResult<Json<Vec<ConversationEntry>>> {
    Ok(Json(find_session(&state, &session_id)?.conversation))
}
