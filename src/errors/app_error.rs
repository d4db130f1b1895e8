use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Errors returned by the HTTP handlers.
///
/// The detail string is logged; clients only see the generic message for the
/// status code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    InternalServerError(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            AppError::InternalServerError(_) => "Internal server error",
            AppError::BadRequest(_) => "Bad request",
            AppError::NotFound(_) => "Resource not found",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }

        let body = Json(json!({
            "error": self.public_message(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
