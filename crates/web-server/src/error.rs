use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::EngineError;
use narrator::NarratorError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Missing or invalid owner: {0}")]
    Unauthorized(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Converts `AppError` into an HTTP response.
///
/// Caller mistakes are echoed back; internal failures are logged and answered
/// with a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Engine(err) => match err {
                EngineError::TradeNotFound(_) | EngineError::ReportNotFound(_) => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                EngineError::InvalidTrade(_)
                | EngineError::InvalidRequest(_)
                | EngineError::Analytics(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                EngineError::Narrator(NarratorError::NotConfigured) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Report generation is not configured".to_string(),
                ),
                EngineError::Narrator(narrator_err) => {
                    tracing::error!(error = ?narrator_err, "Narrative generation error.");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "The report could not be generated".to_string(),
                    )
                }
                EngineError::Database(db_err) => {
                    tracing::error!(error = ?db_err, "Database error.");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal database error occurred".to_string(),
                    )
                }
            },
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
