// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::exam::ExamMode;

/// Stage of `submit_results` persistence that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceStage {
    /// Attempt summary row. Fatal for the submission.
    Summary,
    /// Per-question answer log. Logged and skipped.
    AnswerLog,
    /// Per-node score read or upsert. Logged and skipped.
    ScoreUpdate,
}

impl std::fmt::Display for PersistenceStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            PersistenceStage::Summary => "summary",
            PersistenceStage::AnswerLog => "answer-log",
            PersistenceStage::ScoreUpdate => "score-update",
        };
        f.write_str(stage)
    }
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    // 401 Unauthorized
    #[error("Not authenticated. Please sign in again.")]
    Unauthenticated,

    // 422 Unprocessable Entity
    #[error("No nodes match the criteria of exam mode \"{0}\". Try another mode.")]
    NoEligibleNodes(ExamMode),

    // 502 Bad Gateway
    #[error("Content generation failed: {0}")]
    UpstreamCallFailed(String),

    // 502 Bad Gateway
    #[error("Malformed AI response. Please try again.")]
    MalformedUpstreamResponse(String),

    // 502 Bad Gateway
    #[error("Invalid response structure: {0}")]
    InvalidResponseStructure(String),

    // 400 Bad Request
    #[error("Answer count ({actual}) does not match question count ({expected})")]
    AnswerCountMismatch { expected: usize, actual: usize },

    // 500 Internal Server Error
    #[error("Failed to save exam results ({stage}). Please retry.")]
    Persistence {
        stage: PersistenceStage,
        message: String,
    },

    #[error("Missing configuration: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    // 409 Conflict (e.g. session already completed)
    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NoEligibleNodes(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UpstreamCallFailed(_)
            | AppError::MalformedUpstreamResponse(_)
            | AppError::InvalidResponseStructure(_) => StatusCode::BAD_GATEWAY,
            AppError::AnswerCountMismatch { .. } | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Persistence { .. }
            | AppError::Config(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AppError::Config(_) | AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!("Internal Server Error: {}", self);
                "Internal Server Error".to_string()
            }
            AppError::Persistence { stage, message } => {
                tracing::error!(stage = %stage, "Failed to persist exam results: {}", message);
                self.to_string()
            }
            AppError::MalformedUpstreamResponse(raw) => {
                tracing::warn!("Discarding malformed AI response: {}", raw);
                self.to_string()
            }
            _ => self.to_string(),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::Database`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
