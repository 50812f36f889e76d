use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid scheduling window: {0}")]
    InvalidWindow(String),

    #[error("Capacity exceeded: at most {max} candidates fit this window")]
    CapacityExceeded { max: usize },

    #[error("Application {0} already has an active interview")]
    DuplicateAssignment(uuid::Uuid),

    #[error("Incomplete evaluation: {0}")]
    IncompleteEvaluation(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            Error::InvalidWindow(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Invalid scheduling window: {}", msg) }),
            ),
            Error::CapacityExceeded { max } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": format!("Capacity exceeded: at most {} candidates fit this window", max),
                    "max_assignable": max,
                }),
            ),
            Error::DuplicateAssignment(application_id) => (
                StatusCode::CONFLICT,
                json!({
                    "error": format!("Application {} already has an active interview", application_id),
                    "application_id": application_id,
                }),
            ),
            Error::IncompleteEvaluation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Incomplete evaluation: {}", msg) }),
            ),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::Json(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::Database(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string() }),
            ),
            Error::Anyhow(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg })),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "An unexpected error occurred" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
