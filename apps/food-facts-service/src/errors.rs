use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use off_client::{ConfigError, OffError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Query(#[from] OffError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input/output error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Query(e) => {
                let status = match e {
                    OffError::Validation(_) => StatusCode::BAD_REQUEST,
                    OffError::NotFound(_) => StatusCode::NOT_FOUND,
                    OffError::Search(_) | OffError::Submission(_) => StatusCode::BAD_GATEWAY,
                    OffError::Config(_) | OffError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    error!("Query failed: {}", e);
                } else {
                    warn!("Query rejected: {}", e);
                }
                (status, e.user_message())
            }
            AppError::Config(e) => {
                error!("Configuration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server configuration error".to_string(),
                )
            }
            AppError::Io(e) => {
                error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal I/O error".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
