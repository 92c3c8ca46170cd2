use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RiskError>;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("invalid student '{id}': {reason}")]
    InvalidStudent { id: String, reason: String },

    #[error("cannot fit a scaler on an empty feature matrix")]
    EmptyFeatures,

    #[error("clustering failed: {0}")]
    Clustering(String),

    #[error("invalid request body: {0}")]
    InvalidPayload(String),

    #[error("analysis worker failed: {0}")]
    Worker(String),

    #[error("student not found: {0}")]
    StudentNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("malformed student csv: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ResponseError for RiskError {
    fn status_code(&self) -> StatusCode {
        match self {
            RiskError::InvalidStudent { .. } | RiskError::InvalidPayload(_) | RiskError::Csv(_) => {
                StatusCode::BAD_REQUEST
            }
            RiskError::StudentNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(json!({ "error": message }))
    }
}
