use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use thiserror::Error;
use tracing::{error, warn};

/// Failure of an API request, tagged by who is at fault.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Auth,
    #[error("{0}")]
    Validation(String),
    #[error("File exceeds the upload limit")]
    PayloadTooLarge,
    #[error("Error: {0:#}")]
    Unexpected(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        match &self {
            Self::Unexpected(e) => error!("Request failed: {:?}", e),
            _ => warn!("Request rejected ({}): {}", status.as_u16(), message),
        }
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
