use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Content-Length header is required")]
    LengthRequired,
    #[error("Not Found")]
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::LengthRequired => StatusCode::LENGTH_REQUIRED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = match self {
            ApiError::NotFound => "not_found_error",
            ApiError::InvalidJson(_) | ApiError::LengthRequired => "invalid_request_error",
        };

        let body = Json(serde_json::json!({
            "error": {
                "message": self.to_string(),
                "type": error_type,
                "status": status.as_u16()
            }
        }));

        (status, body).into_response()
    }
}

/// Failures that end an echo session early.
#[derive(Error, Debug)]
pub enum EchoError {
    #[error("failed to write frame: {0}")]
    Send(#[source] axum::Error),
    #[error("frame reader task failed: {0}")]
    Reader(#[from] tokio::task::JoinError),
}
