//! HTTP error mapping: every failure becomes `{"error": "..."}`.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use volkey_keys::{KeyError, Param};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Keys(#[from] KeyError),

    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Keys(KeyError::MissingParameter(_)) => StatusCode::BAD_REQUEST,
            ApiError::Keys(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Multipart(e) => e.status(),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Keys(KeyError::MissingParameter(Param::Password)) => {
                "Password is required to generate keys".into()
            }
            ApiError::Keys(KeyError::MissingParameter(Param::CipherMode)) => {
                "Cipher mode is required".into()
            }
            ApiError::Keys(KeyError::UnexpectedOutput(detail)) => {
                format!("Unexpected error: {detail}")
            }
            ApiError::Multipart(e) => e.body_text(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(status = %status, "{message}");
        } else {
            tracing::debug!(status = %status, "{message}");
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
