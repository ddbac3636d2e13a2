use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failure of an endpoint that must report it instead of degrading.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not Found")]
    NotFound,

    /// Missing server-side secret or credential.
    #[error("{0}")]
    Configuration(String),

    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Configuration(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Configuration(message) => {
                tracing::error!(%message, "server is not configured");
                Self::Configuration(message)
            }
            Error::Unauthorized => Self::Unauthorized,
            Error::NotFound(_) => Self::NotFound,
            other => {
                tracing::warn!(error = %other, "backing store request failed");
                Self::Internal {
                    message: "Backing store error".into(),
                    details: Some(other.to_string()),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::Internal { message, details } => ErrorResponse { message, details },
            other => ErrorResponse {
                message: other.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
