use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Request-time failures surfaced to HTTP clients.
///
/// Client-input problems map to 4xx statuses, upstream provider trouble to 5xx.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("unprocessable request: {0}")]
    Unprocessable(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("upstream provider unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("upstream provider rate limited: {0}")]
    UpstreamRateLimited(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn upstream<E: std::fmt::Display>(err: E) -> Self {
        ApiError::UpstreamUnavailable(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable(_) | ApiError::UpstreamRateLimited(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure came from a collaborator rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ApiError::UpstreamUnavailable(_) | ApiError::UpstreamRateLimited(_)
        )
    }

    /// Message safe to show clients. Upstream details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::UpstreamUnavailable(_) => {
                "Upstream service unavailable. Please try again.".to_string()
            }
            ApiError::UpstreamRateLimited(_) => {
                "Upstream service is busy. Please try again shortly.".to_string()
            }
            ApiError::Internal(_) => "Internal server error".to_string(),
            ApiError::BadRequest(msg)
            | ApiError::UnsupportedMediaType(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::Unprocessable(msg)
            | ApiError::ServiceUnavailable(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if self.is_upstream() || matches!(self, ApiError::Internal(_)) {
            tracing::error!("{}", self);
        }
        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}
