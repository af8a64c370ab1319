use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::hold::HoldError;
use service::jobs::JobError;
use thiserror::Error;
use tracing::error;

/// Error surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid or expired token")]
    Unauthorized,
    #[error("token is not valid for this organization")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Hold(#[from] HoldError),
    #[error("job queue error: {0}")]
    Job(#[from] JobError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JsonApiError {
    pub code: u16,
    pub error: String,
    /// Structured rule violation for rejected hold operations.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub rejection: Option<serde_json::Value>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingToken | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Hold(HoldError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Hold(HoldError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Hold(HoldError::Persistence(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Job(JobError::QueueClosed) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Job(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            ApiError::MissingToken => 1001,
            ApiError::Unauthorized => 1002,
            ApiError::Forbidden => 1003,
            ApiError::BadRequest(_) => 1004,
            ApiError::NotFound(_) => 2004,
            ApiError::Hold(e) => e.code(),
            ApiError::Job(_) => 3001,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, code = self.code(), "request failed");
        }
        let rejection = match &self {
            ApiError::Hold(HoldError::Rejected(r)) => serde_json::to_value(r).ok(),
            _ => None,
        };
        let body = JsonApiError { code: self.code(), error: self.to_string(), rejection };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::hold::Rejection;

    #[test]
    fn hold_errors_map_to_http_statuses() {
        let rejected = ApiError::from(HoldError::from(Rejection::NotStarted));
        assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(rejected.code(), 2001);
        assert_eq!(ApiError::from(HoldError::not_found("hold")).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(HoldError::Persistence("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::from(JobError::QueueClosed).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
    }
}
