//! API error type with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, Envelope, ErrorKind};

use crate::rbac::{Action, Resource};

/// A failed request, rendered as an [`Envelope`] carrying the request id.
#[derive(Debug)]
pub struct ApiError {
    pub api_id: String,
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(
        api_id: impl Into<String>,
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            api_id: api_id.into(),
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Maps a domain failure to its transport status.
    pub fn domain(api_id: impl Into<String>, err: DomainError) -> Self {
        let status = status_for(err.kind());
        if status.is_server_error() {
            tracing::error!(error = %err, code = err.code(), "request failed");
        }
        Self::new(api_id, status, err.code(), err.public_message())
    }

    pub fn bad_request(api_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(api_id, StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(api_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(api_id, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", message)
    }

    pub fn forbidden(api_id: impl Into<String>, resource: Resource, action: Action) -> Self {
        Self::new(
            api_id,
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            format!("Not allowed to {action} {resource}"),
        )
    }
}

/// Transport status for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Data => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: Envelope<()> = Envelope::failure(self.api_id, self.code, self.message);
        (self.status, Json(body)).into_response()
    }
}

/// Attaches the request id to a domain result.
pub trait ForRequest<T> {
    fn for_request(self, api_id: &str) -> Result<T, ApiError>;
}

impl<T> ForRequest<T> for Result<T, DomainError> {
    fn for_request(self, api_id: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::domain(api_id, e))
    }
}
