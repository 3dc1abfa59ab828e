//! Maps validation errors to HTTP status codes.

use crate::error::{BodyError, OpenApiError};
use http::StatusCode;
use tracing::error;

/// Error categories with a fixed HTTP meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PathNotFound,
    OperationNotFound,
    BadRequest,
    Security,
    MediaTypeNotFound,
    Unclassified,
}

impl ErrorKind {
    /// Category of an error, looking one level into body errors.
    pub fn of(error: &OpenApiError) -> Self {
        match error {
            OpenApiError::PathNotFound { .. } => Self::PathNotFound,
            OpenApiError::OperationNotFound { .. } => Self::OperationNotFound,
            OpenApiError::Security(_) => Self::Security,
            OpenApiError::Body(BodyError::MediaTypeNotFound { .. }) => Self::MediaTypeNotFound,
            OpenApiError::Body(_) | OpenApiError::Parameter(_) | OpenApiError::Normalize(_) => {
                Self::BadRequest
            }
            OpenApiError::Response(_)
            | OpenApiError::SpecLoad(_)
            | OpenApiError::SchemaCompilation(_)
            | OpenApiError::Engine(_)
            | OpenApiError::HttpStatus(_) => Self::Unclassified,
        }
    }
}

pub static STATUS_TABLE: [(ErrorKind, StatusCode); 6] = [
    (ErrorKind::PathNotFound, StatusCode::NOT_FOUND),
    (ErrorKind::OperationNotFound, StatusCode::METHOD_NOT_ALLOWED),
    (ErrorKind::BadRequest, StatusCode::BAD_REQUEST),
    (ErrorKind::Security, StatusCode::UNAUTHORIZED),
    (ErrorKind::MediaTypeNotFound, StatusCode::UNSUPPORTED_MEDIA_TYPE),
    (ErrorKind::Unclassified, StatusCode::INTERNAL_SERVER_ERROR),
];

pub fn status_for(kind: ErrorKind) -> StatusCode {
    STATUS_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, status)| *status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Status code for a validation error. Unclassified errors are logged.
pub fn classify(err: &OpenApiError) -> StatusCode {
    let kind = ErrorKind::of(err);
    if kind == ErrorKind::Unclassified {
        error!(error = %err, "unexpected openapi validation error");
    }
    status_for(kind)
}
