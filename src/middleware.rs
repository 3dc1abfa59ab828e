//! Request validation middleware for axum routers.
//!
//! Buffers the request body, normalizes the request, and validates it before
//! the handler runs. Accepted requests carry a [`ValidatedRequest`] in their
//! extensions; rejected requests never reach the handler.

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use crate::api_validator::ValidatedRequest;
use crate::classify::classify;
use crate::config::OpenApiConfig;
use crate::engine::OpenApiValidator;
use crate::error::{BodyError, OpenApiError};
use crate::request::CanonicalRequest;

/// Builds the response sent for a rejected request.
pub trait ErrorResponder: Send + Sync {
    fn respond(&self, status: StatusCode, error: &OpenApiError) -> Response;
}

/// Replies with the bare status code and an empty body.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResponder;

impl ErrorResponder for EmptyResponder {
    fn respond(&self, status: StatusCode, _error: &OpenApiError) -> Response {
        status.into_response()
    }
}

/// State for [`validate_openapi_request`].
#[derive(Clone)]
pub struct OpenApiState {
    validator: OpenApiValidator,
    responder: Arc<dyn ErrorResponder>,
    body_limit: usize,
}

impl OpenApiState {
    pub fn new(config: &OpenApiConfig) -> Result<Self, OpenApiError> {
        let validator = OpenApiValidator::new(config)?;
        Ok(Self::from_validator(validator, config.body_limit()))
    }

    pub fn from_validator(validator: OpenApiValidator, body_limit: usize) -> Self {
        Self {
            validator,
            responder: Arc::new(EmptyResponder),
            body_limit,
        }
    }

    pub fn with_responder(mut self, responder: impl ErrorResponder + 'static) -> Self {
        self.responder = Arc::new(responder);
        self
    }

    pub fn validator(&self) -> &OpenApiValidator {
        &self.validator
    }
}

/// Middleware validating every request against the OpenAPI document.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn validate_openapi_request(
    State(state): State<OpenApiState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let (parts, body) = request.into_parts();
    let result = match axum::body::to_bytes(body, state.body_limit).await {
        Ok(bytes) => validate(&state, &parts, bytes),
        Err(e) => Err(OpenApiError::Body(BodyError::Unreadable(e.to_string()))),
    };

    match result {
        Ok((validated, bytes)) => {
            debug!(%method, %path, "request accepted");
            let mut request = Request::from_parts(parts, Body::from(bytes));
            request.extensions_mut().insert(validated);
            next.run(request).await
        }
        Err(error) => {
            let status = classify(&error);
            debug!(%method, %path, status = status.as_u16(), error = %error, "request rejected");
            state.responder.respond(status, &error)
        }
    }
}

fn validate(
    state: &OpenApiState,
    parts: &axum::http::request::Parts,
    bytes: bytes::Bytes,
) -> Result<(ValidatedRequest, bytes::Bytes), OpenApiError> {
    let canonical = CanonicalRequest::from_parts(parts, bytes.clone());
    let validated = state.validator.validate_request(&canonical)?;
    Ok((validated, bytes))
}
