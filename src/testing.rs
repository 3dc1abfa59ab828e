//! Test client that checks a router's responses against the document.

use axum::body::Body;
use axum::Router;
use bytes::Bytes;
use http::{Request, Response};
use tower::ServiceExt;
use tracing::debug;

use crate::config::OpenApiConfig;
use crate::engine::OpenApiValidator;
use crate::error::{BodyError, OpenApiError, ResponseError};
use crate::request::{CanonicalRequest, OpenApiRequest};
use crate::response::CanonicalResponse;

/// Sends requests through an axum router and validates what comes back.
///
/// Requests whose URI carries an explicit `http` or `https` scheme are
/// dispatched as they are, without response validation.
#[derive(Clone)]
pub struct OpenApiTestClient {
    router: Router,
    validator: OpenApiValidator,
    body_limit: usize,
}

impl OpenApiTestClient {
    pub fn new(router: Router, config: &OpenApiConfig) -> Result<Self, OpenApiError> {
        let validator = OpenApiValidator::new(config)?;
        Ok(Self::with_validator(router, validator, config.body_limit()))
    }

    pub fn with_validator(router: Router, validator: OpenApiValidator, body_limit: usize) -> Self {
        Self {
            router,
            validator,
            body_limit,
        }
    }

    pub async fn fetch(&self, request: Request<Bytes>) -> Result<Response<Bytes>, OpenApiError> {
        let passthrough = matches!(request.uri().scheme_str(), Some("http") | Some("https"));
        let canonical_request = if passthrough {
            None
        } else {
            Some(CanonicalRequest::from_request(&request))
        };

        let response = match self.router.clone().oneshot(request.map(Body::from)).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|e| ResponseError::Body(BodyError::Unreadable(e.to_string())))?;

        if let Some(canonical_request) = canonical_request {
            let canonical_response = CanonicalResponse::from_parts(&parts, bytes.clone())?;
            self.validator
                .validate_response(&canonical_request, &canonical_response)?;
            debug!(
                method = canonical_request.method(),
                path = canonical_request.path(),
                status = parts.status.as_u16(),
                "response accepted"
            );
        }

        Ok(Response::from_parts(parts, bytes))
    }

    /// Like [`fetch`](Self::fetch), then fails on a 4xx or 5xx status.
    ///
    /// Validation runs first, so a response outside the document is still
    /// reported as a validation error.
    pub async fn fetch_checked(&self, request: Request<Bytes>) -> Result<Response<Bytes>, OpenApiError> {
        let response = self.fetch(request).await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(OpenApiError::HttpStatus(status.as_u16()));
        }
        Ok(response)
    }
}
