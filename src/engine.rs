//! Validation façade over a compiled OpenAPI document.

use crate::api_validator::ValidatedRequest;
use crate::config::OpenApiConfig;
use crate::error::OpenApiError;
use crate::request::{CanonicalRequest, OpenApiRequest};
use crate::response::{CanonicalResponse, OpenApiResponse};
use crate::spec::build_api_validator;
use crate::validators::ValidatedResponse;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Something that checks requests and responses against a document.
///
/// [`ApiValidator`](crate::ApiValidator) is the built-in implementation.
pub trait ValidationEngine: Send + Sync {
    fn validate_request(&self, request: &dyn OpenApiRequest) -> Result<ValidatedRequest, OpenApiError>;

    fn validate_response(
        &self,
        request: &dyn OpenApiRequest,
        response: &dyn OpenApiResponse,
    ) -> Result<ValidatedResponse, OpenApiError>;
}

/// Shared entry point used by the middleware and the test client.
///
/// Compiles the document once; clones share the compiled engine. Errors from
/// the engine are returned as they are.
#[derive(Clone)]
pub struct OpenApiValidator {
    engine: Arc<dyn ValidationEngine>,
}

impl OpenApiValidator {
    pub fn new(config: &OpenApiConfig) -> Result<Self, OpenApiError> {
        let api_validator = build_api_validator(config.spec(), config.extensions())?;
        info!(
            title = %config.spec().info.title,
            paths = config.spec().paths.paths.len(),
            "compiled openapi document"
        );
        Ok(Self::with_engine(Arc::new(api_validator)))
    }

    pub fn with_engine(engine: Arc<dyn ValidationEngine>) -> Self {
        Self { engine }
    }

    pub fn validate_request(&self, request: &CanonicalRequest) -> Result<ValidatedRequest, OpenApiError> {
        self.engine.validate_request(request)
    }

    pub fn validate_response(
        &self,
        request: &CanonicalRequest,
        response: &CanonicalResponse,
    ) -> Result<ValidatedResponse, OpenApiError> {
        self.engine.validate_response(request, response)
    }
}

impl fmt::Debug for OpenApiValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenApiValidator").finish_non_exhaustive()
    }
}
