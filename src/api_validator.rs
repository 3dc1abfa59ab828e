use crate::engine::ValidationEngine;
use crate::error::OpenApiError;
use crate::request::OpenApiRequest;
use crate::response::OpenApiResponse;
use crate::validators::{
    ParameterValues, ParametersValidator, RequestBodyValidator, ResponseValidator,
    SecurityValidator, ValidatedResponse,
};
use indexmap::IndexMap;
use matchit::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// HTTP methods supported by OpenAPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
    TRACE,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GET => "get",
            Self::POST => "post",
            Self::PUT => "put",
            Self::DELETE => "delete",
            Self::PATCH => "patch",
            Self::HEAD => "head",
            Self::OPTIONS => "options",
            Self::TRACE => "trace",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = OpenApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::GET),
            "post" => Ok(Self::POST),
            "put" => Ok(Self::PUT),
            "delete" => Ok(Self::DELETE),
            "patch" => Ok(Self::PATCH),
            "head" => Ok(Self::HEAD),
            "options" => Ok(Self::OPTIONS),
            "trace" => Ok(Self::TRACE),
            _ => Err(OpenApiError::SchemaCompilation(format!(
                "Unknown HTTP method: {}",
                s
            ))),
        }
    }
}

/// Typed values of an accepted request, handed to downstream handlers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedRequest {
    pub parameters: ParameterValues,
    pub body: Option<Value>,
}

/// Validator for a single API operation (path + method combination)
pub struct OperationValidator {
    pub security: SecurityValidator,
    pub parameters: ParametersValidator,
    pub request_body: Option<RequestBodyValidator>,
    pub responses: ResponseValidator,
}

impl OperationValidator {
    pub fn new(
        security: SecurityValidator,
        parameters: ParametersValidator,
        request_body: Option<RequestBodyValidator>,
        responses: ResponseValidator,
    ) -> Self {
        Self {
            security,
            parameters,
            request_body,
            responses,
        }
    }

    /// Security, then parameters, then body; the first failure wins
    pub fn validate_request(
        &self,
        request: &dyn OpenApiRequest,
        path_params: &IndexMap<String, String>,
    ) -> Result<ValidatedRequest, OpenApiError> {
        self.security.validate(request)?;
        let parameters = self.parameters.validate(request, path_params)?;
        let body = match &self.request_body {
            Some(validator) => validator.validate(request)?,
            None => None,
        };
        Ok(ValidatedRequest { parameters, body })
    }
}

/// Map of HTTP methods to their operation validators
type OperationMap = HashMap<HttpMethod, OperationValidator>;

/// Compiled form of an OpenAPI document; the crate's validation engine
pub struct ApiValidator {
    router: Router<OperationMap>,
}

impl ApiValidator {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Adds all operations for a path at once
    pub fn add_path_operations(
        &mut self,
        path: &str,
        operations: OperationMap,
    ) -> Result<(), OpenApiError> {
        self.router.insert(path, operations).map_err(|e| {
            OpenApiError::SchemaCompilation(format!("Failed to add route '{}': {}", path, e))
        })
    }

    /// Finds the operation for a path and method, with the matched path parameters
    pub fn find_operation(
        &self,
        path: &str,
        method: &str,
    ) -> Result<(&OperationValidator, IndexMap<String, String>), OpenApiError> {
        let matched = self.router.at(path).map_err(|_| OpenApiError::PathNotFound {
            path: path.to_string(),
        })?;

        let not_found = || OpenApiError::OperationNotFound {
            path: path.to_string(),
            method: method.to_string(),
        };
        let method = HttpMethod::from_str(method).map_err(|_| not_found())?;
        let operation = matched.value.get(&method).ok_or_else(not_found)?;

        let params = matched
            .params
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Ok((operation, params))
    }
}

impl Default for ApiValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine for ApiValidator {
    fn validate_request(&self, request: &dyn OpenApiRequest) -> Result<ValidatedRequest, OpenApiError> {
        let (operation, path_params) = self.find_operation(request.path(), request.method())?;
        operation.validate_request(request, &path_params)
    }

    fn validate_response(
        &self,
        request: &dyn OpenApiRequest,
        response: &dyn OpenApiResponse,
    ) -> Result<ValidatedResponse, OpenApiError> {
        let (operation, _) = self.find_operation(request.path(), request.method())?;
        Ok(operation.responses.validate(response)?)
    }
}
