use crate::validators::ParameterLocation;
use crate::violation::SchemaViolation;
use thiserror::Error;

/// Boxed error returned by user supplied formatters and deserializers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every failure the validation engine can report.
#[derive(Error, Debug)]
pub enum OpenApiError {
    #[error("No path in the specification matches '{path}'")]
    PathNotFound { path: String },

    #[error("Operation '{method}' is not defined for path '{path}'")]
    OperationNotFound { path: String, method: String },

    #[error("Malformed request: {0}")]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error("Invalid request body: {0}")]
    Body(#[from] BodyError),

    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error("Invalid response: {0}")]
    Response(#[from] ResponseError),

    #[error("Failed to load OpenAPI spec: {0}")]
    SpecLoad(String),

    #[error("Failed to compile JSON schema: {0}")]
    SchemaCompilation(String),

    #[error("Validation engine failure: {0}")]
    Engine(String),

    /// A response that passed validation but carries a 4xx or 5xx status.
    #[error("Request failed with status {0}")]
    HttpStatus(u16),
}

#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("Required {location} parameter '{name}' is missing")]
    MissingRequired {
        location: ParameterLocation,
        name: String,
    },

    #[error("Invalid {location} parameter '{name}': {}", join_violations(.violations))]
    Invalid {
        location: ParameterLocation,
        name: String,
        violations: Vec<SchemaViolation>,
    },

    #[error("Failed to unmarshal {location} parameter '{name}': {message}")]
    Unmarshal {
        location: ParameterLocation,
        name: String,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum BodyError {
    #[error("Request body is required but was not provided")]
    Missing,

    #[error("Media type '{mimetype}' is not declared (expected one of: {})", .declared.join(", "))]
    MediaTypeNotFound {
        mimetype: String,
        declared: Vec<String>,
    },

    #[error("Failed to deserialize '{mimetype}' body: {message}")]
    Deserialize { mimetype: String, message: String },

    #[error("{}", join_violations(.0))]
    Schema(Vec<SchemaViolation>),

    #[error("Failed to read body: {0}")]
    Unreadable(String),
}

#[derive(Error, Debug)]
pub enum SecurityError {
    #[error("No security requirement satisfied (schemes: {})", .schemes.join(", "))]
    Unsatisfied { schemes: Vec<String> },
}

#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("No response defined for status code {0}")]
    NotFound(u16),

    #[error("Required response header '{0}' is missing")]
    MissingHeader(String),

    #[error("Invalid response header '{name}': {}", join_violations(.violations))]
    InvalidHeader {
        name: String,
        violations: Vec<SchemaViolation>,
    },

    #[error("{0}")]
    Body(BodyError),
}

/// Failures while turning a framework request/response into a canonical record.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error(transparent)]
    Mimetype(#[from] MimetypeError),

    #[error("Malformed Cookie header: {0}")]
    MalformedCookie(String),

    #[error("Failed to rebuild request: {0}")]
    Rebuild(#[from] http::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MimetypeError {
    #[error("Invalid media type '{value}': {reason}")]
    Invalid { value: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No OpenAPI specification was provided")]
    SpecNotProvided,
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
