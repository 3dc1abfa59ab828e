pub mod api_validator;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod mimetype;
pub mod request;
pub mod response;
pub mod spec;
pub mod testing;
pub mod validation_helpers;
pub mod validators;
pub mod violation;

pub use api_validator::{ApiValidator, HttpMethod, OperationValidator, ValidatedRequest};
pub use classify::{classify, status_for, ErrorKind, STATUS_TABLE};
pub use config::{Deserializer, Extensions, Formatter, OpenApiConfig, OpenApiConfigBuilder, DEFAULT_BODY_LIMIT};
pub use engine::{OpenApiValidator, ValidationEngine};
pub use error::{
    BodyError, BoxError, ConfigError, MimetypeError, NormalizeError, OpenApiError, ParameterError,
    ResponseError, SecurityError,
};
pub use middleware::{validate_openapi_request, EmptyResponder, ErrorResponder, OpenApiState};
pub use mimetype::{normalize_mimetype, DEFAULT_REQUEST_MIMETYPE, DEFAULT_RESPONSE_MIMETYPE};
pub use request::{CanonicalRequest, MultiMap, OpenApiRequest};
pub use response::{CanonicalResponse, OpenApiResponse};
pub use spec::{build_api_validator, load_openapi_spec, openapi_from_value, parse_openapi_spec, ResolveReference};
pub use testing::OpenApiTestClient;
pub use validators::{ParameterLocation, ParameterValues, ValidatedResponse};
pub use violation::{SchemaViolation, ViolationKind};
