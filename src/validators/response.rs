use crate::error::ResponseError;
use crate::response::OpenApiResponse;
use crate::validation_helpers::CompiledSchema;
use crate::validators::content::ContentValidator;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;

/// Typed values of a validated response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedResponse {
    pub headers: IndexMap<String, Value>,
    pub body: Option<Value>,
}

/// A header declared on a response.
pub struct ResponseHeaderValidator {
    name: String,
    required: bool,
    schema: CompiledSchema,
}

impl ResponseHeaderValidator {
    pub fn new(name: String, required: bool, schema: CompiledSchema) -> Self {
        Self {
            name,
            required,
            schema,
        }
    }
}

/// What one response entry (a status code, a range, or `default`) declares.
pub struct ResponseSpec {
    headers: Vec<ResponseHeaderValidator>,
    content: ContentValidator,
}

impl ResponseSpec {
    pub fn new(headers: Vec<ResponseHeaderValidator>, content: ContentValidator) -> Self {
        Self { headers, content }
    }

    fn validate(&self, response: &dyn OpenApiResponse) -> Result<ValidatedResponse, ResponseError> {
        let mut validated = ValidatedResponse::default();

        for header in &self.headers {
            let raw: Vec<String> = response
                .headers()
                .get_all(header.name.as_str())
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            if raw.is_empty() {
                if header.required {
                    return Err(ResponseError::MissingHeader(header.name.clone()));
                }
                continue;
            }

            let value = header.schema.coerce(&raw);
            header
                .schema
                .validate(&value, &format!("header.{}", header.name))
                .map_err(|violations| ResponseError::InvalidHeader {
                    name: header.name.clone(),
                    violations,
                })?;
            validated.headers.insert(header.name.clone(), value);
        }

        if !self.content.is_empty() && !response.body().is_empty() {
            let body = self
                .content
                .validate(response.mimetype(), response.body(), "body")
                .map_err(ResponseError::Body)?;
            validated.body = Some(body);
        }

        Ok(validated)
    }
}

/// Validator for responses, keyed by status code
pub struct ResponseValidator {
    exact: HashMap<u16, ResponseSpec>,
    ranges: HashMap<u16, ResponseSpec>,
    default: Option<ResponseSpec>,
}

impl ResponseValidator {
    /// Create a new empty ResponseValidator
    pub fn new() -> Self {
        Self {
            exact: HashMap::new(),
            ranges: HashMap::new(),
            default: None,
        }
    }

    /// Adds the response for a specific status code
    pub fn add_response(&mut self, status_code: u16, spec: ResponseSpec) {
        self.exact.insert(status_code, spec);
    }

    /// Adds the response for a status class, `2` for `2XX`
    pub fn add_range(&mut self, class: u16, spec: ResponseSpec) {
        self.ranges.insert(class, spec);
    }

    /// Sets default response for unmatched status codes
    pub fn set_default(&mut self, spec: ResponseSpec) {
        self.default = Some(spec);
    }

    /// Validates a response against the entry for its status code
    pub fn validate(&self, response: &dyn OpenApiResponse) -> Result<ValidatedResponse, ResponseError> {
        let status_code = response.status().as_u16();
        // Exact code first, then its range, then default
        let spec = self
            .exact
            .get(&status_code)
            .or_else(|| self.ranges.get(&(status_code / 100)))
            .or(self.default.as_ref())
            .ok_or(ResponseError::NotFound(status_code))?;

        spec.validate(response)
    }
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self::new()
    }
}
