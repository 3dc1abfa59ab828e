use crate::error::{NormalizeError, OpenApiError, ParameterError};
use crate::request::OpenApiRequest;
use crate::validation_helpers::CompiledSchema;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::fmt;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed parameter values, keyed by parameter name per location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterValues {
    pub path: IndexMap<String, Value>,
    pub query: IndexMap<String, Value>,
    pub header: IndexMap<String, Value>,
    pub cookie: IndexMap<String, Value>,
}

impl ParameterValues {
    fn slot(&mut self, location: ParameterLocation) -> &mut IndexMap<String, Value> {
        match location {
            ParameterLocation::Path => &mut self.path,
            ParameterLocation::Query => &mut self.query,
            ParameterLocation::Header => &mut self.header,
            ParameterLocation::Cookie => &mut self.cookie,
        }
    }
}

/// Validator for a single parameter
pub struct ParameterValidator {
    name: String,
    location: ParameterLocation,
    required: bool,
    schema: CompiledSchema,
    json_content: bool,
}

impl ParameterValidator {
    pub fn new(name: String, location: ParameterLocation, required: bool, schema: CompiledSchema) -> Self {
        Self {
            name,
            location,
            required,
            schema,
            json_content: false,
        }
    }

    /// Parameters declared through `content` carry a JSON encoded value.
    pub fn with_json_content(mut self) -> Self {
        self.json_content = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> ParameterLocation {
        self.location
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Coerces, validates and unmarshals the raw values of this parameter
    pub fn validate(&self, raw: &[String]) -> Result<Value, ParameterError> {
        let value = match raw.first() {
            Some(first) if self.json_content => {
                serde_json::from_str(first).unwrap_or_else(|_| Value::String(first.clone()))
            }
            _ => self.schema.coerce(raw),
        };

        self.schema
            .validate(&value, &format!("{}.{}", self.location, self.name))
            .map_err(|violations| ParameterError::Invalid {
                location: self.location,
                name: self.name.clone(),
                violations,
            })?;

        self.schema.unmarshal(value).map_err(|e| ParameterError::Unmarshal {
            location: self.location,
            name: self.name.clone(),
            message: e.to_string(),
        })
    }

    fn raw_values(
        &self,
        request: &dyn OpenApiRequest,
        path_params: &IndexMap<String, String>,
    ) -> Result<Option<Vec<String>>, NormalizeError> {
        let values = match self.location {
            ParameterLocation::Path => path_params
                .get(&self.name)
                .map(|v| vec![percent_decode_str(v).decode_utf8_lossy().into_owned()]),
            ParameterLocation::Query => request.query().get(&self.name).cloned(),
            ParameterLocation::Header => Some(
                request
                    .headers()
                    .get_all(self.name.as_str())
                    .iter()
                    .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                    .collect(),
            ),
            ParameterLocation::Cookie => request.cookies()?.get(&self.name).map(|v| vec![v.clone()]),
        };
        Ok(values.filter(|values| !values.is_empty()))
    }
}

/// Validator for all parameters of an operation
#[derive(Default)]
pub struct ParametersValidator {
    parameters: Vec<ParameterValidator>,
}

impl ParametersValidator {
    /// Create a new empty ParametersValidator
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, replacing an earlier one with the same name and location
    pub fn add_parameter(&mut self, validator: ParameterValidator) {
        self.parameters
            .retain(|p| !(p.name == validator.name && p.location == validator.location));
        self.parameters.push(validator);
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Validates every declared parameter, stopping at the first failure.
    ///
    /// The Cookie header is only parsed when a cookie parameter is declared.
    pub fn validate(
        &self,
        request: &dyn OpenApiRequest,
        path_params: &IndexMap<String, String>,
    ) -> Result<ParameterValues, OpenApiError> {
        let mut values = ParameterValues::default();
        for validator in &self.parameters {
            match validator.raw_values(request, path_params)? {
                Some(raw) => {
                    let value = validator.validate(&raw)?;
                    values.slot(validator.location).insert(validator.name.clone(), value);
                }
                None if validator.required => {
                    return Err(ParameterError::MissingRequired {
                        location: validator.location,
                        name: validator.name.clone(),
                    }
                    .into());
                }
                None => {}
            }
        }
        Ok(values)
    }
}
