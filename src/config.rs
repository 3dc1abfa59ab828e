//! Validation configuration.
//!
//! The specification and its extensions are supplied explicitly through
//! [`OpenApiConfig`]; nothing is read from globals or shared defaults.

use crate::error::{BoxError, ConfigError};
use crate::mimetype::normalize_mimetype;
use openapiv3::OpenAPI;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Largest request body the middleware buffers before validating.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// A named string format (the `format` keyword) with custom semantics.
pub trait Formatter: Send + Sync {
    /// Whether `value` is a valid instance of the format.
    fn validate(&self, value: &str) -> bool;

    /// Converts a valid value into the form handlers receive.
    fn unmarshal(&self, value: &str) -> Result<Value, BoxError> {
        Ok(Value::String(value.to_string()))
    }
}

/// Converts a raw body of some media type into a JSON value.
pub type Deserializer = Arc<dyn Fn(&[u8]) -> Result<Value, BoxError> + Send + Sync>;

/// Custom formatters keyed by format name and deserializers keyed by media type.
#[derive(Clone, Default)]
pub struct Extensions {
    formatters: HashMap<String, Arc<dyn Formatter>>,
    deserializers: HashMap<String, Deserializer>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formatter(mut self, name: impl Into<String>, formatter: impl Formatter + 'static) -> Self {
        self.formatters.insert(name.into(), Arc::new(formatter));
        self
    }

    /// Registers a deserializer; the media type is normalized before use as a key.
    pub fn with_deserializer<F>(mut self, mimetype: &str, deserializer: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        let key = normalize_mimetype(mimetype).unwrap_or_else(|_| mimetype.to_ascii_lowercase());
        self.deserializers.insert(key, Arc::new(deserializer));
        self
    }

    pub fn formatters(&self) -> &HashMap<String, Arc<dyn Formatter>> {
        &self.formatters
    }

    pub fn deserializers(&self) -> &HashMap<String, Deserializer> {
        &self.deserializers
    }

    pub fn deserializer(&self, mimetype: &str) -> Option<&Deserializer> {
        self.deserializers.get(mimetype)
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("formatters", &self.formatters.keys().collect::<Vec<_>>())
            .field("deserializers", &self.deserializers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Everything needed to compile a validator.
#[derive(Debug, Clone)]
pub struct OpenApiConfig {
    spec: OpenAPI,
    extensions: Extensions,
    body_limit: usize,
}

impl OpenApiConfig {
    pub fn new(spec: OpenAPI) -> Self {
        Self {
            spec,
            extensions: Extensions::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn builder() -> OpenApiConfigBuilder {
        OpenApiConfigBuilder::default()
    }

    pub fn spec(&self) -> &OpenAPI {
        &self.spec
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn body_limit(&self) -> usize {
        self.body_limit
    }
}

#[derive(Debug, Default)]
pub struct OpenApiConfigBuilder {
    spec: Option<OpenAPI>,
    extensions: Extensions,
    body_limit: Option<usize>,
}

impl OpenApiConfigBuilder {
    pub fn spec(mut self, spec: OpenAPI) -> Self {
        self.spec = Some(spec);
        self
    }

    pub fn extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn formatter(mut self, name: impl Into<String>, formatter: impl Formatter + 'static) -> Self {
        self.extensions = self.extensions.with_formatter(name, formatter);
        self
    }

    pub fn deserializer<F>(mut self, mimetype: &str, deserializer: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.extensions = self.extensions.with_deserializer(mimetype, deserializer);
        self
    }

    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = Some(limit);
        self
    }

    /// Fails when no specification was supplied; there is no usable default.
    pub fn build(self) -> Result<OpenApiConfig, ConfigError> {
        let spec = self.spec.ok_or(ConfigError::SpecNotProvided)?;
        Ok(OpenApiConfig {
            spec,
            extensions: self.extensions,
            body_limit: self.body_limit.unwrap_or(DEFAULT_BODY_LIMIT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::parse_openapi_spec;

    struct Uppercase;

    impl Formatter for Uppercase {
        fn validate(&self, value: &str) -> bool {
            value.chars().all(|c| c.is_ascii_uppercase())
        }
    }

    fn minimal_spec() -> OpenAPI {
        parse_openapi_spec(
            r#"{"openapi": "3.0.0", "info": {"title": "t", "version": "1"}, "paths": {}}"#,
        )
        .unwrap()
    }

    #[test]
    fn spec_must_be_provided() {
        let result = OpenApiConfig::builder().build();
        assert!(matches!(result, Err(ConfigError::SpecNotProvided)));
    }

    #[test]
    fn extensions_default_to_empty() {
        let config = OpenApiConfig::builder().spec(minimal_spec()).build().unwrap();

        assert!(config.extensions().formatters().is_empty());
        assert!(config.extensions().deserializers().is_empty());
        assert_eq!(config.body_limit(), DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn deserializer_keys_are_normalized() {
        let config = OpenApiConfig::builder()
            .spec(minimal_spec())
            .formatter("upper", Uppercase)
            .deserializer("Application/Vnd.Thing+JSON; charset=utf-8", |bytes: &[u8]| {
                serde_json::from_slice(bytes).map_err(Into::into)
            })
            .body_limit(16)
            .build()
            .unwrap();

        assert!(config.extensions().deserializer("application/vnd.thing+json").is_some());
        assert!(config.extensions().formatters().contains_key("upper"));
        assert_eq!(config.body_limit(), 16);
    }

    #[test]
    fn default_unmarshal_keeps_the_string() {
        assert_eq!(Uppercase.unmarshal("ABC").unwrap(), Value::String("ABC".into()));
    }
}
