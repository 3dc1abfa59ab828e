use crate::config::{Deserializer, Extensions};
use crate::error::{BodyError, OpenApiError};
use crate::mimetype::{is_json, normalize_mimetype};
use crate::validation_helpers::{CompiledSchema, SchemaContext};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use url::form_urlencoded;

/// Validator for a `content` map: media types and their body schemas
pub struct ContentValidator {
    media_types: IndexMap<String, Option<CompiledSchema>>,
    deserializers: HashMap<String, Deserializer>,
}

impl ContentValidator {
    pub fn new(
        content: &openapiv3::Content,
        context: &SchemaContext,
        extensions: &Extensions,
        label: &str,
    ) -> Result<Self, OpenApiError> {
        let mut media_types = IndexMap::new();
        for (declared, media_type) in content {
            let key = normalize_mimetype(declared).unwrap_or_else(|_| declared.to_ascii_lowercase());
            let schema = match &media_type.schema {
                Some(schema_ref) => {
                    let schema_json = serde_json::to_value(schema_ref).map_err(|e| {
                        OpenApiError::SchemaCompilation(format!(
                            "Failed to convert {} schema to JSON: {}",
                            label, e
                        ))
                    })?;
                    Some(context.compile(&schema_json, &format!("{} ({})", label, key))?)
                }
                None => None,
            };
            media_types.insert(key, schema);
        }

        Ok(Self {
            media_types,
            deserializers: extensions.deserializers().clone(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.media_types.is_empty()
    }

    /// Declared entry for a mimetype: exact match, then `type/*`, then `*/*`
    fn lookup(&self, mimetype: &str) -> Option<&Option<CompiledSchema>> {
        if let Some(schema) = self.media_types.get(mimetype) {
            return Some(schema);
        }
        let wildcard = mimetype
            .split_once('/')
            .map(|(ty, _)| format!("{}/*", ty))
            .and_then(|range| self.media_types.get(&range));
        wildcard.or_else(|| self.media_types.get("*/*"))
    }

    fn lookup_declared(&self, mimetype: &str) -> Result<&Option<CompiledSchema>, BodyError> {
        self.lookup(mimetype).ok_or_else(|| BodyError::MediaTypeNotFound {
            mimetype: mimetype.to_string(),
            declared: self.media_types.keys().cloned().collect(),
        })
    }

    /// Fails with `MediaTypeNotFound` when no entry covers `mimetype`
    pub fn ensure_declared(&self, mimetype: &str) -> Result<(), BodyError> {
        self.lookup_declared(mimetype).map(|_| ())
    }

    /// Deserializes a body of the given mimetype and validates it against its schema
    pub fn validate(&self, mimetype: &str, body: &[u8], location: &str) -> Result<Value, BodyError> {
        let schema = self.lookup_declared(mimetype)?;

        let value = self.deserialize(mimetype, body, schema.as_ref())?;
        let Some(schema) = schema else {
            return Ok(value);
        };

        schema.validate(&value, location).map_err(BodyError::Schema)?;
        schema.unmarshal(value).map_err(|e| BodyError::Deserialize {
            mimetype: mimetype.to_string(),
            message: e.to_string(),
        })
    }

    fn deserialize(
        &self,
        mimetype: &str,
        body: &[u8],
        schema: Option<&CompiledSchema>,
    ) -> Result<Value, BodyError> {
        let failed = |message: String| BodyError::Deserialize {
            mimetype: mimetype.to_string(),
            message,
        };

        if let Some(deserializer) = self.deserializers.get(mimetype) {
            return deserializer(body).map_err(|e| failed(e.to_string()));
        }
        if is_json(mimetype) {
            return serde_json::from_slice(body).map_err(|e| failed(e.to_string()));
        }
        if mimetype == "application/x-www-form-urlencoded" {
            return Ok(deserialize_form(body, schema));
        }

        std::str::from_utf8(body)
            .map(|text| Value::String(text.to_string()))
            .map_err(|_| failed("no deserializer registered for binary content".to_string()))
    }
}

fn deserialize_form(body: &[u8], schema: Option<&CompiledSchema>) -> Value {
    let mut fields: IndexMap<String, Vec<String>> = IndexMap::new();
    for (key, value) in form_urlencoded::parse(body) {
        fields.entry(key.into_owned()).or_default().push(value.into_owned());
    }

    let object: Map<String, Value> = fields
        .into_iter()
        .map(|(name, raw)| {
            let value = match schema {
                Some(schema) => schema.coerce_property(&name, &raw),
                None if raw.len() == 1 => Value::String(raw[0].clone()),
                None => Value::Array(raw.into_iter().map(Value::String).collect()),
            };
            (name, value)
        })
        .collect();
    Value::Object(object)
}
