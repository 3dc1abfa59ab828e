use crate::config::Formatter;
use crate::error::{BoxError, OpenApiError};
use crate::violation::{map_violation_kind, SchemaViolation};
use jsonschema::{Registry, Resource, Validator};
use openapiv3::OpenAPI;
use serde_json::{json, Number, Value};
use std::collections::HashMap;
use std::sync::Arc;

const BASE_URI: &str = "urn:oas:spec";
const MAX_REF_HOPS: usize = 32;

/// Keywords whose value maps names to schemas.
const NAMED_SCHEMAS: &[&str] = &["properties", "patternProperties", "schemas", "$defs", "definitions"];
/// Keywords holding instance data rather than schemas.
const DATA_KEYWORDS: &[&str] = &["example", "examples", "enum", "default", "const"];

/// Shared state for compiling every schema of one specification.
///
/// Holds the JSON Schema registry used for schema-level `$ref`s and a copy of
/// the `components` section for coercion and unmarshaling.
pub struct SchemaContext {
    registry: Registry,
    document: Arc<Value>,
    formatters: HashMap<String, Arc<dyn Formatter>>,
}

impl SchemaContext {
    pub fn new(
        spec: &OpenAPI,
        formatters: &HashMap<String, Arc<dyn Formatter>>,
    ) -> Result<Self, OpenApiError> {
        let spec_json = serde_json::to_value(spec).map_err(|e| {
            OpenApiError::SchemaCompilation(format!("Failed to serialize spec to JSON: {}", e))
        })?;

        let components = spec_json
            .get("components")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));
        let document = json!({ "components": components });
        let mut registered = document.clone();
        rewrite_nullable(&mut registered);

        let resource = Resource::from_contents(registered).map_err(|e| {
            OpenApiError::SchemaCompilation(format!("Failed to create resource: {}", e))
        })?;
        let registry = Registry::try_new(BASE_URI, resource).map_err(|e| {
            OpenApiError::SchemaCompilation(format!("Failed to create registry: {}", e))
        })?;

        Ok(Self {
            registry,
            document: Arc::new(document),
            formatters: formatters.clone(),
        })
    }

    /// Compiles a schema, registering every custom format.
    pub fn compile(&self, schema: &Value, error_context: &str) -> Result<CompiledSchema, OpenApiError> {
        let mut options = jsonschema::options()
            .with_registry(self.registry.clone())
            .with_base_uri(BASE_URI.to_string())
            .should_validate_formats(true);
        for (name, formatter) in &self.formatters {
            let formatter = Arc::clone(formatter);
            options = options.with_format(name.clone(), move |value: &str| formatter.validate(value));
        }

        let mut validated = schema.clone();
        rewrite_nullable(&mut validated);
        let validator = options.build(&validated).map_err(|e| {
            OpenApiError::SchemaCompilation(format!(
                "Failed to compile schema for {}: {}",
                error_context, e
            ))
        })?;

        Ok(CompiledSchema {
            validator,
            schema: schema.clone(),
            document: Arc::clone(&self.document),
            formatters: self.formatters.clone(),
        })
    }
}

/// A compiled JSON schema plus what is needed to coerce and unmarshal values.
pub struct CompiledSchema {
    validator: Validator,
    schema: Value,
    document: Arc<Value>,
    formatters: HashMap<String, Arc<dyn Formatter>>,
}

impl CompiledSchema {
    /// Validates `value`, reporting every violation under `location`.
    pub fn validate(&self, value: &Value, location: &str) -> Result<(), Vec<SchemaViolation>> {
        if self.validator.is_valid(value) {
            return Ok(());
        }
        Err(self
            .validator
            .iter_errors(value)
            .map(|e| SchemaViolation {
                kind: map_violation_kind(&e.kind),
                location: format_instance_location(&e.instance_path.to_string(), location),
                message: e.to_string(),
            })
            .collect())
    }

    /// Converts raw string values into the type the schema declares.
    pub fn coerce(&self, raw: &[String]) -> Value {
        coerce_values(&self.schema, &self.document, raw)
    }

    /// Like [`coerce`](Self::coerce), for the named property of an object schema.
    pub fn coerce_property(&self, name: &str, raw: &[String]) -> Value {
        let schema = resolve(&self.schema, &self.document);
        match schema.get("properties").and_then(|p| p.get(name)) {
            Some(property) => coerce_values(property, &self.document, raw),
            None => coerce_values(&Value::Null, &self.document, raw),
        }
    }

    /// Replaces strings carrying a custom `format` with the formatter's output.
    pub fn unmarshal(&self, mut value: Value) -> Result<Value, BoxError> {
        if !self.formatters.is_empty() {
            self.apply_formats(&self.schema, &mut value, 0)?;
        }
        Ok(value)
    }

    fn apply_formats(&self, schema: &Value, value: &mut Value, depth: usize) -> Result<(), BoxError> {
        if depth > MAX_REF_HOPS {
            return Ok(());
        }
        let schema = resolve(schema, &self.document);

        if let Some(parts) = schema.get("allOf").and_then(Value::as_array) {
            for part in parts {
                self.apply_formats(part, value, depth + 1)?;
            }
        }

        match value {
            Value::String(text) => {
                let formatter = schema
                    .get("format")
                    .and_then(Value::as_str)
                    .and_then(|name| self.formatters.get(name));
                if let Some(formatter) = formatter {
                    *value = formatter.unmarshal(text)?;
                }
            }
            Value::Object(map) => {
                if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
                    for (name, item) in map.iter_mut() {
                        if let Some(property) = properties.get(name) {
                            self.apply_formats(property, item, depth + 1)?;
                        }
                    }
                }
            }
            Value::Array(items) => {
                if let Some(item_schema) = schema.get("items") {
                    for item in items.iter_mut() {
                        self.apply_formats(item_schema, item, depth + 1)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Turns OpenAPI 3.0 `nullable: true` into something JSON Schema understands.
///
/// A string `type` becomes `[type, "null"]`; a schema without one is wrapped
/// in `anyOf` with `{"type": "null"}`. The `nullable` keyword is removed.
pub fn rewrite_nullable(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if DATA_KEYWORDS.contains(&key.as_str()) {
                    continue;
                }
                match child {
                    Value::Object(named) if NAMED_SCHEMAS.contains(&key.as_str()) => {
                        named.values_mut().for_each(rewrite_nullable)
                    }
                    _ => rewrite_nullable(child),
                }
            }

            if map.remove("nullable") != Some(Value::Bool(true)) {
                return;
            }
            match map.get("type") {
                Some(Value::String(name)) => {
                    let union = json!([name, "null"]);
                    map.insert("type".to_string(), union);
                }
                Some(Value::Array(types)) => {
                    if !types.iter().any(|t| t == "null") {
                        let mut types = types.clone();
                        types.push(json!("null"));
                        map.insert("type".to_string(), Value::Array(types));
                    }
                }
                _ => {
                    let inner = Value::Object(std::mem::take(map));
                    map.insert("anyOf".to_string(), json!([inner, {"type": "null"}]));
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_nullable),
        _ => {}
    }
}

/// Follows local `#/components/...` references inside the components document.
fn resolve<'a>(schema: &'a Value, document: &'a Value) -> &'a Value {
    let mut current = schema;
    for _ in 0..MAX_REF_HOPS {
        let target = current
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|r| r.strip_prefix('#'))
            .and_then(|pointer| document.pointer(pointer));
        match target {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

fn schema_type(schema: &Value) -> Option<&str> {
    schema.get("type").and_then(Value::as_str)
}

fn coerce_values(schema: &Value, document: &Value, raw: &[String]) -> Value {
    let schema = resolve(schema, document);
    match schema_type(schema) {
        Some("array") => {
            let item_type = schema
                .get("items")
                .map(|items| resolve(items, document))
                .and_then(schema_type);
            let parts: Vec<&str> = match raw {
                [single] if single.is_empty() => Vec::new(),
                [single] => single.split(',').collect(),
                many => many.iter().map(String::as_str).collect(),
            };
            Value::Array(parts.into_iter().map(|p| coerce_scalar(item_type, p)).collect())
        }
        ty => raw
            .first()
            .map(|value| coerce_scalar(ty, value))
            .unwrap_or(Value::Null),
    }
}

fn coerce_scalar(ty: Option<&str>, raw: &str) -> Value {
    let coerced = match ty {
        Some("integer") => raw.parse::<i64>().ok().map(Value::from),
        Some("number") => raw
            .parse::<i64>()
            .ok()
            .map(Value::from)
            .or_else(|| raw.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)),
        Some("boolean") => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    coerced.unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Formats instance path from JSON Schema validation error
pub fn format_instance_location(instance_path: &str, prefix: &str) -> String {
    if instance_path.is_empty() {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, instance_path)
    }
}
