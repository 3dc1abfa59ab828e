use crate::api_validator::{ApiValidator, HttpMethod, OperationValidator};
use crate::config::Extensions;
use crate::error::OpenApiError;
use crate::spec::reference_resolver::ResolveReference;
use crate::validation_helpers::{CompiledSchema, SchemaContext};
use crate::validators::{
    ContentValidator, Credential, ParameterLocation, ParameterValidator, ParametersValidator,
    RequestBodyValidator, ResponseHeaderValidator, ResponseSpec, ResponseValidator, SchemeCheck,
    SecurityValidator,
};
use openapiv3::{
    APIKeyLocation, OpenAPI, Parameter, ParameterSchemaOrContent, ReferenceOr, SecurityRequirement,
    SecurityScheme, StatusCode,
};
use serde_json::{self, Value};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Header parameters the HTTP layer owns; OpenAPI says to ignore them.
const RESERVED_HEADERS: [&str; 3] = ["accept", "content-type", "authorization"];

/// Converts a schema reference to JSON Value
fn schema_to_json(schema_ref: &impl serde::Serialize, context: &str) -> Result<Value, OpenApiError> {
    serde_json::to_value(schema_ref).map_err(|e| {
        OpenApiError::SchemaCompilation(format!(
            "Failed to convert {} schema to JSON: {}",
            context, e
        ))
    })
}

/// Compiles the schema of a parameter or header, whether declared through
/// `schema` or through a single-entry `content` map.
fn compile_schema_or_content(
    context: &SchemaContext,
    format: &ParameterSchemaOrContent,
    label: &str,
) -> Result<(CompiledSchema, bool), OpenApiError> {
    match format {
        ParameterSchemaOrContent::Schema(schema_ref) => {
            let schema_json = schema_to_json(schema_ref, label)?;
            Ok((context.compile(&schema_json, label)?, false))
        }
        ParameterSchemaOrContent::Content(content) => {
            let schema_json = match content.values().next().and_then(|m| m.schema.as_ref()) {
                Some(schema_ref) => schema_to_json(schema_ref, label)?,
                None => Value::Object(Default::default()),
            };
            Ok((context.compile(&schema_json, label)?, true))
        }
    }
}

/// Build an ApiValidator from a parsed OpenAPI specification
pub fn build_api_validator(spec: &OpenAPI, extensions: &Extensions) -> Result<ApiValidator, OpenApiError> {
    let mut api_validator = ApiValidator::new();
    let context = SchemaContext::new(spec, extensions.formatters())?;

    let mut operation_count = 0usize;
    for (path, path_item_ref) in &spec.paths.paths {
        let path_item = match path_item_ref {
            ReferenceOr::Item(item) => item,
            ReferenceOr::Reference { reference } => {
                warn!(%path, %reference, "skipping path, path item references are not supported");
                continue;
            }
        };

        // Collect all operations for this path into a HashMap
        let mut operations_map = HashMap::new();

        for (method_str, operation) in path_item.iter() {
            let method = HttpMethod::from_str(method_str)?;
            let validator =
                build_operation_validator(spec, &context, extensions, &path_item.parameters, operation)?;
            operations_map.insert(method, validator);
            operation_count += 1;
            debug!(%path, method = method.as_str(), "compiled operation");
        }

        // Insert all operations for this path at once
        api_validator.add_path_operations(path, operations_map)?;
    }

    info!(operations = operation_count, "openapi validator built");
    Ok(api_validator)
}

/// Build an OperationValidator from an OpenAPI operation
fn build_operation_validator(
    spec: &OpenAPI,
    context: &SchemaContext,
    extensions: &Extensions,
    shared_parameters: &[ReferenceOr<Parameter>],
    operation: &openapiv3::Operation,
) -> Result<OperationValidator, OpenApiError> {
    let security_validator = build_security_validator(
        spec,
        operation.security.as_ref().or(spec.security.as_ref()),
    )?;

    let mut parameters_validator = ParametersValidator::new();
    // Operation-level parameters override path-level ones with the same name and location
    for parameter_ref in shared_parameters.iter().chain(&operation.parameters) {
        if let Some(validator) = build_parameter_validator(spec, context, parameter_ref)? {
            parameters_validator.add_parameter(validator);
        }
    }

    let request_body_validator = match &operation.request_body {
        Some(request_body) => Some(build_request_body_validator(
            spec,
            context,
            extensions,
            request_body,
        )?),
        None => None,
    };

    let response_validator = build_response_validator(spec, context, extensions, &operation.responses)?;

    Ok(OperationValidator::new(
        security_validator,
        parameters_validator,
        request_body_validator,
        response_validator,
    ))
}

/// Build the security alternatives of an operation
fn build_security_validator(
    spec: &OpenAPI,
    requirements: Option<&Vec<SecurityRequirement>>,
) -> Result<SecurityValidator, OpenApiError> {
    let Some(requirements) = requirements else {
        return Ok(SecurityValidator::default());
    };

    let mut alternatives = Vec::with_capacity(requirements.len());
    for requirement in requirements {
        let mut checks = Vec::with_capacity(requirement.len());
        for name in requirement.keys() {
            let scheme = spec
                .components
                .as_ref()
                .and_then(|c| c.security_schemes.get(name))
                .ok_or_else(|| {
                    OpenApiError::SchemaCompilation(format!("Unknown security scheme: {}", name))
                })?
                .resolve(spec)?;

            let credential = match scheme {
                SecurityScheme::HTTP { scheme, .. } => Credential::Authorization(scheme.clone()),
                SecurityScheme::APIKey { location, name, .. } => match location {
                    APIKeyLocation::Header => Credential::ApiKeyHeader(name.clone()),
                    APIKeyLocation::Query => Credential::ApiKeyQuery(name.clone()),
                    APIKeyLocation::Cookie => Credential::ApiKeyCookie(name.clone()),
                },
                SecurityScheme::OAuth2 { .. } | SecurityScheme::OpenIDConnect { .. } => {
                    Credential::Authorization("bearer".to_string())
                }
            };
            checks.push(SchemeCheck {
                name: name.clone(),
                credential,
            });
        }
        alternatives.push(checks);
    }

    Ok(SecurityValidator::new(alternatives))
}

/// Build a ParameterValidator; reserved header parameters yield `None`
fn build_parameter_validator(
    spec: &OpenAPI,
    context: &SchemaContext,
    parameter_ref: &ReferenceOr<Parameter>,
) -> Result<Option<ParameterValidator>, OpenApiError> {
    let parameter = parameter_ref.resolve(spec)?;
    let location = match parameter {
        Parameter::Query { .. } => ParameterLocation::Query,
        Parameter::Header { .. } => ParameterLocation::Header,
        Parameter::Path { .. } => ParameterLocation::Path,
        Parameter::Cookie { .. } => ParameterLocation::Cookie,
    };
    let parameter_data = parameter.parameter_data_ref();

    if location == ParameterLocation::Header
        && RESERVED_HEADERS
            .iter()
            .any(|h| parameter_data.name.eq_ignore_ascii_case(h))
    {
        return Ok(None);
    }

    let label = format!("parameter '{}' in {}", parameter_data.name, location);
    let (schema, json_content) = compile_schema_or_content(context, &parameter_data.format, &label)?;

    // Header lookups go through the canonical lowercase form
    let name = match location {
        ParameterLocation::Header => parameter_data.name.to_ascii_lowercase(),
        _ => parameter_data.name.clone(),
    };
    // Path parameters are always required
    let required = parameter_data.required || location == ParameterLocation::Path;

    let validator = ParameterValidator::new(name, location, required, schema);
    Ok(Some(if json_content {
        validator.with_json_content()
    } else {
        validator
    }))
}

/// Build a RequestBodyValidator from an OpenAPI RequestBody
fn build_request_body_validator(
    spec: &OpenAPI,
    context: &SchemaContext,
    extensions: &Extensions,
    request_body_ref: &ReferenceOr<openapiv3::RequestBody>,
) -> Result<RequestBodyValidator, OpenApiError> {
    let request_body = request_body_ref.resolve(spec)?;
    let content = ContentValidator::new(&request_body.content, context, extensions, "request body")?;
    Ok(RequestBodyValidator::new(content, request_body.required))
}

/// Build the declared headers and content of one response entry
fn build_response_spec(
    spec: &OpenAPI,
    context: &SchemaContext,
    extensions: &Extensions,
    response_ref: &ReferenceOr<openapiv3::Response>,
    label: &str,
) -> Result<ResponseSpec, OpenApiError> {
    let response = response_ref.resolve(spec)?;

    let mut headers = Vec::with_capacity(response.headers.len());
    for (name, header_ref) in &response.headers {
        // Content-Type is described by `content`, not by a header entry
        if name.eq_ignore_ascii_case("content-type") {
            continue;
        }
        let header = header_ref.resolve(spec)?;
        let (schema, _) = compile_schema_or_content(
            context,
            &header.format,
            &format!("{} header '{}'", label, name),
        )?;
        headers.push(ResponseHeaderValidator::new(
            name.to_ascii_lowercase(),
            header.required,
            schema,
        ));
    }

    let content = ContentValidator::new(&response.content, context, extensions, label)?;
    Ok(ResponseSpec::new(headers, content))
}

/// Build a ResponseValidator from OpenAPI Responses
fn build_response_validator(
    spec: &OpenAPI,
    context: &SchemaContext,
    extensions: &Extensions,
    responses: &openapiv3::Responses,
) -> Result<ResponseValidator, OpenApiError> {
    let mut response_validator = ResponseValidator::new();

    for (status_code, response_ref) in &responses.responses {
        match status_code {
            StatusCode::Code(code) => {
                let label = format!("response {}", code);
                let response_spec = build_response_spec(spec, context, extensions, response_ref, &label)?;
                response_validator.add_response(*code, response_spec);
            }
            StatusCode::Range(class) => {
                let label = format!("response {}XX", class);
                let response_spec = build_response_spec(spec, context, extensions, response_ref, &label)?;
                response_validator.add_range(*class, response_spec);
            }
        }
    }

    if let Some(default_response_ref) = &responses.default {
        let response_spec =
            build_response_spec(spec, context, extensions, default_response_ref, "default response")?;
        response_validator.set_default(response_spec);
    }

    Ok(response_validator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::parse_openapi_spec;

    const SPEC: &str = r#"
openapi: 3.0.3
info: { title: t, version: "1" }
security:
  - bearerAuth: []
paths:
  /items/{id}:
    parameters:
      - { name: id, in: path, required: true, schema: { type: integer } }
      - { name: Accept, in: header, schema: { type: string } }
    get:
      security: []
      parameters:
        - { name: verbose, in: query, schema: { type: boolean } }
      responses:
        "200": { description: ok }
        "4XX": { description: client error }
    delete:
      responses:
        "204": { description: gone }
components:
  securitySchemes:
    bearerAuth: { type: http, scheme: bearer }
"#;

    #[test]
    fn merges_path_level_parameters_and_skips_reserved_headers() {
        let spec = parse_openapi_spec(SPEC).unwrap();
        let validator = build_api_validator(&spec, &Extensions::default()).unwrap();

        let (operation, params) = validator.find_operation("/items/7", "get").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("7"));
        assert_eq!(operation.parameters.len(), 2);
    }

    #[test]
    fn operation_security_overrides_document_security() {
        let spec = parse_openapi_spec(SPEC).unwrap();
        let validator = build_api_validator(&spec, &Extensions::default()).unwrap();
        let request = crate::request::CanonicalRequest::from_raw(
            "DELETE",
            "/items/7",
            http::HeaderMap::new(),
            bytes::Bytes::new(),
        );

        let (get, _) = validator.find_operation("/items/7", "get").unwrap();
        assert!(get.security.validate(&request).is_ok());
        let (delete, _) = validator.find_operation("/items/7", "delete").unwrap();
        assert!(delete.security.validate(&request).is_err());
    }

    #[test]
    fn unknown_security_scheme_fails_the_build() {
        let spec = parse_openapi_spec(
            r#"
openapi: 3.0.3
info: { title: t, version: "1" }
paths:
  /a:
    get:
      security: [ { missing: [] } ]
      responses: { "200": { description: ok } }
"#,
        )
        .unwrap();

        let error = build_api_validator(&spec, &Extensions::default()).err().unwrap();
        assert!(matches!(error, OpenApiError::SchemaCompilation(m) if m.contains("missing")));
    }
}
