use crate::error::OpenApiError;
use openapiv3::{Components, OpenAPI, ReferenceOr};

/// Looks up `#/components/...` references to parameters, request bodies,
/// responses, headers and security schemes. References inside JSON schemas
/// are left to the `jsonschema` registry.
pub trait ResolveReference<T> {
    fn resolve<'a>(&'a self, spec: &'a OpenAPI) -> Result<&'a T, OpenApiError>;
}

fn resolve_logic<'a, T, F>(
    ref_or: &'a ReferenceOr<T>,
    spec: &'a OpenAPI,
    prefix: &str,
    selector: F,
) -> Result<&'a T, OpenApiError>
where
    F: Fn(&'a Components) -> Option<&'a indexmap::IndexMap<String, ReferenceOr<T>>>,
{
    match ref_or {
        ReferenceOr::Item(item) => Ok(item),
        ReferenceOr::Reference { reference } => {
            if !reference.starts_with(prefix) {
                return Err(OpenApiError::SchemaCompilation(format!(
                    "Invalid reference: {}. Expected prefix: {}",
                    reference, prefix
                )));
            }
            let name = &reference[prefix.len()..];

            spec.components
                .as_ref()
                .and_then(selector)
                .and_then(|map| map.get(name))
                .and_then(|r| r.as_item())
                .ok_or_else(|| {
                    OpenApiError::SchemaCompilation(format!(
                        "Reference not found: {}",
                        reference
                    ))
                })
        }
    }
}

impl ResolveReference<openapiv3::Parameter> for ReferenceOr<openapiv3::Parameter> {
    fn resolve<'a>(&'a self, spec: &'a OpenAPI) -> Result<&'a openapiv3::Parameter, OpenApiError> {
        resolve_logic(self, spec, "#/components/parameters/", |c| {
            Some(&c.parameters)
        })
    }
}

impl ResolveReference<openapiv3::RequestBody> for ReferenceOr<openapiv3::RequestBody> {
    fn resolve<'a>(
        &'a self,
        spec: &'a OpenAPI,
    ) -> Result<&'a openapiv3::RequestBody, OpenApiError> {
        resolve_logic(self, spec, "#/components/requestBodies/", |c| {
            Some(&c.request_bodies)
        })
    }
}

impl ResolveReference<openapiv3::Response> for ReferenceOr<openapiv3::Response> {
    fn resolve<'a>(
        &'a self,
        spec: &'a OpenAPI,
    ) -> Result<&'a openapiv3::Response, OpenApiError> {
        resolve_logic(self, spec, "#/components/responses/", |c| {
            Some(&c.responses)
        })
    }
}

impl ResolveReference<openapiv3::Header> for ReferenceOr<openapiv3::Header> {
    fn resolve<'a>(&'a self, spec: &'a OpenAPI) -> Result<&'a openapiv3::Header, OpenApiError> {
        resolve_logic(self, spec, "#/components/headers/", |c| Some(&c.headers))
    }
}

impl ResolveReference<openapiv3::SecurityScheme> for ReferenceOr<openapiv3::SecurityScheme> {
    fn resolve<'a>(
        &'a self,
        spec: &'a OpenAPI,
    ) -> Result<&'a openapiv3::SecurityScheme, OpenApiError> {
        resolve_logic(self, spec, "#/components/securitySchemes/", |c| {
            Some(&c.security_schemes)
        })
    }
}
