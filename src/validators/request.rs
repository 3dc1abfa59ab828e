use crate::error::{BodyError, NormalizeError, OpenApiError};
use crate::request::OpenApiRequest;
use crate::validators::content::ContentValidator;
use http::header::CONTENT_TYPE;
use serde_json::Value;

/// Validator for request bodies against the operation's `requestBody`
pub struct RequestBodyValidator {
    content: ContentValidator,
    required: bool,
}

impl RequestBodyValidator {
    pub fn new(content: ContentValidator, required: bool) -> Self {
        Self { content, required }
    }

    /// Validates request body against schema
    ///
    /// An empty body counts as absent and is skipped when optional. A declared
    /// `Content-Type` is looked up before a required body is reported missing,
    /// so an undeclared media type is reported as such even without a body.
    pub fn validate(&self, request: &dyn OpenApiRequest) -> Result<Option<Value>, OpenApiError> {
        let body = request.body();
        if body.is_empty() && (!self.required || !request.headers().contains_key(CONTENT_TYPE)) {
            return if self.required {
                Err(BodyError::Missing.into())
            } else {
                Ok(None)
            };
        }

        let mimetype = request.mimetype().map_err(NormalizeError::from)?;
        self.content.ensure_declared(mimetype)?;
        if body.is_empty() {
            return Err(BodyError::Missing.into());
        }
        Ok(Some(self.content.validate(mimetype, body, "body")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Extensions;
    use crate::request::CanonicalRequest;
    use crate::spec::openapi_from_value;
    use crate::validation_helpers::SchemaContext;
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue};
    use serde_json::json;

    fn validator(required: bool) -> RequestBodyValidator {
        let spec = openapi_from_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {}
        }))
        .unwrap();
        let context = SchemaContext::new(&spec, &Default::default()).unwrap();
        let content: openapiv3::Content = serde_json::from_value(json!({
            "application/json": {"schema": {"type": "object", "required": ["name"]}}
        }))
        .unwrap();
        let content = ContentValidator::new(&content, &context, &Extensions::default(), "body").unwrap();
        RequestBodyValidator::new(content, required)
    }

    fn request(content_type: Option<&'static str>, body: &'static str) -> CanonicalRequest {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert("content-type", HeaderValue::from_static(content_type));
        }
        CanonicalRequest::from_raw("POST", "/", headers, Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn optional_empty_body_is_skipped_whatever_its_content_type() {
        assert_eq!(validator(false).validate(&request(Some("garbage"), "")).unwrap(), None);
        assert_eq!(validator(false).validate(&request(Some("text/plain"), "")).unwrap(), None);
    }

    #[test]
    fn required_empty_body_without_content_type_is_missing() {
        let error = validator(true).validate(&request(None, "")).unwrap_err();
        assert!(matches!(error, OpenApiError::Body(BodyError::Missing)));

        let error = validator(true).validate(&request(Some("application/json"), "")).unwrap_err();
        assert!(matches!(error, OpenApiError::Body(BodyError::Missing)));
    }

    #[test]
    fn undeclared_media_type_wins_over_missing_body() {
        let error = validator(true).validate(&request(Some("text/plain"), "")).unwrap_err();
        assert!(matches!(error, OpenApiError::Body(BodyError::MediaTypeNotFound { .. })));
    }

    #[test]
    fn malformed_content_type_is_a_normalize_error_once_the_body_is_read() {
        let error = validator(true).validate(&request(Some("garbage"), "{}")).unwrap_err();
        assert!(matches!(error, OpenApiError::Normalize(NormalizeError::Mimetype(_))));
    }

    #[test]
    fn body_is_validated_against_its_schema() {
        let ok = validator(true)
            .validate(&request(Some("application/json"), r#"{"name":"A"}"#))
            .unwrap();
        assert_eq!(ok, Some(json!({"name": "A"})));

        let error = validator(true)
            .validate(&request(Some("application/json"), "{}"))
            .unwrap_err();
        assert!(matches!(error, OpenApiError::Body(BodyError::Schema(_))));
    }
}
