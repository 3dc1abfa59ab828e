use crate::error::NormalizeError;
use crate::mimetype::{content_type_of, DEFAULT_RESPONSE_MIMETYPE};
use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};

/// What the validation engine reads from a response.
pub trait OpenApiResponse {
    fn status(&self) -> StatusCode;
    fn headers(&self) -> &HeaderMap;
    fn body(&self) -> &[u8];
    fn mimetype(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    mimetype: String,
}

impl CanonicalResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Result<Self, NormalizeError> {
        let mimetype = content_type_of(&headers, DEFAULT_RESPONSE_MIMETYPE)?;
        Ok(Self {
            status,
            headers,
            body,
            mimetype,
        })
    }

    pub fn from_parts(parts: &http::response::Parts, body: Bytes) -> Result<Self, NormalizeError> {
        Self::new(parts.status, parts.headers.clone(), body)
    }

    pub fn from_response(response: &Response<Bytes>) -> Result<Self, NormalizeError> {
        Self::new(
            response.status(),
            response.headers().clone(),
            response.body().clone(),
        )
    }
}

impl OpenApiResponse for CanonicalResponse {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn mimetype(&self) -> &str {
        &self.mimetype
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_response_defaults() {
        let response = Response::builder()
            .status(200)
            .body(Bytes::new())
            .unwrap();

        let canonical = CanonicalResponse::from_response(&response).unwrap();
        assert_eq!(canonical.status(), StatusCode::OK);
        assert_eq!(canonical.mimetype(), "text/html");
        assert_eq!(canonical.body(), b"");
    }

    #[test]
    fn status_and_content_type_are_carried_over() {
        let response = Response::builder()
            .status(404)
            .header("Content-Type", "application/problem+json; charset=utf-8")
            .header("X-Request-Id", "abc")
            .body(Bytes::from_static(b"{}"))
            .unwrap();

        let canonical = CanonicalResponse::from_response(&response).unwrap();
        assert_eq!(canonical.status(), StatusCode::NOT_FOUND);
        assert_eq!(canonical.mimetype(), "application/problem+json");
        assert_eq!(canonical.headers().get("x-request-id").unwrap(), "abc");
    }
}
