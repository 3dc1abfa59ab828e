//! Content-Type normalization.

use crate::error::MimetypeError;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use mime::Mime;

/// Content type assumed for requests that do not send one.
pub const DEFAULT_REQUEST_MIMETYPE: &str = "application/x-www-form-urlencoded";

/// Content type assumed for responses that do not send one.
pub const DEFAULT_RESPONSE_MIMETYPE: &str = "text/html";

/// Reduces a `Content-Type` value to `type/subtype[+suffix]`, lowercased.
///
/// Parameters such as `charset` are dropped:
///
/// ```
/// use openapi_guard::normalize_mimetype;
///
/// assert_eq!(normalize_mimetype("Text/HTML; charset=utf-8").unwrap(), "text/html");
/// assert_eq!(
///     normalize_mimetype("application/vnd.api+json").unwrap(),
///     "application/vnd.api+json"
/// );
/// ```
pub fn normalize_mimetype(raw: &str) -> Result<String, MimetypeError> {
    let parsed: Mime = raw.trim().parse().map_err(|e: mime::FromStrError| {
        MimetypeError::Invalid {
            value: raw.to_string(),
            reason: e.to_string(),
        }
    })?;

    let mut normalized = format!("{}/{}", parsed.type_().as_str(), parsed.subtype().as_str());
    if let Some(suffix) = parsed.suffix() {
        normalized.push('+');
        normalized.push_str(suffix.as_str());
    }
    Ok(normalized.to_ascii_lowercase())
}

/// Normalized `Content-Type` of a header set, or `default` when absent.
pub(crate) fn content_type_of(headers: &HeaderMap, default: &str) -> Result<String, MimetypeError> {
    match headers.get(CONTENT_TYPE) {
        None => Ok(default.to_string()),
        Some(value) => {
            let raw = value.to_str().map_err(|_| MimetypeError::Invalid {
                value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
                reason: "header value is not visible ASCII".to_string(),
            })?;
            normalize_mimetype(raw)
        }
    }
}

/// `true` for `application/json` and any `+json` structured syntax suffix.
pub(crate) fn is_json(mimetype: &str) -> bool {
    mimetype == "application/json" || mimetype.ends_with("+json")
}
