//! Canonical request records.
//!
//! A [`CanonicalRequest`] is built from either an outbound (client style)
//! request, whose URI is a full URL, or an inbound (server style) request
//! that only carries `path?query` and learns its host from the `Host`
//! header. Both end up with the same shape so the validation engine never
//! has to know which side of the connection it is looking at.
//!
//! Building a record never fails. A malformed `Content-Type` or `Cookie`
//! header is kept in the record and reported only when the matched
//! operation reads the body or its cookies.

use crate::error::{MimetypeError, NormalizeError};
use crate::mimetype::{content_type_of, DEFAULT_REQUEST_MIMETYPE};
use bytes::Bytes;
use http::header::{COOKIE, HOST};
use http::{HeaderMap, Method, Request, Uri};
use indexmap::IndexMap;
use url::form_urlencoded;

/// Ordered multi-valued mapping; duplicate keys keep every value in order.
pub type MultiMap = IndexMap<String, Vec<String>>;

/// What the validation engine reads from a request.
pub trait OpenApiRequest {
    /// Lowercase method token, e.g. `post`.
    fn method(&self) -> &str;
    fn path(&self) -> &str;
    fn query(&self) -> &MultiMap;
    fn headers(&self) -> &HeaderMap;
    fn cookies(&self) -> Result<&IndexMap<String, String>, NormalizeError>;
    fn body(&self) -> &[u8];
    /// Normalized `type/subtype[+suffix]`.
    fn mimetype(&self) -> Result<&str, MimetypeError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRequest {
    method: String,
    scheme: String,
    host: String,
    path: String,
    query: MultiMap,
    headers: HeaderMap,
    cookies: Result<IndexMap<String, String>, String>,
    body: Bytes,
    mimetype: Result<String, MimetypeError>,
}

impl CanonicalRequest {
    /// Builds a record from a method, a request target and headers.
    ///
    /// `target` may be a full URL (`https://host/path?q=1`) or an
    /// origin-form target (`/path?q=1`).
    pub fn from_raw(method: &str, target: &str, headers: HeaderMap, body: Bytes) -> Self {
        let parts = split_target(target);
        let mimetype = content_type_of(&headers, DEFAULT_REQUEST_MIMETYPE);
        let cookies = parse_cookies(&headers);
        let method = if method.is_empty() {
            "get".to_string()
        } else {
            method.to_ascii_lowercase()
        };

        Self {
            method,
            scheme: parts.scheme.to_ascii_lowercase(),
            host: parts.host.to_string(),
            path: parts.path.to_string(),
            query: parse_query(parts.query),
            headers,
            cookies,
            body,
            mimetype,
        }
    }

    /// Builds a record from `http` request parts and an already buffered body.
    pub fn from_parts(parts: &http::request::Parts, body: Bytes) -> Self {
        Self::from_components(&parts.method, &parts.uri, &parts.headers, body)
    }

    pub fn from_request(request: &Request<Bytes>) -> Self {
        Self::from_components(
            request.method(),
            request.uri(),
            request.headers(),
            request.body().clone(),
        )
    }

    fn from_components(method: &Method, uri: &Uri, headers: &HeaderMap, body: Bytes) -> Self {
        let mut request = Self::from_raw(method.as_str(), &uri.to_string(), headers.clone(), body);
        if request.host.is_empty() {
            if let Some(host) = headers.get(HOST).and_then(|v| v.to_str().ok()) {
                request.host = host.to_string();
            }
        }
        request
    }

    /// Supplies scheme and host known out of band, as for inbound requests.
    pub fn with_origin(mut self, scheme: &str, host: &str) -> Self {
        self.scheme = scheme.to_ascii_lowercase();
        self.host = host.to_string();
        self
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `scheme://host`, or empty when either part is unknown.
    pub fn origin(&self) -> String {
        if self.scheme.is_empty() || self.host.is_empty() {
            String::new()
        } else {
            format!("{}://{}", self.scheme, self.host)
        }
    }

    /// Rebuilds an `http` request carrying the same information.
    pub fn to_http_request(&self) -> Result<Request<Bytes>, NormalizeError> {
        let mut target = self.origin();
        if self.path.is_empty() {
            target.push('/');
        } else {
            target.push_str(&self.path);
        }
        if !self.query.is_empty() {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, values) in &self.query {
                for value in values {
                    serializer.append_pair(key, value);
                }
            }
            target.push('?');
            target.push_str(&serializer.finish());
        }

        let mut builder = Request::builder()
            .method(self.method.to_ascii_uppercase().as_str())
            .uri(target);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers.clone());
        }
        Ok(builder.body(self.body.clone())?)
    }
}

impl OpenApiRequest for CanonicalRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn query(&self) -> &MultiMap {
        &self.query
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn cookies(&self) -> Result<&IndexMap<String, String>, NormalizeError> {
        self.cookies
            .as_ref()
            .map_err(|message| NormalizeError::MalformedCookie(message.clone()))
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn mimetype(&self) -> Result<&str, MimetypeError> {
        self.mimetype.as_deref().map_err(Clone::clone)
    }
}

struct Target<'a> {
    scheme: &'a str,
    host: &'a str,
    path: &'a str,
    query: &'a str,
}

fn split_target(target: &str) -> Target<'_> {
    let target = target.split_once('#').map_or(target, |(before, _)| before);
    let (location, query) = target.split_once('?').unwrap_or((target, ""));

    let Some((scheme, rest)) = location.split_once("://").filter(|_| !location.starts_with('/'))
    else {
        return Target {
            scheme: "",
            host: "",
            path: location,
            query,
        };
    };

    // A URL without a host must not leave a dangling "://" behind as the path.
    let (host, path) = match rest.find('/') {
        Some(index) => rest.split_at(index),
        None => (rest, ""),
    };
    Target {
        scheme,
        host,
        path,
        query,
    }
}

fn parse_query(query: &str) -> MultiMap {
    let mut params = MultiMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    params
}

fn parse_cookies(headers: &HeaderMap) -> Result<IndexMap<String, String>, String> {
    let mut cookies = IndexMap::new();
    for header in headers.get_all(COOKIE) {
        let header = header
            .to_str()
            .map_err(|_| "header value is not visible ASCII".to_string())?;

        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("missing '=' in '{pair}'"))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(format!("empty cookie name in '{pair}'"));
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            cookies.insert(name.to_string(), value.to_string());
        }
    }
    Ok(cookies)
}
