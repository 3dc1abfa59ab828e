//! Property tests for request and response normalization.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};
use openapi_guard::{
    normalize_mimetype, CanonicalRequest, CanonicalResponse, OpenApiRequest, OpenApiResponse,
    DEFAULT_REQUEST_MIMETYPE, DEFAULT_RESPONSE_MIMETYPE,
};
use proptest::prelude::*;

fn arb_method() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("GET"),
        Just("POST"),
        Just("PUT"),
        Just("PATCH"),
        Just("DELETE"),
    ]
}

fn arb_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9_-]{1,8}", 1..4).prop_map(|segments| format!("/{}", segments.join("/")))
}

// Keys and values deliberately include characters that need escaping
fn arb_query() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-z]{1,6}", "[a-zA-Z0-9 &=+%/]{0,8}"), 0..6)
}

fn arb_mimetype() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("application"), Just("text"), Just("image"), Just("Application")],
        prop_oneof![Just("json"), Just("html"), Just("vnd.api+json"), Just("PNG"), Just("plain")],
    )
        .prop_map(|(ty, subtype)| format!("{}/{}", ty, subtype))
}

// Names vary in case; values are sometimes wrapped in double quotes
fn arb_cookies() -> impl Strategy<Value = Vec<(String, String, bool)>> {
    prop::collection::vec(("[A-Za-z]{1,6}", "[a-zA-Z0-9_.-]{0,8}", any::<bool>()), 0..4)
}

fn cookie_header(cookies: &[(String, String, bool)]) -> String {
    cookies
        .iter()
        .map(|(name, value, quoted)| match quoted {
            true => format!("{}=\"{}\"", name, value),
            false => format!("{}={}", name, value),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn encode_query(pairs: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

proptest! {
    /// Property: rebuilding a framework request from a canonical record and
    /// normalizing it again yields the same record.
    #[test]
    fn proptest_request_round_trip(
        method in arb_method(),
        path in arb_path(),
        query in arb_query(),
        body in prop::collection::vec(any::<u8>(), 0..64),
        mimetype in prop::option::of(arb_mimetype()),
        cookies in arb_cookies(),
    ) {
        let mut headers = HeaderMap::new();
        if let Some(mimetype) = &mimetype {
            headers.insert("content-type", HeaderValue::from_str(mimetype).unwrap());
        }
        headers.append("x-trace", HeaderValue::from_static("one"));
        headers.append("x-trace", HeaderValue::from_static("two"));
        if !cookies.is_empty() {
            headers.insert("cookie", HeaderValue::from_str(&cookie_header(&cookies)).unwrap());
        }

        let target = if query.is_empty() {
            path.clone()
        } else {
            format!("{}?{}", path, encode_query(&query))
        };
        let original = CanonicalRequest::from_raw(method, &target, headers, Bytes::from(body));

        let rebuilt = original.to_http_request().unwrap();
        let normalized = CanonicalRequest::from_request(&rebuilt);

        prop_assert_eq!(&normalized, &original);
        prop_assert_eq!(normalized.path(), path.as_str());

        // Quotes are stripped, names keep their case and later duplicates win
        let parsed = normalized.cookies().unwrap();
        for (name, _, _) in &cookies {
            let expected = cookies.iter().rev().find(|(n, _, _)| n == name).map(|(_, v, _)| v);
            prop_assert_eq!(parsed.get(name), expected);
        }
        let distinct: std::collections::HashSet<&String> = cookies.iter().map(|(n, _, _)| n).collect();
        prop_assert_eq!(parsed.len(), distinct.len());
    }

    /// Property: every value of a repeated query key is kept, in order.
    #[test]
    fn proptest_multi_value_preservation(
        key in "[a-z]{1,6}",
        values in prop::collection::vec("[a-zA-Z0-9 ,]{0,6}", 1..6),
    ) {
        let pairs: Vec<(String, String)> = values.iter().map(|v| (key.clone(), v.clone())).collect();
        let target = format!("/things?{}", encode_query(&pairs));
        let request = CanonicalRequest::from_raw("GET", &target, HeaderMap::new(), Bytes::new());

        prop_assert_eq!(request.query().get(&key), Some(&values));
        prop_assert_eq!(request.query().len(), 1);
    }

    /// Property: normalization is idempotent and drops media type parameters.
    #[test]
    fn proptest_mimetype_idempotence(
        mimetype in arb_mimetype(),
        charset in prop::option::of("[a-z0-9-]{1,8}"),
    ) {
        let raw = match &charset {
            Some(charset) => format!("{}; charset={}", mimetype, charset),
            None => mimetype.clone(),
        };

        let once = normalize_mimetype(&raw).unwrap();
        let twice = normalize_mimetype(&once).unwrap();

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once, mimetype.to_ascii_lowercase());
    }

    /// Property: an empty body stays empty, it is never turned into a value.
    #[test]
    fn proptest_empty_body(method in arb_method(), path in arb_path()) {
        let request = CanonicalRequest::from_raw(method, &path, HeaderMap::new(), Bytes::new());
        prop_assert!(request.body().is_empty());
        prop_assert_eq!(request.mimetype(), Ok(DEFAULT_REQUEST_MIMETYPE));
    }

    /// Property: responses without a Content-Type default to text/html.
    #[test]
    fn proptest_response_default_mimetype(status in 200u16..600, body in "[ -~]{0,32}") {
        let status = StatusCode::from_u16(status).unwrap();
        let response = CanonicalResponse::new(status, HeaderMap::new(), Bytes::from(body.clone())).unwrap();

        prop_assert_eq!(response.mimetype(), DEFAULT_RESPONSE_MIMETYPE);
        prop_assert_eq!(response.status(), status);
        prop_assert_eq!(response.body(), body.as_bytes());
    }
}
