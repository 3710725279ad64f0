// Inbound request types
// The canonical view of an HTTP request that the execution engine receives

//! # Request Model
//!
//! Every inbound HTTP request is reduced to a [`RequestDescriptor`] before it
//! reaches the execution engine. The descriptor carries three things:
//!
//! - the [`RequestMethod`], reduced to the only distinction that matters here
//!   (GET, POST, anything else)
//! - the query payload, a JSON value taken either from the parsed body (POST)
//!   or from the decoded query string (everything else)
//! - the [`RawRequest`], the method/URI/headers passed through untouched for
//!   engines that need low-level access
//!
//! ## Rust Learning Notes:
//!
//! ### Conversions with `From`
//! `RawRequest` implements `From<http::request::Parts>`, so a framework request
//! split with `into_parts()` converts with a plain `.into()`. The body is kept
//! separate because reading it is asynchronous and only needed for POST.

use axum::http::{header, request::Parts, HeaderMap, Method, Uri};
use serde_json::{Map, Value};

/// HTTP method as far as payload extraction is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    /// Any other verb; extracts its payload like GET
    Other,
}

impl From<&Method> for RequestMethod {
    fn from(method: &Method) -> Self {
        match *method {
            Method::GET => RequestMethod::Get,
            Method::POST => RequestMethod::Post,
            _ => RequestMethod::Other,
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestMethod::Get => write!(f, "GET"),
            RequestMethod::Post => write!(f, "POST"),
            RequestMethod::Other => write!(f, "OTHER"),
        }
    }
}

/// Engine-agnostic snapshot of the inbound request
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RawRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    /// Value of a header, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Whether the client listed `multipart/mixed` in its `Accept` header
    pub fn accepts_multipart(&self) -> bool {
        self.headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|media| {
                media
                    .split(';')
                    .next()
                    .map(|essence| essence.trim().eq_ignore_ascii_case("multipart/mixed"))
                    .unwrap_or(false)
            })
    }

    /// Query-string parameters decoded into a JSON object of strings
    ///
    /// A repeated key keeps its last value. A request without a query string
    /// yields an empty object.
    pub fn query_params(&self) -> Value {
        let params = self
            .uri
            .query()
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
                    .collect::<Map<String, Value>>()
            })
            .unwrap_or_default();

        Value::Object(params)
    }
}

impl From<Parts> for RawRequest {
    fn from(parts: Parts) -> Self {
        Self::new(parts.method, parts.uri, parts.headers)
    }
}

/// Canonical, immutable description of one GraphQL request
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: RequestMethod,
    pub payload: Value,
    pub request: RawRequest,
}

impl RequestDescriptor {
    /// Select the query payload for `request`
    ///
    /// POST uses the parsed body (`Value::Null` when the host supplied none);
    /// every other method uses the query-string parameters and ignores `body`.
    pub fn normalize(request: RawRequest, body: Option<Value>) -> Self {
        let method = RequestMethod::from(&request.method);
        let payload = match method {
            RequestMethod::Post => body.unwrap_or(Value::Null),
            RequestMethod::Get | RequestMethod::Other => request.query_params(),
        };

        Self {
            method,
            payload,
            request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn raw(method: Method, uri: &str) -> RawRequest {
        RawRequest::new(method, uri.parse().unwrap(), HeaderMap::new())
    }

    #[test]
    fn test_method_classification() {
        assert_eq!(RequestMethod::from(&Method::GET), RequestMethod::Get);
        assert_eq!(RequestMethod::from(&Method::POST), RequestMethod::Post);
        assert_eq!(RequestMethod::from(&Method::PUT), RequestMethod::Other);
        assert_eq!(RequestMethod::from(&Method::OPTIONS), RequestMethod::Other);
    }

    #[test]
    fn test_post_uses_body() {
        let body = json!({ "query": "{ hello }" });
        let descriptor = RequestDescriptor::normalize(
            raw(Method::POST, "/graphql?query=ignored"),
            Some(body.clone()),
        );

        assert_eq!(descriptor.method, RequestMethod::Post);
        assert_eq!(descriptor.payload, body);
    }

    #[test]
    fn test_get_uses_query_string() {
        let descriptor = RequestDescriptor::normalize(
            raw(Method::GET, "/graphql?query=%7Bhello%7D&operationName=Q"),
            Some(json!({ "query": "{ fromBody }" })),
        );

        assert_eq!(descriptor.method, RequestMethod::Get);
        assert_eq!(
            descriptor.payload,
            json!({ "query": "{hello}", "operationName": "Q" })
        );
    }

    #[test]
    fn test_other_methods_behave_like_get() {
        let descriptor =
            RequestDescriptor::normalize(raw(Method::PUT, "/graphql?query=%7Bhello%7D"), None);

        assert_eq!(descriptor.method, RequestMethod::Other);
        assert_eq!(descriptor.payload, json!({ "query": "{hello}" }));
    }

    #[test]
    fn test_missing_query_string_is_empty_object() {
        let descriptor = RequestDescriptor::normalize(raw(Method::GET, "/graphql"), None);
        assert_eq!(descriptor.payload, json!({}));
    }

    #[test]
    fn test_raw_request_passes_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace", HeaderValue::from_static("abc"));
        let request = RawRequest::new(Method::GET, "/graphql?a=1".parse().unwrap(), headers);

        let descriptor = RequestDescriptor::normalize(request, None);
        assert_eq!(descriptor.request.header("x-trace"), Some("abc"));
        assert_eq!(descriptor.request.uri.path(), "/graphql");
    }

    #[test]
    fn test_accepts_multipart() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, multipart/mixed; deferSpec=20220824"),
        );
        let request = RawRequest::new(Method::POST, "/".parse().unwrap(), headers);
        assert!(request.accepts_multipart());

        assert!(!raw(Method::POST, "/").accepts_multipart());
    }
}
