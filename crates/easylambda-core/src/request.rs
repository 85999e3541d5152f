//! Request envelope and the normalized request handed to providers.
//!
//! [`Event`] mirrors the API Gateway / Lambda function URL payload format
//! 2.0 as it arrives on the wire. [`Request`] is what the rest of the crate
//! works with: lower-cased header names, a parsed query string, split cookies
//! and a decoded body.

use easylambda_http::{
    BodyError, QueryParams, content_type_essence, decode_body, parse_cookie_header, split_cookie,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lambda HTTP event, payload format version 2.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub version: Option<String>,
    pub route_key: Option<String>,
    pub raw_path: Option<String>,
    pub raw_query_string: Option<String>,
    pub cookies: Option<Vec<String>>,
    pub headers: Option<HashMap<String, String>>,
    pub query_string_parameters: Option<HashMap<String, String>>,
    pub path_parameters: Option<HashMap<String, String>>,
    pub stage_variables: Option<HashMap<String, String>>,
    pub request_context: EventContext,
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

/// `requestContext` of an [`Event`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    pub request_id: String,
    pub http: EventHttp,
    pub account_id: Option<String>,
    pub api_id: Option<String>,
    pub domain_name: Option<String>,
    pub stage: Option<String>,
    pub time: Option<String>,
    pub time_epoch: Option<i64>,
}

/// `requestContext.http` of an [`Event`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHttp {
    pub method: String,
    pub path: String,
    pub protocol: Option<String>,
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Error building a [`Request`] from an [`Event`].
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request body could not be decoded")]
    Body(#[from] BodyError),
}

/// HTTP headers with case-insensitive names.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    /// Create empty headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a header value by name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Insert a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner
            .insert(name.into().to_ascii_lowercase(), value.into());
    }

    /// Iterate over all headers as (name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// A normalized HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    request_id: String,
    method: String,
    path: String,
    headers: Headers,
    query: QueryParams,
    cookies: Vec<(String, String)>,
    body: Option<String>,
    content_type: Option<String>,
    event: Event,
}

impl Request {
    /// Normalize an event.
    ///
    /// The query string is taken from `rawQueryString` when present, falling
    /// back to the pre-parsed `queryStringParameters`. Cookies come from the
    /// `cookies` array, or from a `Cookie` header when the array is absent.
    pub fn from_event(event: Event) -> Result<Self, RequestError> {
        let headers: Headers = event
            .headers
            .iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let query = match event.raw_query_string.as_deref() {
            Some(raw) if !raw.is_empty() => QueryParams::parse(raw),
            _ => event
                .query_string_parameters
                .iter()
                .flatten()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
        };

        let cookies = match &event.cookies {
            Some(list) => list
                .iter()
                .filter_map(|raw| split_cookie(raw))
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
            None => headers
                .get("cookie")
                .map(|header| {
                    parse_cookie_header(header)
                        .map(|(k, v)| (k.to_owned(), v.to_owned()))
                        .collect()
                })
                .unwrap_or_default(),
        };

        let body = event
            .body
            .as_deref()
            .map(|body| decode_body(body, event.is_base64_encoded))
            .transpose()?;

        let content_type = headers.get("content-type").and_then(content_type_essence);

        Ok(Self {
            request_id: event.request_context.request_id.clone(),
            method: event.request_context.http.method.to_ascii_uppercase(),
            path: event.request_context.http.path.clone(),
            headers,
            query,
            cookies,
            body,
            content_type,
            event,
        })
    }

    /// Unique id of this invocation, from `requestContext.requestId`.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Upper-case method name as received.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get a header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    #[must_use]
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Cookies in the order received.
    #[must_use]
    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    /// Last cookie with the given name.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Decoded body text.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// MIME essence of the `Content-Type` header, e.g. `application/json`.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The raw envelope.
    #[must_use]
    pub fn event(&self) -> &Event {
        &self.event
    }
}

impl TryFrom<Event> for Request {
    type Error = RequestError;

    fn try_from(event: Event) -> Result<Self, Self::Error> {
        Self::from_event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: serde_json::Value) -> Event {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parses_full_envelope() {
        let request = Request::from_event(event(json!({
            "version": "2.0",
            "routeKey": "$default",
            "rawPath": "/items/123",
            "rawQueryString": "q=a%20b&q=c",
            "cookies": ["session=abc", "theme=\"dark\""],
            "headers": {"Content-Type": "application/json; charset=utf-8", "User-Agent": "curl"},
            "queryStringParameters": {"q": "a b,c"},
            "requestContext": {
                "accountId": "anonymous",
                "apiId": "xyz",
                "domainName": "example.lambda-url.us-east-1.on.aws",
                "http": {
                    "method": "post",
                    "path": "/items/123",
                    "protocol": "HTTP/1.1",
                    "sourceIp": "127.0.0.1",
                    "userAgent": "curl"
                },
                "requestId": "req-1",
                "stage": "$default",
                "time": "01/Jan/2024:00:00:00 +0000",
                "timeEpoch": 1_704_067_200_000_i64
            },
            "body": "{\"a\":1}",
            "isBase64Encoded": false
        })))
        .unwrap();

        assert_eq!(request.request_id(), "req-1");
        assert_eq!(request.method(), "POST");
        assert_eq!(request.path(), "/items/123");
        assert_eq!(request.header("user-agent"), Some("curl"));
        assert_eq!(request.header("USER-AGENT"), Some("curl"));
        assert_eq!(request.query().all("q"), ["a b", "c"]);
        assert_eq!(request.cookie("session"), Some("abc"));
        assert_eq!(request.cookie("theme"), Some("dark"));
        assert_eq!(request.body(), Some("{\"a\":1}"));
        assert_eq!(request.content_type(), Some("application/json"));
        assert_eq!(request.event().request_context.stage.as_deref(), Some("$default"));
    }

    #[test]
    fn minimal_envelope() {
        let request = Request::from_event(event(json!({
            "requestContext": {"requestId": "r", "http": {"method": "GET", "path": "/"}}
        })))
        .unwrap();
        assert!(request.headers().is_empty());
        assert!(request.query().is_empty());
        assert!(request.cookies().is_empty());
        assert_eq!(request.body(), None);
        assert_eq!(request.content_type(), None);
    }

    #[test]
    fn query_falls_back_to_parameters() {
        let request = Request::from_event(event(json!({
            "rawQueryString": "",
            "queryStringParameters": {"skip": "1"},
            "requestContext": {"requestId": "r", "http": {"method": "GET", "path": "/"}}
        })))
        .unwrap();
        assert_eq!(request.query().last("skip"), Some("1"));
    }

    #[test]
    fn cookies_fall_back_to_header() {
        let request = Request::from_event(event(json!({
            "headers": {"cookie": "a=1; b=2; a=3"},
            "requestContext": {"requestId": "r", "http": {"method": "GET", "path": "/"}}
        })))
        .unwrap();
        assert_eq!(request.cookies().len(), 3);
        assert_eq!(request.cookie("a"), Some("3"));
        assert_eq!(request.cookie("b"), Some("2"));
    }

    #[test]
    fn decodes_base64_body() {
        let request = Request::from_event(event(json!({
            "body": "aGVsbG8=",
            "isBase64Encoded": true,
            "requestContext": {"requestId": "r", "http": {"method": "POST", "path": "/"}}
        })))
        .unwrap();
        assert_eq!(request.body(), Some("hello"));
    }

    #[test]
    fn invalid_base64_body_is_an_error() {
        let err = Request::from_event(event(json!({
            "body": "not base64!",
            "isBase64Encoded": true,
            "requestContext": {"requestId": "r", "http": {"method": "POST", "path": "/"}}
        })))
        .unwrap_err();
        assert!(matches!(err, RequestError::Body(_)));
    }

    #[test]
    fn headers_collect_lowercase() {
        let headers: Headers = [("X-Hub-Signature-256", "sha256=00")].into_iter().collect();
        assert_eq!(headers.iter().next(), Some(("x-hub-signature-256", "sha256=00")));
    }
}
