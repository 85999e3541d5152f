//! Test utilities.
//!
//! [`EventBuilder`] produces the HTTP payload v2.0 events a Lambda function
//! URL would send; [`TestClient`] feeds them to any [`Handler`] through the
//! same entry point the runtime uses and wraps the result in a
//! [`TestResponse`].
//!
//! Every built event gets a fresh `requestId` unless one is set explicitly.
//!
//! ```
//! use easylambda_core::app::get;
//! use easylambda_core::testing::TestClient;
//!
//! let route = get("/health").handle(|_| Ok(())).unwrap();
//! let client = TestClient::new(route);
//! assert_eq!(client.get("/health").send().status().as_u16(), 204);
//! ```

use crate::app::{Context, Handler};
use crate::request::Request;
use crate::response::{Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Builder for HTTP payload v2.0 events.
#[derive(Debug, Clone)]
#[must_use]
pub struct EventBuilder {
    method: String,
    path: String,
    raw_query: String,
    headers: BTreeMap<String, String>,
    cookies: Vec<String>,
    body: Option<String>,
    is_base64_encoded: bool,
    request_id: String,
}

impl EventBuilder {
    pub fn new(method: &str, path: &str) -> Self {
        let id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            method: method.to_ascii_uppercase(),
            path: path.to_owned(),
            raw_query: String::new(),
            headers: BTreeMap::new(),
            cookies: Vec::new(),
            body: None,
            is_base64_encoded: false,
            request_id: format!("test-request-{id}"),
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: &str) -> Self {
        Self::new("POST", path)
    }

    pub fn put(path: &str) -> Self {
        Self::new("PUT", path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new("DELETE", path)
    }

    pub fn patch(path: &str) -> Self {
        Self::new("PATCH", path)
    }

    pub fn options(path: &str) -> Self {
        Self::new("OPTIONS", path)
    }

    /// Set the raw query string, without the leading `?`.
    pub fn query(mut self, raw: &str) -> Self {
        self.raw_query = raw.to_owned();
        self
    }

    /// Set a header, replacing any earlier value under the same name.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Append a `name=value` cookie.
    pub fn cookie(mut self, cookie: &str) -> Self {
        self.cookies.push(cookie.to_owned());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the body and set `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Self {
        let body = serde_json::to_string(value).expect("test body serializes to JSON");
        self.header("content-type", "application/json").body(body)
    }

    /// Mark the body as base64 encoded.
    pub fn base64_encoded(mut self, encoded: bool) -> Self {
        self.is_base64_encoded = encoded;
        self
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = id.into();
        self
    }

    /// Build the event.
    #[must_use]
    pub fn build(&self) -> Value {
        let user_agent = self
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("user-agent"))
            .map_or("easylambda-test", |(_, v)| v.as_str());
        let cookies = if self.cookies.is_empty() {
            Value::Null
        } else {
            json!(self.cookies)
        };
        json!({
            "version": "2.0",
            "routeKey": "$default",
            "rawPath": self.path,
            "rawQueryString": self.raw_query,
            "cookies": cookies,
            "headers": self.headers,
            "queryStringParameters": Value::Null,
            "requestContext": {
                "accountId": "anonymous",
                "apiId": "test",
                "domainName": "test.lambda-url.us-east-1.on.aws",
                "http": {
                    "method": self.method,
                    "path": self.path,
                    "protocol": "HTTP/1.1",
                    "sourceIp": "127.0.0.1",
                    "userAgent": user_agent,
                },
                "requestId": self.request_id,
                "stage": "$default",
                "time": "01/Jan/2024:00:00:00 +0000",
                "timeEpoch": 1_704_067_200_000_i64,
            },
            "body": self.body,
            "pathParameters": Value::Null,
            "isBase64Encoded": self.is_base64_encoded,
            "stageVariables": Value::Null,
        })
    }

    /// Build the event and normalize it into a [`Request`].
    #[must_use]
    pub fn into_request(self) -> Request {
        let event = serde_json::from_value(self.build()).expect("built event deserializes");
        Request::from_event(event).expect("built event is a valid request")
    }
}

/// Drives a [`Handler`] with synthetic events.
#[derive(Debug)]
pub struct TestClient<H> {
    handler: H,
}

impl<H: Handler> TestClient<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn request(&self, method: &str, path: &str) -> TestRequest<'_, H> {
        TestRequest {
            client: self,
            event: EventBuilder::new(method, path),
        }
    }

    pub fn get(&self, path: &str) -> TestRequest<'_, H> {
        self.request("GET", path)
    }

    pub fn post(&self, path: &str) -> TestRequest<'_, H> {
        self.request("POST", path)
    }

    pub fn put(&self, path: &str) -> TestRequest<'_, H> {
        self.request("PUT", path)
    }

    pub fn delete(&self, path: &str) -> TestRequest<'_, H> {
        self.request("DELETE", path)
    }

    pub fn patch(&self, path: &str) -> TestRequest<'_, H> {
        self.request("PATCH", path)
    }

    pub fn options(&self, path: &str) -> TestRequest<'_, H> {
        self.request("OPTIONS", path)
    }

    /// Send a prepared event.
    pub fn send(&self, event: &EventBuilder) -> Result<TestResponse, anyhow::Error> {
        let value = self.handler.call(event.build(), &Context::default())?;
        let response: Response = serde_json::from_value(value)?;
        Ok(TestResponse { response })
    }
}

/// A request being prepared by a [`TestClient`].
#[must_use]
pub struct TestRequest<'a, H> {
    client: &'a TestClient<H>,
    event: EventBuilder,
}

impl<H: Handler> TestRequest<'_, H> {
    pub fn query(mut self, raw: &str) -> Self {
        self.event = self.event.query(raw);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.event = self.event.header(name, value);
        self
    }

    pub fn cookie(mut self, cookie: &str) -> Self {
        self.event = self.event.cookie(cookie);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.event = self.event.body(body);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.event = self.event.json(value);
        self
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.event = self.event.request_id(id);
        self
    }

    /// Send, returning the fault if the handler raised one.
    pub fn try_send(self) -> Result<TestResponse, anyhow::Error> {
        self.client.send(&self.event)
    }

    /// Send, panicking on a fault.
    pub fn send(self) -> TestResponse {
        self.try_send().expect("handler raised a fault")
    }
}

/// Response returned by a [`TestClient`].
#[derive(Debug, Clone)]
pub struct TestResponse {
    response: Response,
}

impl TestResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.response.header(name)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.response.body()
    }

    /// Parse the body as JSON, panicking if it is not.
    #[must_use]
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_str(self.response.body()).expect("response body is JSON")
    }

    #[must_use]
    pub fn into_response(self) -> Response {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_unique() {
        let a = EventBuilder::get("/").into_request();
        let b = EventBuilder::get("/").into_request();
        assert_ne!(a.request_id(), b.request_id());
        let c = EventBuilder::get("/").request_id("fixed").into_request();
        assert_eq!(c.request_id(), "fixed");
    }

    #[test]
    fn built_event_round_trips_into_request() {
        let request = EventBuilder::post("/items/")
            .query("a=1")
            .header("X-Custom", "yes")
            .cookie("session=abc")
            .json(&json!({"k": "v"}))
            .into_request();
        assert_eq!(request.method(), "POST");
        assert_eq!(request.path(), "/items/");
        assert_eq!(request.query().last("a"), Some("1"));
        assert_eq!(request.header("x-custom"), Some("yes"));
        assert_eq!(request.cookie("session"), Some("abc"));
        assert_eq!(request.content_type(), Some("application/json"));
        assert_eq!(request.body(), Some(r#"{"k":"v"}"#));
    }

    #[test]
    fn base64_bodies() {
        use base64::Engine as _;
        let encoded = base64::engine::general_purpose::STANDARD.encode("plain");
        let request = EventBuilder::post("/")
            .body(encoded)
            .base64_encoded(true)
            .into_request();
        assert_eq!(request.body(), Some("plain"));
    }
}
