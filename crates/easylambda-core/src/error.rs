//! Error taxonomy.
//!
//! Three layers of failure exist and they never mix:
//!
//! - [`HttpError`] is a classified failure. Wherever it is raised (route
//!   matching, parameter binding, a dependency, the handler body) it is
//!   turned into a response carrying its status code.
//! - [`Error::Fault`] is anything unclassified. It is not translated; the
//!   dispatcher hands it back to the host runtime as an `Err`.
//! - [`ConfigError`] is raised while a handler is being registered and means
//!   the handler never becomes invocable.

use crate::response::{Response, StatusCode};
use easylambda_router::RouteError;
use serde::Serialize;
use serde_json::json;

/// One entry of a 422 response body, in FastAPI's shape.
///
/// `loc[0]` names where the value was looked for (`path`, `query`, `body`,
/// ...), `loc[1]` the parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationError {
    /// Create a validation entry.
    #[must_use]
    pub fn new(
        loc: impl IntoIterator<Item = impl Into<String>>,
        msg: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            loc: loc.into_iter().map(Into::into).collect(),
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    /// A required value was not supplied.
    #[must_use]
    pub fn missing(location: &str, name: &str) -> Self {
        Self::new([location, name], "Field required", "missing")
    }

    /// A supplied value could not be converted to the declared type.
    #[must_use]
    pub fn invalid(location: &str, name: &str, msg: impl Into<String>) -> Self {
        Self::new([location, name], msg, "value_error")
    }
}

/// A classified failure carrying an HTTP status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {}", self.message())]
pub struct HttpError {
    /// Status code of the response this error becomes.
    pub status: StatusCode,
    /// Human readable message. Defaults to the reason phrase.
    pub detail: Option<String>,
    /// Field-level validation entries (422 only, in practice).
    pub errors: Vec<ValidationError>,
    /// Extra response headers, e.g. `Allow` on a 405.
    pub headers: Vec<(String, String)>,
}

impl HttpError {
    /// Create an error with an arbitrary status code.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            detail: None,
            errors: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// 405 Method Not Allowed.
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED)
    }

    /// 413 Payload Too Large.
    #[must_use]
    pub fn payload_too_large() -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE)
    }

    /// 415 Unsupported Media Type.
    #[must_use]
    pub fn unsupported_media_type() -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE)
    }

    /// 422 Unprocessable Entity.
    #[must_use]
    pub fn unprocessable_entity() -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY)
    }

    /// 422 for a required parameter that could not be found.
    #[must_use]
    pub fn missing(location: &str, name: &str) -> Self {
        Self::unprocessable_entity()
            .with_detail(format!("missing required parameter `{name}`"))
            .with_error(ValidationError::missing(location, name))
    }

    /// Set the message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Append a validation entry.
    #[must_use]
    pub fn with_error(mut self, error: ValidationError) -> Self {
        self.errors.push(error);
        self
    }

    /// Add a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The message, falling back to the status reason phrase.
    #[must_use]
    pub fn message(&self) -> &str {
        self.detail
            .as_deref()
            .unwrap_or_else(|| self.status.canonical_reason())
    }

    /// Build the response this error stands for.
    ///
    /// The body is `{"detail": [...]}` when validation entries are present and
    /// `{"detail": "<message>"}` otherwise.
    #[must_use]
    pub fn to_response(&self) -> Response {
        let body = if self.errors.is_empty() {
            json!({ "detail": self.message() })
        } else {
            json!({ "detail": self.errors })
        };
        let mut response = Response::new(self.status)
            .with_header("Content-Type", "application/json")
            .with_body(body.to_string());
        for (name, value) in &self.headers {
            response = response.with_header(name.clone(), value.clone());
        }
        response
    }
}

/// Failure raised by a handler, a dependency or a provider.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Classified; becomes a response.
    #[error(transparent)]
    Http(#[from] HttpError),
    /// Unclassified; returned to the host runtime untouched.
    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

impl Error {
    /// Wrap any error as an unclassified fault.
    pub fn fault(err: impl Into<anyhow::Error>) -> Self {
        Self::Fault(err.into())
    }

    /// The classified error, if this is one.
    #[must_use]
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(err) => Some(err),
            Self::Fault(_) => None,
        }
    }
}

/// Registration-time failure. A handler that produces one is never wired in.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(
        "parameter `{param}` of `{owner}` has no binding: annotate it with a provider, \
         give it a default, or name it after a route placeholder"
    )]
    UnboundParameter { owner: String, param: String },

    #[error("parameter `{param}` of `{owner}` is declared more than once")]
    DuplicateParameter { owner: String, param: String },

    #[error("parameter `{param}` of `{owner}` is a list but its {source_kind} binding only yields single values")]
    ListUnsupported {
        owner: String,
        param: String,
        source_kind: String,
    },

    #[error("route `{template}` already has a handler for {methods}")]
    MethodConflict { template: String, methods: String },

    #[error("route `{found}` cannot be mounted on a method router for `{expected}`")]
    TemplateMismatch { expected: String, found: String },

    #[error("environment variable `{name}` has an invalid value `{value}`: {reason}")]
    InvalidEnv {
        name: String,
        value: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn body_json(response: &Response) -> Value {
        serde_json::from_str(response.body()).unwrap()
    }

    #[test]
    fn message_defaults_to_reason_phrase() {
        assert_eq!(HttpError::not_found().message(), "Not Found");
        assert_eq!(
            HttpError::unauthorized()
                .with_detail("Invalid signature.")
                .message(),
            "Invalid signature."
        );
    }

    #[test]
    fn plain_error_response() {
        let response = HttpError::unauthorized()
            .with_detail("Invalid signature.")
            .to_response();
        assert_eq!(response.status().as_u16(), 401);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(
            body_json(&response),
            json!({ "detail": "Invalid signature." })
        );
    }

    #[test]
    fn validation_error_response() {
        let response = HttpError::missing("query", "limit").to_response();
        assert_eq!(response.status().as_u16(), 422);
        assert_eq!(
            body_json(&response),
            json!({
                "detail": [
                    { "loc": ["query", "limit"], "msg": "Field required", "type": "missing" }
                ]
            })
        );
    }

    #[test]
    fn extra_headers_are_kept() {
        let response = HttpError::method_not_allowed()
            .with_header("Allow", "GET, POST")
            .to_response();
        assert_eq!(response.header("allow"), Some("GET, POST"));
    }

    #[test]
    fn display_includes_status() {
        let err = HttpError::unprocessable_entity().with_detail("bad");
        assert_eq!(err.to_string(), "422 Unprocessable Entity: bad");
        assert_eq!(HttpError::not_found().to_string(), "404 Not Found: Not Found");

        let boxed: Box<dyn std::error::Error> = Box::new(HttpError::unauthorized());
        assert!(boxed.source().is_none());
    }

    #[test]
    fn error_conversions() {
        let err: Error = HttpError::forbidden().into();
        assert_eq!(err.as_http().map(|e| e.status), Some(StatusCode::FORBIDDEN));

        let err: Error = anyhow::anyhow!("boom").into();
        assert!(err.as_http().is_none());
        assert_eq!(err.to_string(), "boom");
    }
}
