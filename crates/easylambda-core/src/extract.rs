//! Parameter providers.
//!
//! A [`Provider`] is a strategy object that knows how to find one value for a
//! handler parameter in the incoming request. Built-in providers cover the
//! path, the query string, headers, cookies and the body; user code implements
//! the trait for anything else (signature checks, tenant lookup, ...).
//!
//! Every lookup ends in one of three [`Resolution`]s:
//!
//! - `Resolved(value)`: the value was found
//! - `Missing`: nothing was there; the parameter default applies, or a 422
//! - `Invalid(error)`: something was there but unusable; always propagated
//!
//! # Example
//!
//! ```
//! use easylambda_core::extract::{Provider, Resolution, Source};
//! use serde_json::Value;
//!
//! /// Resolves to the tenant named in the `x-tenant` header, upper-cased.
//! #[derive(Debug, Default)]
//! struct Tenant;
//!
//! impl Provider for Tenant {
//!     fn get(&self, source: &Source<'_>, _key: &str) -> Resolution {
//!         match source.request.header("x-tenant") {
//!             Some(tenant) => Resolution::Resolved(Value::String(tenant.to_uppercase())),
//!             None => Resolution::Missing,
//!         }
//!     }
//! }
//! ```

use crate::context::RequestContext;
use crate::dependency::CacheKey;
use crate::error::{Error, HttpError, ValidationError};
use crate::request::Request;
use easylambda_http::{APPLICATION_JSON, FORM_URLENCODED, MULTIPART_FORM_DATA, QueryParams};
use easylambda_router::RouteMatch;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Where a parameter's value comes from. Used as `loc[0]` in 422 bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Path,
    Query,
    Header,
    Cookie,
    Body,
    Form,
    File,
    Dependency,
    Default,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
            Self::Form => "form",
            Self::File => "file",
            Self::Dependency => "dependency",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a provider lookup.
#[derive(Debug)]
pub enum Resolution {
    Resolved(Value),
    Missing,
    Invalid(Error),
}

impl Resolution {
    /// Shorthand for `Resolution::Invalid(err.into())`.
    pub fn invalid(err: impl Into<Error>) -> Self {
        Self::Invalid(err.into())
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl From<Option<Value>> for Resolution {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Missing, Self::Resolved)
    }
}

/// Everything a provider may look at for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    pub request: &'a Request,
    pub route: &'a RouteMatch,
    pub context: &'a RequestContext,
}

/// Strategy for resolving a parameter value.
pub trait Provider: fmt::Debug + Send + Sync {
    /// Location reported in validation errors.
    fn kind(&self) -> SourceKind {
        SourceKind::Dependency
    }

    /// Explicit lookup key, if one was configured.
    fn key(&self) -> Option<&str> {
        None
    }

    /// Lookup key for a parameter when no explicit key was configured.
    fn default_key(&self, param: &str) -> String {
        param.to_owned()
    }

    /// Whether [`Provider::get_list`] is implemented.
    ///
    /// Checked when a handler is registered: a list parameter bound to a
    /// provider that returns `false` here is a configuration error.
    fn supports_list(&self) -> bool {
        false
    }

    /// Resolve a single value.
    fn get(&self, source: &Source<'_>, key: &str) -> Resolution;

    /// Resolve every value under `key`.
    fn get_list(&self, _source: &Source<'_>, _key: &str) -> Resolution {
        Resolution::invalid(anyhow::anyhow!(
            "{} provider does not resolve lists",
            self.kind()
        ))
    }
}

fn strings(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}

/// Path placeholder captured by the route template.
#[derive(Debug, Clone, Default)]
pub struct Path {
    key: Option<String>,
}

impl Path {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a placeholder other than the parameter's own name.
    #[must_use]
    pub fn named(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }
}

impl Provider for Path {
    fn kind(&self) -> SourceKind {
        SourceKind::Path
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn get(&self, source: &Source<'_>, key: &str) -> Resolution {
        source
            .route
            .get(key)
            .map(|value| Value::String(value.to_owned()))
            .into()
    }
}

/// Query string parameter.
///
/// Single-valued lookups take the last occurrence; list lookups return every
/// occurrence and resolve to an empty list rather than `Missing`.
#[derive(Debug, Clone, Default)]
pub struct Query {
    key: Option<String>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key that is not a valid parameter name, e.g. `hub.mode`.
    #[must_use]
    pub fn named(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }
}

impl Provider for Query {
    fn kind(&self) -> SourceKind {
        SourceKind::Query
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn supports_list(&self) -> bool {
        true
    }

    fn get(&self, source: &Source<'_>, key: &str) -> Resolution {
        source
            .request
            .query()
            .last(key)
            .map(|value| Value::String(value.to_owned()))
            .into()
    }

    fn get_list(&self, source: &Source<'_>, key: &str) -> Resolution {
        Resolution::Resolved(strings(source.request.query().all(key)))
    }
}

/// Request header.
///
/// Without an explicit key, underscores in the parameter name become hyphens:
/// a parameter `user_agent` reads the `user-agent` header.
#[derive(Debug, Clone, Default)]
pub struct Header {
    key: Option<String>,
}

impl Header {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn named(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }
}

impl Provider for Header {
    fn kind(&self) -> SourceKind {
        SourceKind::Header
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn default_key(&self, param: &str) -> String {
        param.replace('_', "-")
    }

    fn get(&self, source: &Source<'_>, key: &str) -> Resolution {
        source
            .request
            .header(key)
            .map(|value| Value::String(value.to_owned()))
            .into()
    }
}

/// Cookie value.
#[derive(Debug, Clone, Default)]
pub struct Cookie {
    key: Option<String>,
}

impl Cookie {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn named(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }
}

impl Provider for Cookie {
    fn kind(&self) -> SourceKind {
        SourceKind::Cookie
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn supports_list(&self) -> bool {
        true
    }

    fn get(&self, source: &Source<'_>, key: &str) -> Resolution {
        source
            .request
            .cookie(key)
            .map(|value| Value::String(value.to_owned()))
            .into()
    }

    fn get_list(&self, source: &Source<'_>, key: &str) -> Resolution {
        let values: Vec<Value> = source
            .request
            .cookies()
            .iter()
            .filter(|(name, _)| name == key)
            .map(|(_, value)| Value::String(value.clone()))
            .collect();
        Resolution::Resolved(Value::Array(values))
    }
}

/// The whole request body.
///
/// `application/json` bodies are parsed once per request id and memoized in
/// the invocation cache. Other content types resolve to the raw body text.
/// A request without a `Content-Type`, or without a body, resolves to
/// `Missing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Body;

impl Body {
    fn raw<'a>(source: &Source<'a>) -> Result<Option<&'a str>, Error> {
        let Some(body) = source.request.body() else {
            return Ok(None);
        };
        let limit = source.context.max_body_size();
        if body.len() > limit {
            return Err(HttpError::payload_too_large()
                .with_detail(format!("request body exceeds {limit} bytes"))
                .into());
        }
        Ok(Some(body))
    }

    fn parsed(source: &Source<'_>, body: &str) -> Result<Arc<Value>, Error> {
        let cache = source.context.dependency_cache();
        let key = CacheKey::body(source.request.request_id());
        if let Some(value) = cache.get(&key) {
            return Ok(value);
        }
        let value: Value = serde_json::from_str(body).map_err(|err| {
            HttpError::unprocessable_entity().with_error(ValidationError::new(
                ["body"],
                format!("JSON decode error: {err}"),
                "json_invalid",
            ))
        })?;
        tracing::trace!(request_id = source.request.request_id(), "parsed JSON body");
        Ok(cache.insert(key, value))
    }
}

impl Provider for Body {
    fn kind(&self) -> SourceKind {
        SourceKind::Body
    }

    fn supports_list(&self) -> bool {
        true
    }

    fn get(&self, source: &Source<'_>, _key: &str) -> Resolution {
        let Some(content_type) = source.request.content_type() else {
            return Resolution::Missing;
        };
        let body = match Self::raw(source) {
            Ok(Some(body)) => body,
            Ok(None) => return Resolution::Missing,
            Err(err) => return Resolution::Invalid(err),
        };
        if content_type != APPLICATION_JSON {
            return Resolution::Resolved(Value::String(body.to_owned()));
        }
        match Self::parsed(source, body) {
            Ok(value) => Resolution::Resolved(Value::clone(&value)),
            Err(err) => Resolution::Invalid(err),
        }
    }

    fn get_list(&self, source: &Source<'_>, _key: &str) -> Resolution {
        if source.request.content_type() != Some(APPLICATION_JSON) {
            return Resolution::Missing;
        }
        let body = match Self::raw(source) {
            Ok(Some(body)) => body,
            Ok(None) => return Resolution::Missing,
            Err(err) => return Resolution::Invalid(err),
        };
        match Self::parsed(source, body) {
            Ok(value) if value.is_array() => Resolution::Resolved(Value::clone(&value)),
            Ok(_) => Resolution::Missing,
            Err(err) => Resolution::Invalid(err),
        }
    }
}

/// Field of an `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone, Default)]
pub struct Form {
    key: Option<String>,
}

impl Form {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn named(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }

    /// Field map `{name: [values...]}`, parsed once per request id.
    fn fields(source: &Source<'_>) -> Result<Option<Arc<Value>>, Error> {
        if source.request.content_type() != Some(FORM_URLENCODED) {
            return Ok(None);
        }
        let Some(body) = Body::raw(source)? else {
            return Ok(None);
        };
        let cache = source.context.dependency_cache();
        let key = CacheKey::form(source.request.request_id());
        if let Some(fields) = cache.get(&key) {
            return Ok(Some(fields));
        }
        let parsed = QueryParams::parse(body);
        let fields: Map<String, Value> = parsed
            .keys()
            .map(|name| (name.to_owned(), strings(parsed.all(name))))
            .collect();
        Ok(Some(cache.insert(key, Value::Object(fields))))
    }

    fn values<'v>(fields: &'v Value, key: &str) -> &'v [Value] {
        fields
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Provider for Form {
    fn kind(&self) -> SourceKind {
        SourceKind::Form
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn supports_list(&self) -> bool {
        true
    }

    fn get(&self, source: &Source<'_>, key: &str) -> Resolution {
        match Self::fields(source) {
            Ok(Some(fields)) => Self::values(&fields, key).last().cloned().into(),
            Ok(None) => Resolution::Missing,
            Err(err) => Resolution::Invalid(err),
        }
    }

    fn get_list(&self, source: &Source<'_>, key: &str) -> Resolution {
        match Self::fields(source) {
            Ok(Some(fields)) => Resolution::Resolved(Value::Array(Self::values(&fields, key).to_vec())),
            Ok(None) => Resolution::Missing,
            Err(err) => Resolution::Invalid(err),
        }
    }
}

/// Uploaded file from a `multipart/form-data` body.
///
/// Multipart decoding is not implemented: a multipart request resolves to
/// 415, anything else to `Missing`.
#[derive(Debug, Clone, Default)]
pub struct File {
    key: Option<String>,
}

impl File {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn named(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }
}

impl Provider for File {
    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn get(&self, source: &Source<'_>, _key: &str) -> Resolution {
        if source.request.content_type() == Some(MULTIPART_FORM_DATA) {
            Resolution::invalid(
                HttpError::unsupported_media_type()
                    .with_detail("multipart/form-data uploads are not supported"),
            )
        } else {
            Resolution::Missing
        }
    }
}

/// A fixed value. Backs parameters that have a default and no other binding.
#[derive(Debug, Clone, Default)]
pub struct Constant(pub Value);

impl Provider for Constant {
    fn kind(&self) -> SourceKind {
        SourceKind::Default
    }

    fn supports_list(&self) -> bool {
        true
    }

    fn get(&self, _source: &Source<'_>, _key: &str) -> Resolution {
        Resolution::Resolved(self.0.clone())
    }

    fn get_list(&self, _source: &Source<'_>, _key: &str) -> Resolution {
        Resolution::Resolved(self.0.clone())
    }
}
