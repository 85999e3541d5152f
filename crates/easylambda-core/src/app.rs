//! Route registration and dispatch.
//!
//! A [`Route`] is one handler bound to one template and a set of methods.
//! Registration goes through [`RouteBuilder`]: the template and the parameter
//! list are compiled when [`RouteBuilder::handle`] is called, so a route that
//! exists is known to be invocable.
//!
//! Dispatching an event runs a fixed sequence:
//!
//! 1. match the path against the template, or 404
//! 2. check the method, or 405 with an `Allow` header
//! 3. bind the parameters (422 for missing or malformed values)
//! 4. call the handler
//! 5. serialize its result
//!
//! Every [`HttpError`] raised along the way becomes a response. Anything else
//! is a fault and is returned to the Lambda runtime as an error.
//!
//! # Example
//!
//! ```
//! use easylambda_core::app::{Handler, get};
//! use easylambda_core::plan::Param;
//! use easylambda_core::response::Json;
//! use easylambda_core::testing::EventBuilder;
//! use serde_json::json;
//!
//! let read_item = get("/items/{item_id}")
//!     .param(Param::new("item_id"))
//!     .handle(|args| {
//!         let item_id: i64 = args.get("item_id")?;
//!         Ok(Json(json!({ "item_id": item_id })))
//!     })
//!     .unwrap();
//!
//! let event = EventBuilder::get("/items/123").build();
//! let response = read_item.call(event, &Default::default()).unwrap();
//! assert_eq!(response["statusCode"], 200);
//! assert_eq!(response["body"], r#"{"item_id":123}"#);
//! ```

use crate::config::AppConfig;
use crate::context::RequestContext;
use crate::error::{ConfigError, Error, HttpError};
use crate::extract::Source;
use crate::plan::{Arguments, BindingPlan, Param};
use crate::request::{Event, Request};
use crate::response::{IntoResponse, Response};
use anyhow::Context as _;
use easylambda_router::{AllowedMethods, Method, RouteMatch, RoutePattern};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info_span};

type BoxHandler = Arc<dyn Fn(&Arguments<'_>) -> Result<Response, Error> + Send + Sync>;

/// Invocation metadata supplied by the Lambda runtime.
///
/// Handlers never see it; it is accepted so the dispatcher has the same shape
/// as a Lambda entry point.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub aws_request_id: Option<String>,
    pub function_name: Option<String>,
    pub function_version: Option<String>,
    pub invoked_function_arn: Option<String>,
    /// Milliseconds since the epoch after which the runtime kills the call.
    pub deadline_ms: Option<u64>,
}

/// A Lambda entry point: event in, proxy result out.
pub trait Handler: Send + Sync {
    /// Handle a normalized request.
    fn handle(&self, request: &Request) -> Result<Response, anyhow::Error>;

    /// Handle a raw event.
    ///
    /// A malformed envelope is a fault: it can only come from a misconfigured
    /// trigger, never from a client.
    fn call(&self, event: Value, context: &Context) -> Result<Value, anyhow::Error> {
        let event: Event =
            serde_json::from_value(event).context("event is not an HTTP payload v2.0 envelope")?;
        let request = Request::from_event(event)?;
        debug!(
            request_id = request.request_id(),
            aws_request_id = context.aws_request_id.as_deref(),
            "invoked"
        );
        let response = self.handle(&request)?;
        Ok(serde_json::to_value(response)?)
    }
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle(&self, request: &Request) -> Result<Response, anyhow::Error> {
        (**self).handle(request)
    }
}

impl<H: Handler + ?Sized> Handler for &H {
    fn handle(&self, request: &Request) -> Result<Response, anyhow::Error> {
        (**self).handle(request)
    }
}

/// Map the outcome of a dispatch to what the runtime receives.
pub(crate) fn finish(result: Result<Response, Error>) -> Result<Response, anyhow::Error> {
    match result {
        Ok(response) => {
            debug!(status = response.status().as_u16(), "request handled");
            Ok(response)
        }
        Err(Error::Http(err)) => {
            debug!(status = err.status.as_u16(), detail = err.message(), "request rejected");
            Ok(err.to_response())
        }
        Err(Error::Fault(fault)) => {
            error!(error = %format!("{fault:#}"), "handler fault");
            Err(fault)
        }
    }
}

/// Builder for a [`Route`].
#[must_use]
pub struct RouteBuilder {
    template: String,
    methods: AllowedMethods,
    name: Option<String>,
    params: Vec<Param>,
    config: AppConfig,
}

impl RouteBuilder {
    /// Start a route accepting every method.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            methods: AllowedMethods::all(),
            name: None,
            params: Vec::new(),
            config: AppConfig::default(),
        }
    }

    /// Restrict the accepted methods.
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Name used in logs and registration errors. Defaults to the template.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Declare a parameter.
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Declare several parameters.
    pub fn params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.params.extend(params);
        self
    }

    /// Compile the route and attach its handler.
    pub fn handle<F, R>(self, handler: F) -> Result<Route, ConfigError>
    where
        F: Fn(&Arguments<'_>) -> Result<R, Error> + Send + Sync + 'static,
        R: IntoResponse,
    {
        let pattern = RoutePattern::compile(&self.template)?;
        let name = self.name.unwrap_or_else(|| self.template.clone());
        let plan = BindingPlan::compile(&name, self.params, Some(&pattern))?;
        debug!(
            route = %name,
            template = pattern.template(),
            methods = %self.methods.header_value(),
            params = plan.entries().len(),
            "route registered"
        );
        let handler: BoxHandler =
            Arc::new(move |args: &Arguments<'_>| handler(args)?.into_response());
        Ok(Route {
            name,
            pattern,
            methods: self.methods,
            plan,
            handler,
            config: self.config,
        })
    }
}

/// Start a route accepting every method.
pub fn route(template: impl Into<String>) -> RouteBuilder {
    RouteBuilder::new(template)
}

/// Start a `GET` route.
pub fn get(template: impl Into<String>) -> RouteBuilder {
    RouteBuilder::new(template).methods([Method::Get])
}

/// Start a `POST` route.
pub fn post(template: impl Into<String>) -> RouteBuilder {
    RouteBuilder::new(template).methods([Method::Post])
}

/// Start a `PUT` route.
pub fn put(template: impl Into<String>) -> RouteBuilder {
    RouteBuilder::new(template).methods([Method::Put])
}

/// Start a `DELETE` route.
pub fn delete(template: impl Into<String>) -> RouteBuilder {
    RouteBuilder::new(template).methods([Method::Delete])
}

/// Start a `PATCH` route.
pub fn patch(template: impl Into<String>) -> RouteBuilder {
    RouteBuilder::new(template).methods([Method::Patch])
}

/// Start an `OPTIONS` route.
pub fn options(template: impl Into<String>) -> RouteBuilder {
    RouteBuilder::new(template).methods([Method::Options])
}

/// A registered handler.
#[derive(Clone)]
pub struct Route {
    name: String,
    pattern: RoutePattern,
    methods: AllowedMethods,
    plan: BindingPlan,
    handler: BoxHandler,
    config: AppConfig,
}

impl Route {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    #[must_use]
    pub fn methods(&self) -> &AllowedMethods {
        &self.methods
    }

    #[must_use]
    pub fn plan(&self) -> &BindingPlan {
        &self.plan
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn dispatch(&self, request: &Request) -> Result<Response, Error> {
        let route_match = self
            .pattern
            .matches(request.path())
            .ok_or_else(HttpError::not_found)?;
        if !self.methods.allows(request.method()) {
            return Err(HttpError::method_not_allowed()
                .with_header("Allow", self.methods.header_value())
                .into());
        }
        self.respond(request, &route_match)
    }

    /// Bind and call, once the path and method are known to match.
    pub(crate) fn respond(&self, request: &Request, route_match: &RouteMatch) -> Result<Response, Error> {
        let context = RequestContext::with_body_limit(request.request_id(), self.config.max_body_size);
        let source = Source {
            request,
            route: route_match,
            context: &context,
        };
        let args = self.plan.bind(&source)?;
        (self.handler)(&args)
    }
}

impl Handler for Route {
    fn handle(&self, request: &Request) -> Result<Response, anyhow::Error> {
        let span = info_span!(
            "dispatch",
            app = %self.config.name,
            route = %self.name,
            request_id = request.request_id(),
            method = request.method(),
            path = request.path(),
        );
        let _enter = span.enter();
        finish(self.dispatch(request))
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("methods", &self.methods)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Body, Query};
    use crate::response::{Json, StatusCode};
    use crate::testing::{EventBuilder, TestClient};
    use serde_json::json;

    #[test]
    fn not_found_wins_over_method_not_allowed() {
        let route = get("/items/{item_id}")
            .param(Param::new("item_id"))
            .handle(|_| Ok(()))
            .unwrap();
        let client = TestClient::new(route);

        assert_eq!(client.post("/other").send().status().as_u16(), 404);

        let response = client.post("/items/1").send();
        assert_eq!(response.status().as_u16(), 405);
        assert_eq!(response.header("allow"), Some("GET"));
        assert_eq!(response.json::<Value>(), json!({"detail": "Method Not Allowed"}));
    }

    #[test]
    fn unsupported_method_is_405() {
        let route = route("/").handle(|_| Ok(())).unwrap();
        let response = TestClient::new(route).request("HEAD", "/").send();
        assert_eq!(response.status().as_u16(), 405);
        assert_eq!(
            response.header("Allow"),
            Some("GET, POST, PUT, DELETE, PATCH, OPTIONS")
        );
    }

    #[test]
    fn handler_http_error_becomes_response() {
        let route = get("/")
            .handle(|_| -> Result<(), Error> {
                Err(HttpError::new(StatusCode::IM_A_TEAPOT).with_detail("short and stout").into())
            })
            .unwrap();
        let response = TestClient::new(route).get("/").send();
        assert_eq!(response.status().as_u16(), 418);
        assert_eq!(response.json::<Value>(), json!({"detail": "short and stout"}));
    }

    #[test]
    fn handler_fault_reaches_the_runtime() {
        let route = get("/")
            .handle(|_| -> Result<(), Error> { Err(anyhow::anyhow!("database unreachable").into()) })
            .unwrap();
        let err = TestClient::new(route).get("/").try_send().unwrap_err();
        assert_eq!(err.to_string(), "database unreachable");
    }

    #[test]
    fn malformed_envelope_is_a_fault() {
        let route = get("/").handle(|_| Ok(())).unwrap();
        assert!(route.call(json!({"not": "an event"}), &Context::default()).is_err());
    }

    #[test]
    fn registration_errors() {
        let err = get("/items/").param(Param::new("q")).handle(|_| Ok(())).unwrap_err();
        assert!(matches!(err, ConfigError::UnboundParameter { .. }));

        let err = get("/items/{bad-name}").handle(|_| Ok(())).unwrap_err();
        assert!(matches!(err, ConfigError::Route(_)));
    }

    #[test]
    fn name_defaults_to_template() {
        let route = get("/items/").handle(|_| Ok(())).unwrap();
        assert_eq!(route.name(), "/items/");
        let route = get("/items/").name("list_items").handle(|_| Ok(())).unwrap();
        assert_eq!(route.name(), "list_items");
    }

    #[test]
    fn body_limit_follows_config() {
        let route = post("/items/")
            .config(AppConfig::new().max_body_size(8))
            .param(Param::new("item").annotate(Body))
            .handle(|args| Ok(Json(args.get::<Value>("item")?)))
            .unwrap();
        let response = TestClient::new(route)
            .post("/items/")
            .json(&json!({"name": "too long for the limit"}))
            .send();
        assert_eq!(response.status().as_u16(), 413);
    }

    #[test]
    fn query_params_and_defaults() {
        let route = get("/items/")
            .params([
                Param::new("skip").annotate(Query::new()).with_default(0),
                Param::new("limit").annotate(Query::new()).with_default(10),
            ])
            .handle(|args| {
                let skip: usize = args.get("skip")?;
                let limit: usize = args.get("limit")?;
                Ok(Json(json!([skip, limit])))
            })
            .unwrap();
        let client = TestClient::new(route);
        assert_eq!(client.get("/items/").send().json::<Value>(), json!([0, 10]));
        assert_eq!(
            client.get("/items/").query("limit=3").send().json::<Value>(),
            json!([0, 3])
        );
        assert_eq!(client.get("/items/").query("limit=x").send().status().as_u16(), 422);
    }
}
