//! One template, different handlers per method.
//!
//! A [`MethodRouter`] lets a single Lambda function serve e.g. both the
//! `GET` verification handshake and the `POST` deliveries of a webhook.
//!
//! ```
//! use easylambda_core::method_router::MethodRouter;
//! use easylambda_core::plan::Param;
//! use easylambda_core::extract::Query;
//! use easylambda_core::response::Response;
//! use easylambda_core::testing::TestClient;
//!
//! let router = MethodRouter::new("/")
//!     .unwrap()
//!     .get(|route| {
//!         route
//!             .param(Param::new("challenge").annotate(Query::named("hub.challenge")))
//!             .handle(|args| Ok(Response::ok().with_body(args.get::<String>("challenge")?)))
//!     })
//!     .unwrap()
//!     .post(|route| route.handle(|_| Ok(())))
//!     .unwrap();
//!
//! let client = TestClient::new(router);
//! assert_eq!(client.get("/").query("hub.challenge=42").send().text(), "42");
//! assert_eq!(client.post("/").send().status().as_u16(), 204);
//! assert_eq!(client.put("/").send().status().as_u16(), 405);
//! ```

use crate::app::{Handler, Route, RouteBuilder, finish};
use crate::config::AppConfig;
use crate::error::{ConfigError, Error, HttpError};
use crate::request::Request;
use crate::response::Response;
use easylambda_router::{AllowedMethods, Method, RoutePattern};
use tracing::info_span;

/// Routes sharing one template, selected by method.
#[derive(Debug, Clone)]
pub struct MethodRouter {
    pattern: RoutePattern,
    routes: Vec<Route>,
    allowed: AllowedMethods,
    config: AppConfig,
}

impl MethodRouter {
    /// Create an empty router for a template.
    pub fn new(template: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: RoutePattern::compile(template)?,
            routes: Vec::new(),
            allowed: AllowedMethods::new(Vec::new()),
            config: AppConfig::default(),
        })
    }

    /// Configuration handed to routes built through this router.
    #[must_use]
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Mount an already-built route. Its template must be this router's and
    /// its methods must not overlap any mounted route.
    pub fn route(mut self, route: Route) -> Result<Self, ConfigError> {
        if route.pattern().template() != self.pattern.template() {
            return Err(ConfigError::TemplateMismatch {
                expected: self.pattern.template().to_owned(),
                found: route.pattern().template().to_owned(),
            });
        }
        if self.allowed.overlaps(route.methods()) {
            let clashing: AllowedMethods = route
                .methods()
                .methods()
                .iter()
                .copied()
                .filter(|m| self.allowed.contains(*m))
                .collect();
            return Err(ConfigError::MethodConflict {
                template: self.pattern.template().to_owned(),
                methods: clashing.header_value(),
            });
        }
        self.allowed = self.allowed.union(route.methods());
        self.routes.push(route);
        Ok(self)
    }

    /// Build and mount a route for the given methods.
    pub fn on<F>(self, methods: impl IntoIterator<Item = Method>, build: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(RouteBuilder) -> Result<Route, ConfigError>,
    {
        let builder = RouteBuilder::new(self.pattern.template())
            .methods(methods)
            .config(self.config.clone());
        let route = build(builder)?;
        self.route(route)
    }

    pub fn get<F>(self, build: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(RouteBuilder) -> Result<Route, ConfigError>,
    {
        self.on([Method::Get], build)
    }

    pub fn post<F>(self, build: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(RouteBuilder) -> Result<Route, ConfigError>,
    {
        self.on([Method::Post], build)
    }

    pub fn put<F>(self, build: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(RouteBuilder) -> Result<Route, ConfigError>,
    {
        self.on([Method::Put], build)
    }

    pub fn delete<F>(self, build: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(RouteBuilder) -> Result<Route, ConfigError>,
    {
        self.on([Method::Delete], build)
    }

    pub fn patch<F>(self, build: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(RouteBuilder) -> Result<Route, ConfigError>,
    {
        self.on([Method::Patch], build)
    }

    pub fn options<F>(self, build: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(RouteBuilder) -> Result<Route, ConfigError>,
    {
        self.on([Method::Options], build)
    }

    /// Methods with a mounted handler.
    #[must_use]
    pub fn allowed(&self) -> &AllowedMethods {
        &self.allowed
    }

    fn dispatch(&self, request: &Request) -> Result<Response, Error> {
        let route_match = self
            .pattern
            .matches(request.path())
            .ok_or_else(HttpError::not_found)?;
        let Some(route) = self
            .routes
            .iter()
            .find(|route| route.methods().allows(request.method()))
        else {
            return Err(HttpError::method_not_allowed()
                .with_header("Allow", self.allowed.header_value())
                .into());
        };
        route.respond(request, &route_match)
    }
}

impl Handler for MethodRouter {
    fn handle(&self, request: &Request) -> Result<Response, anyhow::Error> {
        let span = info_span!(
            "dispatch",
            app = %self.config.name,
            route = self.pattern.template(),
            request_id = request.request_id(),
            method = request.method(),
            path = request.path(),
        );
        let _enter = span.enter();
        finish(self.dispatch(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app;
    use crate::testing::TestClient;

    fn webhook() -> MethodRouter {
        MethodRouter::new("/webhook")
            .unwrap()
            .get(|route| route.handle(|_| Ok(Response::ok().with_body("verified"))))
            .unwrap()
            .post(|route| route.handle(|_| Ok(())))
            .unwrap()
    }

    #[test]
    fn selects_handler_by_method() {
        let client = TestClient::new(webhook());
        assert_eq!(client.get("/webhook").send().text(), "verified");
        assert_eq!(client.post("/webhook").send().status().as_u16(), 204);
    }

    #[test]
    fn unmounted_method_is_405_with_union_allow() {
        let response = TestClient::new(webhook()).delete("/webhook").send();
        assert_eq!(response.status().as_u16(), 405);
        assert_eq!(response.header("allow"), Some("GET, POST"));
    }

    #[test]
    fn unmatched_path_is_404() {
        let response = TestClient::new(webhook()).delete("/other").send();
        assert_eq!(response.status().as_u16(), 404);
    }

    #[test]
    fn overlapping_methods_are_rejected() {
        let err = webhook()
            .on([Method::Post, Method::Put], |route| route.handle(|_| Ok(())))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MethodConflict { ref methods, .. } if methods == "POST"));
    }

    #[test]
    fn mounted_route_must_share_template() {
        let other = app::put("/elsewhere").handle(|_| Ok(())).unwrap();
        let err = webhook().route(other).unwrap_err();
        assert!(matches!(err, ConfigError::TemplateMismatch { .. }));

        let same = app::put("/webhook").handle(|_| Ok(())).unwrap();
        let router = webhook().route(same).unwrap();
        assert_eq!(router.allowed().header_value(), "GET, POST, PUT");
    }

    #[test]
    fn routes_inherit_router_config() {
        let router = MethodRouter::new("/")
            .unwrap()
            .config(AppConfig::new().name("hooks"))
            .get(|route| route.handle(|_| Ok(())))
            .unwrap();
        assert_eq!(router.routes[0].config().name, "hooks");
    }
}
