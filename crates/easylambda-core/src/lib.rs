//! Core types and dispatch for easylambda.
//!
//! This crate provides:
//!
//! - [`Event`] / [`Request`]: the Lambda HTTP payload and its normalized form
//! - [`Provider`]s that look up parameter values in a request
//! - [`BindingPlan`]s compiled from [`Param`] declarations at registration
//! - [`Depends`] for nested, cached dependencies
//! - [`Route`] and [`MethodRouter`], the dispatchers
//! - [`Response`], [`IntoResponse`] and the [`HttpError`] taxonomy
//!
//! Most users should depend on the `easylambda` facade crate instead.

#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod context;
pub mod dependency;
pub mod error;
pub mod extract;
pub mod logging;
pub mod method_router;
pub mod plan;
pub mod request;
pub mod response;
pub mod testing;
pub mod validate;

pub use app::{Context, Handler, Route, RouteBuilder};
pub use config::{AppConfig, LogConfig, LogFormat};
pub use context::{BodyLimitConfig, RequestContext};
pub use dependency::{CacheKey, CycleError, DependencyCache, DependencyId, Depends, ResolutionStack};
pub use error::{ConfigError, Error, HttpError, ValidationError};
pub use extract::{
    Body, Constant, Cookie, File, Form, Header, Path, Provider, Query, Resolution, Source,
    SourceKind,
};
pub use method_router::MethodRouter;
pub use plan::{Arguments, Binding, BindingEntry, BindingPlan, Metadata, Param, TypeHint};
pub use request::{Event, EventContext, EventHttp, Headers, Request, RequestError};
pub use response::{IntoResponse, Json, Response, StatusCode};

pub use easylambda_router::{AllowedMethods, Method, RouteError, RouteMatch, RoutePattern};
