//! FastAPI-style parameter injection and routing for AWS Lambda HTTP handlers.
//!
//! easylambda turns a function with declared parameters into a Lambda entry
//! point for function URLs and API Gateway HTTP APIs (payload format 2.0):
//!
//! - **Declared parameters**: each [`Param`] names where its value comes from
//!   (path, query, header, cookie, body, a dependency) and what happens when it
//!   is missing
//! - **Registration-time checks**: a parameter with no possible source fails
//!   at registration, not on the first request
//! - **Dependencies**: [`Depends`] nests functions with their own parameters,
//!   cached once per invocation
//! - **FastAPI-shaped errors**: 404, 405 with `Allow`, 422 with `loc`/`msg`/`type`
//!
//! # Quick Start
//!
//! ```
//! use easylambda::prelude::*;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Item {
//!     name: String,
//!     price: f64,
//! }
//!
//! let create_item = post("/items/")
//!     .param(Param::new("item").annotate(Body))
//!     .handle(|args| {
//!         let item: Item = args.get("item")?;
//!         Ok(Json(item))
//!     })
//!     .unwrap();
//!
//! let client = TestClient::new(create_item);
//! let response = client
//!     .post("/items/")
//!     .json(&serde_json::json!({"name": "Foo", "price": "9.5"}))
//!     .send();
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.text(), r#"{"name":"Foo","price":9.5}"#);
//! ```
//!
//! Deployed, the route is driven by the runtime through [`Handler::call`],
//! which takes the raw event JSON and returns the proxy result JSON.
//!
//! # Crate Structure
//!
//! - [`easylambda_core`]: Dispatch, providers, binding plans, errors
//! - [`easylambda_http`]: Query string, cookie, content-type and body codecs
//! - [`easylambda_router`]: Route template compilation and matching

#![forbid(unsafe_code)]

pub use easylambda_core as core;
pub use easylambda_http as http;
pub use easylambda_router as router;

pub use easylambda_core::app::{delete, get, options, patch, post, put, route};
pub use easylambda_core::{
    AppConfig, Arguments, BindingPlan, ConfigError, Context, Depends, Error, Event, Handler,
    HttpError, IntoResponse, Json, LogConfig, LogFormat, Metadata, Method, MethodRouter, Param,
    Request, Response, Route, RouteBuilder, RouteMatch, StatusCode, ValidationError,
};

pub use easylambda_core::logging::init as init_logging;

/// Parameter providers.
pub mod extract {
    pub use easylambda_core::extract::{
        Body, Constant, Cookie, File, Form, Header, Path, Provider, Query, Resolution, Source,
        SourceKind,
    };
}

/// Testing utilities module.
pub mod testing {
    pub use easylambda_core::testing::{EventBuilder, TestClient, TestRequest, TestResponse};
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::extract::{
        Body, Cookie, Form, Header, Path, Provider, Query, Resolution, Source,
    };
    pub use crate::testing::{EventBuilder, TestClient};
    pub use crate::{
        AppConfig, Arguments, ConfigError, Context, Depends, Error, Handler, HttpError,
        IntoResponse, Json, Metadata, Method, MethodRouter, Param, Request, Response, Route,
        StatusCode, delete, get, options, patch, post, put, route,
    };
    pub use serde::{Deserialize, Serialize};
}
