//! Route template matching.
//!
//! This crate compiles `{name}` route templates into anchored patterns and
//! matches request paths against them.
//!
//! # Features
//!
//! - Single-segment path parameter extraction (`/items/{item_id}`)
//! - Literal escaping, strict anchoring, no trailing-slash folding
//! - Method sets with `Allow` header rendering

#![warn(unsafe_code)]

mod r#match;
mod method;
mod pattern;

pub use method::{Method, UnknownMethod};
pub use pattern::{RouteError, RoutePattern};
pub use r#match::{AllowedMethods, RouteMatch};
