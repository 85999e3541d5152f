//! Envelope-level codecs for easylambda.
//!
//! Everything in this crate operates on plain strings taken from a Lambda
//! request envelope. It knows nothing about routes or handlers:
//!
//! - Query strings into an ordered multi-map with percent-decoding
//! - `Content-Type` reduction to a MIME essence
//! - Base64 body decoding
//! - Cookie splitting

#![deny(unsafe_code)]

pub mod body;
mod cookie;
mod query;

pub use body::{
    APPLICATION_JSON, BodyError, DEFAULT_MAX_BODY_SIZE, FORM_URLENCODED, MULTIPART_FORM_DATA,
    content_type_essence, decode_body,
};
pub use cookie::{parse_cookie_header, split_cookie};
pub use query::{QueryParams, percent_decode, split_pairs};
