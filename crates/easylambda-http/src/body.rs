//! Request body decoding and content-type handling.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// `application/json`
pub const APPLICATION_JSON: &str = "application/json";
/// `application/x-www-form-urlencoded`
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
/// `multipart/form-data`
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Default maximum body size: 1MB.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Error decoding a request body.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    /// The body was flagged as base64 but did not decode.
    #[error("body is flagged as base64 but is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Reduce a `Content-Type` header value to its lower-cased MIME essence.
///
/// Parameters such as `charset` are dropped. Returns `None` for a blank value.
///
/// ```
/// use easylambda_http::content_type_essence;
///
/// assert_eq!(
///     content_type_essence("Application/JSON; charset=utf-8").as_deref(),
///     Some("application/json"),
/// );
/// assert_eq!(content_type_essence("  "), None);
/// ```
#[must_use]
pub fn content_type_essence(value: &str) -> Option<String> {
    let essence = value.split(';').next().unwrap_or_default().trim();
    if essence.is_empty() {
        None
    } else {
        Some(essence.to_ascii_lowercase())
    }
}

/// Decode the raw envelope body.
///
/// Base64 bodies are decoded and then read as UTF-8, replacing invalid
/// sequences.
pub fn decode_body(body: &str, is_base64_encoded: bool) -> Result<String, BodyError> {
    if !is_base64_encoded {
        return Ok(body.to_owned());
    }
    let bytes = STANDARD.decode(body.trim())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
