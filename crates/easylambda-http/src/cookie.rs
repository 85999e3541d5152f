//! Cookie splitting.
//!
//! Payload v2.0 events carry cookies as a list of `name=value` strings; older
//! envelopes only have the `Cookie` header (`a=1; b=2`). Both reduce to the
//! same pairs.

/// Split a single `name=value` cookie. Surrounding whitespace is trimmed and a
/// quoted value is unquoted. Returns `None` when there is no `=` or no name.
#[must_use]
pub fn split_cookie(raw: &str) -> Option<(&str, &str)> {
    let (name, value) = raw.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Some((name, value))
}

/// Split a `Cookie` header value into `(name, value)` pairs.
///
/// ```
/// use easylambda_http::parse_cookie_header;
///
/// let pairs: Vec<_> = parse_cookie_header("session=abc; theme=\"dark\"").collect();
/// assert_eq!(pairs, [("session", "abc"), ("theme", "dark")]);
/// ```
pub fn parse_cookie_header(header: &str) -> impl Iterator<Item = (&str, &str)> {
    header.split(';').filter_map(split_cookie)
}
