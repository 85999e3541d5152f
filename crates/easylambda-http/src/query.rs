//! Query string parsing.
//!
//! Lambda function URLs hand us the query string twice: raw (`rawQueryString`)
//! and pre-split (`queryStringParameters`, which folds repeated keys into one
//! comma-joined value). The raw form is the only one that keeps repeated keys
//! apart, so [`QueryParams::parse`] works from it.
//!
//! Parsing follows the usual `application/x-www-form-urlencoded` rules:
//! - pairs are separated by `&`
//! - keys and values are percent-decoded, `+` decodes to a space
//! - pairs with an empty value (`a=` or a bare `a`) are dropped
//! - repeated keys keep every value, in order of appearance
//!
//! # Example
//!
//! ```
//! use easylambda_http::QueryParams;
//!
//! let qs = QueryParams::parse("tag=a&limit=10&tag=b");
//!
//! assert_eq!(qs.last("tag"), Some("b"));
//! assert_eq!(qs.all("tag"), ["a", "b"]);
//! assert!(qs.all("missing").is_empty());
//! ```

use std::borrow::Cow;

/// An owned, ordered multi-map of query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut params = Self::new();
        for (key, value) in split_pairs(raw) {
            if value.is_empty() {
                continue;
            }
            params.push(percent_decode(key), percent_decode(value));
        }
        params
    }

    /// Append a value for `key`, keeping previously stored values.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// The last value supplied for `key`.
    #[must_use]
    pub fn last(&self, key: &str) -> Option<&str> {
        self.all(key).last().map(String::as_str)
    }

    /// Every value supplied for `key`, in order. Empty when the key is absent.
    #[must_use]
    pub fn all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    /// Whether `key` was supplied at least once.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Iterate over distinct keys in order of first appearance.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no parameters were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.push(key, value);
        }
        params
    }
}

/// Split a raw query string into `(key, value)` pairs without decoding.
///
/// A key without `=` yields an empty value.
pub fn split_pairs(raw: &str) -> impl Iterator<Item = (&str, &str)> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

/// Percent-decode a query component or form field, treating `+` as a space.
///
/// Borrows when nothing needs decoding. Malformed escapes are kept verbatim
/// and invalid UTF-8 is replaced.
///
/// ```
/// use easylambda_http::percent_decode;
///
/// assert_eq!(percent_decode("hub.verify_token"), "hub.verify_token");
/// assert_eq!(percent_decode("j%C3%BCrgen+m"), "jürgen m");
/// assert_eq!(percent_decode("100%"), "100%");
/// ```
pub fn percent_decode(s: &str) -> Cow<'_, str> {
    if !s.contains(['%', '+']) {
        return Cow::Borrowed(s);
    }

    let mut out = Vec::with_capacity(s.len());
    let mut rest = s.as_bytes();
    while let Some((&first, tail)) = rest.split_first() {
        rest = tail;
        match first {
            b'+' => out.push(b' '),
            b'%' => match escaped_byte(rest) {
                Some(byte) => {
                    out.push(byte);
                    rest = &rest[2..];
                }
                None => out.push(b'%'),
            },
            other => out.push(other),
        }
    }
    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

/// The byte spelled by the two hex digits that follow a `%`.
fn escaped_byte(rest: &[u8]) -> Option<u8> {
    let digits = rest.get(..2)?;
    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u8::from_str_radix(std::str::from_utf8(digits).ok()?, 16).ok()
}
