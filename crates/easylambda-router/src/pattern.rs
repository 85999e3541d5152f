//! Route template compilation.
//!
//! A template such as `/users/{user_id}/posts/{post_id}` compiles to an
//! anchored regular expression where every `{name}` placeholder becomes a
//! named capture of exactly one path segment (`[^/]+`). Literal text is
//! escaped, so `/v1.0/items` only matches a literal dot.
//!
//! There are no wildcards, no multi-segment captures and no trailing-slash
//! normalization: `/items` never matches `/items/`.

use crate::r#match::RouteMatch;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([^{}]*)\}").expect("placeholder pattern is valid")
});

/// Error compiling a route template.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// A placeholder name is not an identifier.
    #[error("invalid placeholder `{{{name}}}` in route `{template}`")]
    InvalidPlaceholder { template: String, name: String },
    /// The same placeholder appears twice.
    #[error("placeholder `{{{name}}}` appears more than once in route `{template}`")]
    DuplicatePlaceholder { template: String, name: String },
    /// The compiled expression was rejected by the regex engine.
    #[error("route `{template}` does not compile")]
    Regex {
        template: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled route template.
#[derive(Clone)]
pub struct RoutePattern {
    template: String,
    regex: Regex,
    params: Vec<String>,
}

impl RoutePattern {
    /// Compile a route template.
    pub fn compile(template: &str) -> Result<Self, RouteError> {
        let mut source = String::with_capacity(template.len() + 16);
        let mut params: Vec<String> = Vec::new();
        let mut last = 0;

        source.push('^');
        for caps in PLACEHOLDER.captures_iter(template) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let name = &caps[1];
            if !is_identifier(name) {
                return Err(RouteError::InvalidPlaceholder {
                    template: template.to_owned(),
                    name: name.to_owned(),
                });
            }
            if params.iter().any(|p| p == name) {
                return Err(RouteError::DuplicatePlaceholder {
                    template: template.to_owned(),
                    name: name.to_owned(),
                });
            }
            source.push_str(&regex::escape(&template[last..whole.start()]));
            source.push_str("(?P<");
            source.push_str(name);
            source.push_str(">[^/]+)");
            params.push(name.to_owned());
            last = whole.end();
        }
        source.push_str(&regex::escape(&template[last..]));
        source.push('$');

        let regex = Regex::new(&source).map_err(|source| RouteError::Regex {
            template: template.to_owned(),
            source,
        })?;

        Ok(Self {
            template: template.to_owned(),
            regex,
            params,
        })
    }

    /// Match a request path, extracting placeholder values on success.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<RouteMatch> {
        let caps = self.regex.captures(path)?;
        let params = self
            .params
            .iter()
            .filter_map(|name| {
                caps.name(name)
                    .map(|value| (name.clone(), value.as_str().to_owned()))
            })
            .collect();
        Some(RouteMatch::new(params))
    }

    /// The template this pattern was compiled from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in template order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Whether `name` is one of the template's placeholders.
    #[must_use]
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name)
    }
}

impl fmt::Debug for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutePattern")
            .field("template", &self.template)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
