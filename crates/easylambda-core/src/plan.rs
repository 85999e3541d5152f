//! Binding plans.
//!
//! A handler declares its parameters as a list of [`Param`]s. When the
//! handler is registered the list is compiled once into a [`BindingPlan`]:
//! every parameter gets exactly one source, chosen in this order:
//!
//! 1. `Param::request` / `Param::route_match` receive the raw objects
//! 2. the first provider in the parameter's metadata
//! 3. the route placeholder with the parameter's name
//! 4. the parameter's default, as a constant
//!
//! A parameter left without a source is a [`ConfigError`], so a handler that
//! registers successfully can always be invoked. At request time
//! [`BindingPlan::bind`] walks the plan and produces [`Arguments`].

use crate::error::{ConfigError, Error, HttpError, ValidationError};
use crate::extract::{Constant, Path, Provider, Resolution, Source, SourceKind};
use crate::request::Request;
use crate::validate;
use easylambda_router::{RouteMatch, RoutePattern};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Declared shape of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeHint {
    /// A single value.
    #[default]
    Value,
    /// A sequence. Resolved with [`Provider::get_list`].
    List,
    /// The [`Request`] itself.
    Request,
    /// The [`RouteMatch`] itself.
    RouteMatch,
}

/// One annotation attached to a parameter.
#[derive(Clone)]
pub enum Metadata {
    /// A configured provider instance, e.g. `Query::named("hub.mode")`.
    Provider(Arc<dyn Provider>),
    /// A provider type; instantiated with its defaults when compiled.
    ProviderType(fn() -> Arc<dyn Provider>),
    /// Anything else. Ignored for binding.
    Note(String),
}

fn instantiate<P: Provider + Default + 'static>() -> Arc<dyn Provider> {
    Arc::new(P::default())
}

impl Metadata {
    /// Annotate with a provider type rather than an instance.
    #[must_use]
    pub fn provider<P: Provider + Default + 'static>() -> Self {
        Self::ProviderType(instantiate::<P>)
    }

    #[must_use]
    pub fn note(text: impl Into<String>) -> Self {
        Self::Note(text.into())
    }

    fn to_provider(&self) -> Option<Arc<dyn Provider>> {
        match self {
            Self::Provider(provider) => Some(Arc::clone(provider)),
            Self::ProviderType(make) => Some(make()),
            Self::Note(_) => None,
        }
    }
}

impl<P: Provider + 'static> From<P> for Metadata {
    fn from(provider: P) -> Self {
        Self::Provider(Arc::new(provider))
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(provider) => f.debug_tuple("Provider").field(provider).finish(),
            Self::ProviderType(make) => f.debug_tuple("ProviderType").field(&make()).finish(),
            Self::Note(text) => f.debug_tuple("Note").field(text).finish(),
        }
    }
}

/// Parameter declaration.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    hint: TypeHint,
    default: Option<Value>,
    metadata: Vec<Metadata>,
}

impl Param {
    /// A single-valued parameter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_hint(name, TypeHint::Value)
    }

    /// A list-valued parameter.
    #[must_use]
    pub fn list(name: impl Into<String>) -> Self {
        Self::with_hint(name, TypeHint::List)
    }

    /// A parameter receiving the request.
    #[must_use]
    pub fn request(name: impl Into<String>) -> Self {
        Self::with_hint(name, TypeHint::Request)
    }

    /// A parameter receiving the route match.
    #[must_use]
    pub fn route_match(name: impl Into<String>) -> Self {
        Self::with_hint(name, TypeHint::RouteMatch)
    }

    fn with_hint(name: impl Into<String>, hint: TypeHint) -> Self {
        Self {
            name: name.into(),
            hint,
            default: None,
            metadata: Vec::new(),
        }
    }

    /// Attach an annotation. The first provider attached wins.
    #[must_use]
    pub fn annotate(mut self, metadata: impl Into<Metadata>) -> Self {
        self.metadata.push(metadata.into());
        self
    }

    /// Value used when the source has nothing for this parameter.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Shorthand for a `null` default.
    #[must_use]
    pub fn optional(self) -> Self {
        self.with_default(Value::Null)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn hint(&self) -> TypeHint {
        self.hint
    }
}

/// How a compiled parameter obtains its value.
#[derive(Debug, Clone)]
pub enum Binding {
    Request,
    RouteMatch,
    Path,
    Provider(Arc<dyn Provider>),
}

/// A compiled parameter.
#[derive(Debug, Clone)]
pub struct BindingEntry {
    name: String,
    key: String,
    default: Option<Value>,
    is_list: bool,
    binding: Binding,
}

impl BindingEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key passed to the provider.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        self.is_list
    }

    #[must_use]
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Location reported in validation errors.
    #[must_use]
    pub fn location(&self) -> SourceKind {
        match &self.binding {
            Binding::Provider(provider) => provider.kind(),
            Binding::Path | Binding::Request | Binding::RouteMatch => SourceKind::Path,
        }
    }

    fn resolve(&self, source: &Source<'_>) -> Resolution {
        match &self.binding {
            Binding::Request | Binding::RouteMatch => Resolution::Missing,
            Binding::Path => Path::new().get(source, &self.key),
            Binding::Provider(provider) if self.is_list => provider.get_list(source, &self.key),
            Binding::Provider(provider) => provider.get(source, &self.key),
        }
    }
}

/// Compiled parameter list of a handler or dependency.
#[derive(Debug, Clone)]
pub struct BindingPlan {
    owner: String,
    entries: Vec<BindingEntry>,
}

impl BindingPlan {
    /// Compile a parameter list.
    ///
    /// `owner` names the handler or dependency in errors and logs. `route` is
    /// the template the handler is registered under; dependencies have none.
    pub fn compile(
        owner: &str,
        params: impl IntoIterator<Item = Param>,
        route: Option<&RoutePattern>,
    ) -> Result<Self, ConfigError> {
        let mut entries: Vec<BindingEntry> = Vec::new();
        for param in params {
            if entries.iter().any(|e| e.name == param.name) {
                return Err(ConfigError::DuplicateParameter {
                    owner: owner.to_owned(),
                    param: param.name,
                });
            }
            entries.push(compile_param(owner, param, route)?);
        }
        Ok(Self {
            owner: owner.to_owned(),
            entries,
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn entries(&self) -> &[BindingEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&BindingEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Resolve every parameter for one invocation.
    ///
    /// A missing value falls back to the parameter's default; without one the
    /// result is a 422 naming the parameter. Invalid values are returned as
    /// they are.
    pub fn bind<'a>(&'a self, source: &Source<'a>) -> Result<Arguments<'a>, Error> {
        let mut values = HashMap::with_capacity(self.entries.len());
        for entry in &self.entries {
            if matches!(entry.binding, Binding::Request | Binding::RouteMatch) {
                continue;
            }
            match entry.resolve(source) {
                Resolution::Resolved(value) => {
                    values.insert(entry.name.clone(), value);
                }
                Resolution::Missing if entry.has_default() => {}
                Resolution::Missing => {
                    return Err(HttpError::missing(entry.location().as_str(), &entry.name).into());
                }
                Resolution::Invalid(err) => return Err(err),
            }
        }
        Ok(Arguments {
            plan: self,
            request: source.request,
            route: source.route,
            values,
        })
    }
}

fn compile_param(
    owner: &str,
    param: Param,
    route: Option<&RoutePattern>,
) -> Result<BindingEntry, ConfigError> {
    let Param {
        name,
        hint,
        default,
        metadata,
    } = param;
    let is_list = hint == TypeHint::List;

    let binding = match hint {
        TypeHint::Request => Binding::Request,
        TypeHint::RouteMatch => Binding::RouteMatch,
        TypeHint::Value | TypeHint::List => {
            if let Some(provider) = metadata.iter().find_map(Metadata::to_provider) {
                Binding::Provider(provider)
            } else if route.is_some_and(|r| r.has_param(&name)) {
                Binding::Path
            } else if let Some(default) = &default {
                Binding::Provider(Arc::new(Constant(default.clone())))
            } else {
                return Err(ConfigError::UnboundParameter {
                    owner: owner.to_owned(),
                    param: name,
                });
            }
        }
    };

    let supports_list = match &binding {
        Binding::Provider(provider) => provider.supports_list(),
        Binding::Path | Binding::Request | Binding::RouteMatch => false,
    };
    if is_list && !supports_list {
        let source_kind = match &binding {
            Binding::Provider(provider) => provider.kind().to_string(),
            _ => SourceKind::Path.to_string(),
        };
        return Err(ConfigError::ListUnsupported {
            owner: owner.to_owned(),
            param: name,
            source_kind,
        });
    }

    let key = match &binding {
        Binding::Provider(provider) => provider
            .key()
            .map_or_else(|| provider.default_key(&name), str::to_owned),
        _ => name.clone(),
    };

    if let (Binding::Provider(provider), Some(route)) = (&binding, route) {
        if provider.kind() == SourceKind::Path && !route.has_param(&key) {
            tracing::warn!(
                owner,
                param = %name,
                key = %key,
                route = route.template(),
                "path parameter key is not a placeholder of the route and will never resolve"
            );
        }
    }

    Ok(BindingEntry {
        name,
        key,
        default,
        is_list,
        binding,
    })
}

/// Resolved parameters for one call of a handler or dependency.
pub struct Arguments<'a> {
    plan: &'a BindingPlan,
    request: &'a Request,
    route: &'a RouteMatch,
    values: HashMap<String, Value>,
}

impl<'a> Arguments<'a> {
    /// Convert a parameter to `T`.
    ///
    /// Uses the resolved value, else the declared default. A value that does
    /// not convert is a 422 naming the parameter. Asking for a name that was
    /// never declared is a fault.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, Error> {
        let entry = self.declared(name)?;
        if matches!(entry.binding, Binding::Request | Binding::RouteMatch) {
            return Err(Error::fault(anyhow::anyhow!(
                "parameter `{name}` of `{}` is bound to the raw request; use Arguments::request or Arguments::route_match",
                self.plan.owner
            )));
        }
        let location = entry.location();
        let value = self
            .values
            .get(name)
            .or(entry.default.as_ref())
            .ok_or_else(|| HttpError::missing(location.as_str(), name))?;
        validate::coerce(value).map_err(|err| {
            HttpError::unprocessable_entity()
                .with_detail(format!("invalid value for parameter `{name}`"))
                .with_error(ValidationError::invalid(
                    location.as_str(),
                    name,
                    err.to_string(),
                ))
                .into()
        })
    }

    /// The raw resolved value, or the default when nothing was resolved.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values
            .get(name)
            .or_else(|| self.plan.entry(name)?.default.as_ref())
    }

    /// Whether the source supplied a value, as opposed to the default.
    #[must_use]
    pub fn is_provided(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn request(&self) -> &'a Request {
        self.request
    }

    #[must_use]
    pub fn route_match(&self) -> &'a RouteMatch {
        self.route
    }

    fn declared(&self, name: &str) -> Result<&BindingEntry, Error> {
        self.plan.entry(name).ok_or_else(|| {
            Error::fault(anyhow::anyhow!(
                "`{}` has no parameter named `{name}`",
                self.plan.owner
            ))
        })
    }
}

impl fmt::Debug for Arguments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("owner", &self.plan.owner)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}
