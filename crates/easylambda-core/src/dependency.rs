//! Dependency injection support.
//!
//! A [`Depends`] wraps a function with its own binding plan. Used as a
//! parameter annotation it is a [`Provider`]: resolving the parameter binds
//! the dependency's parameters against the same request, calls the function
//! and hands its result to the dependent. Dependencies nest to any depth.
//!
//! Results are cached in the invocation's [`DependencyCache`] unless the
//! dependency was built with [`Depends::no_cache`]. A dependency that is
//! reached again while it is still resolving is a cycle and surfaces as a
//! fault.
//!
//! # Example
//!
//! ```
//! use easylambda_core::dependency::Depends;
//! use easylambda_core::error::HttpError;
//! use easylambda_core::extract::Header;
//! use easylambda_core::plan::Param;
//!
//! let api_key = Depends::new(
//!     "api_key",
//!     [Param::new("x_api_key").annotate(Header::new())],
//!     |args| {
//!         let key: String = args.get("x_api_key")?;
//!         if key == "secret" {
//!             Ok(key)
//!         } else {
//!             Err(HttpError::unauthorized().into())
//!         }
//!     },
//! )
//! .unwrap();
//! assert_eq!(api_key.name(), "api_key");
//! ```

use crate::error::{ConfigError, Error};
use crate::extract::{Provider, Resolution, Source, SourceKind};
use crate::plan::{Arguments, BindingPlan, Param};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DEPENDENCY: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Depends`]. Clones share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyId(u64);

impl DependencyId {
    fn next() -> Self {
        Self(NEXT_DEPENDENCY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Key of an entry in the [`DependencyCache`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Parsed JSON body of a request.
    Body(String),
    /// Parsed urlencoded form of a request.
    Form(String),
    /// Result of a dependency.
    Dependency(DependencyId),
}

impl CacheKey {
    #[must_use]
    pub fn body(request_id: &str) -> Self {
        Self::Body(request_id.to_owned())
    }

    #[must_use]
    pub fn form(request_id: &str) -> Self {
        Self::Form(request_id.to_owned())
    }
}

/// Request-scoped memo cache.
pub struct DependencyCache {
    inner: Mutex<HashMap<CacheKey, Arc<Value>>>,
}

impl DependencyCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Get a cached value.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.inner.lock().get(key).cloned()
    }

    /// Insert a value, returning the shared handle now stored under `key`.
    pub fn insert(&self, key: CacheKey, value: Value) -> Arc<Value> {
        let value = Arc::new(value);
        self.inner.lock().insert(key, Arc::clone(&value));
        value
    }

    /// Clear all cached values.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Return the number of cached values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DependencyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DependencyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyCache")
            .field("size", &self.len())
            .finish()
    }
}

/// A dependency was reached while it was still being resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("dependency cycle detected: {}", .chain.join(" -> "))]
pub struct CycleError {
    /// Names along the cycle, starting and ending with the repeated one.
    pub chain: Vec<String>,
}

/// Dependencies currently being resolved, innermost last.
#[derive(Debug, Default)]
pub struct ResolutionStack {
    inner: Mutex<Vec<(DependencyId, String)>>,
}

impl ResolutionStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a dependency; the returned guard pops it again.
    pub fn enter(&self, id: DependencyId, name: &str) -> Result<ResolutionGuard<'_>, CycleError> {
        let mut stack = self.inner.lock();
        if let Some(start) = stack.iter().position(|(entry, _)| *entry == id) {
            let mut chain: Vec<String> = stack[start..].iter().map(|(_, n)| n.clone()).collect();
            chain.push(name.to_owned());
            return Err(CycleError { chain });
        }
        stack.push((id, name.to_owned()));
        Ok(ResolutionGuard { stack: self })
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }
}

/// Pops its entry from the [`ResolutionStack`] on drop.
#[derive(Debug)]
pub struct ResolutionGuard<'a> {
    stack: &'a ResolutionStack,
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        self.stack.inner.lock().pop();
    }
}

type DependencyFn = Box<dyn Fn(&Arguments<'_>) -> Result<Value, Error> + Send + Sync>;

struct DependsInner {
    id: DependencyId,
    name: String,
    plan: BindingPlan,
    func: DependencyFn,
}

/// A function whose result is injected into the parameter it annotates.
#[derive(Clone)]
pub struct Depends {
    inner: Arc<DependsInner>,
    use_cache: bool,
}

impl Depends {
    /// Register a dependency.
    ///
    /// The parameters are compiled the same way a handler's are, except that
    /// there is no route: every parameter needs a provider or a default.
    pub fn new<T, F, I>(name: impl Into<String>, params: I, func: F) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Param>,
        F: Fn(&Arguments<'_>) -> Result<T, Error> + Send + Sync + 'static,
        T: Serialize,
    {
        let name = name.into();
        let plan = BindingPlan::compile(&name, params, None)?;
        let func: DependencyFn = Box::new(move |args: &Arguments<'_>| {
            let out = func(args)?;
            serde_json::to_value(out).map_err(Error::fault)
        });
        Ok(Self {
            inner: Arc::new(DependsInner {
                id: DependencyId::next(),
                name,
                plan,
                func,
            }),
            use_cache: true,
        })
    }

    /// Run the function on every use instead of once per invocation.
    #[must_use]
    pub fn no_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    #[must_use]
    pub fn id(&self) -> DependencyId {
        self.inner.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn plan(&self) -> &BindingPlan {
        &self.inner.plan
    }

    #[must_use]
    pub fn uses_cache(&self) -> bool {
        self.use_cache
    }

    fn resolve(&self, source: &Source<'_>) -> Result<Value, Error> {
        let cache = source.context.dependency_cache();
        let key = CacheKey::Dependency(self.inner.id);
        if self.use_cache {
            if let Some(value) = cache.get(&key) {
                tracing::trace!(dependency = %self.inner.name, "dependency cache hit");
                return Ok(Value::clone(&value));
            }
        }

        let _guard = source
            .context
            .resolution_stack()
            .enter(self.inner.id, &self.inner.name)
            .map_err(Error::fault)?;
        let args = self.inner.plan.bind(source)?;
        let value = (self.inner.func)(&args)?;
        if self.use_cache {
            cache.insert(key, value.clone());
        }
        Ok(value)
    }
}

impl fmt::Debug for Depends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Depends")
            .field("name", &self.inner.name)
            .field("use_cache", &self.use_cache)
            .finish_non_exhaustive()
    }
}

impl Provider for Depends {
    fn kind(&self) -> SourceKind {
        SourceKind::Dependency
    }

    fn get(&self, source: &Source<'_>, _key: &str) -> Resolution {
        match self.resolve(source) {
            Ok(value) => Resolution::Resolved(value),
            Err(err) => Resolution::Invalid(err),
        }
    }
}
