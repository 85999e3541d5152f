//! Per-invocation state.
//!
//! A fresh [`RequestContext`] is created for every dispatch and dropped when
//! the response is produced. Nothing in it outlives the invocation, so cached
//! bodies and dependency results can never leak into the next request handled
//! by the same warm Lambda container.

use crate::dependency::{DependencyCache, ResolutionStack};
use easylambda_http::DEFAULT_MAX_BODY_SIZE;

/// Configuration for request body limits.
///
/// Set at the application level through `AppConfig::max_body_size`. Bodies
/// larger than this are rejected with 413 by the body providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLimitConfig {
    /// Maximum body size in bytes.
    max_size: usize,
}

impl Default for BodyLimitConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl BodyLimitConfig {
    /// Creates a new body limit config with the specified maximum size.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    /// Returns the maximum body size in bytes.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

/// State scoped to one invocation.
///
/// `RequestContext` provides access to:
/// - The request id the invocation is keyed by
/// - A memo cache for parsed bodies and dependency results
/// - The stack of dependencies currently being resolved (for cycle detection)
/// - Body size limits
#[derive(Debug)]
pub struct RequestContext {
    request_id: String,
    dependency_cache: DependencyCache,
    resolution_stack: ResolutionStack,
    body_limit: BodyLimitConfig,
}

impl RequestContext {
    /// Create a context with the default body limit.
    #[must_use]
    pub fn new(request_id: impl Into<String>) -> Self {
        Self::with_body_limit(request_id, DEFAULT_MAX_BODY_SIZE)
    }

    /// Create a context with a custom body size limit.
    #[must_use]
    pub fn with_body_limit(request_id: impl Into<String>, max_body_size: usize) -> Self {
        Self {
            request_id: request_id.into(),
            dependency_cache: DependencyCache::new(),
            resolution_stack: ResolutionStack::new(),
            body_limit: BodyLimitConfig::new(max_body_size),
        }
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Memo cache for this invocation.
    #[must_use]
    pub fn dependency_cache(&self) -> &DependencyCache {
        &self.dependency_cache
    }

    #[must_use]
    pub fn resolution_stack(&self) -> &ResolutionStack {
        &self.resolution_stack
    }

    #[must_use]
    pub fn body_limit(&self) -> &BodyLimitConfig {
        &self.body_limit
    }

    /// Shorthand for `body_limit().max_size()`.
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.body_limit.max_size()
    }
}
