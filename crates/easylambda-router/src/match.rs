//! Route matching result.

use crate::method::Method;

/// Path parameters captured by a successful match.
///
/// Values are the raw path segments; no percent-decoding is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    params: Vec<(String, String)>,
}

impl RouteMatch {
    /// Build a match from `(name, value)` pairs.
    #[must_use]
    pub fn new(params: Vec<(String, String)>) -> Self {
        Self { params }
    }

    /// Get a parameter value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over captured `(name, value)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true for templates without placeholders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// The set of methods a route accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedMethods {
    methods: Vec<Method>,
}

impl AllowedMethods {
    /// Create a normalized allow list, sorted and de-duplicated for stable
    /// output.
    #[must_use]
    pub fn new(mut methods: Vec<Method>) -> Self {
        methods.sort();
        methods.dedup();
        Self { methods }
    }

    /// Every supported method.
    #[must_use]
    pub fn all() -> Self {
        Self::new(Method::ALL.to_vec())
    }

    /// Access the normalized methods.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Check whether a method is allowed.
    #[must_use]
    pub fn contains(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    /// Check a raw request method, as found in the envelope, against the set.
    #[must_use]
    pub fn allows(&self, method: &str) -> bool {
        Method::parse(method).is_some_and(|m| self.contains(m))
    }

    /// Whether this set shares a method with `other`.
    #[must_use]
    pub fn overlaps(&self, other: &AllowedMethods) -> bool {
        self.methods.iter().any(|m| other.contains(*m))
    }

    /// Merge two sets.
    #[must_use]
    pub fn union(&self, other: &AllowedMethods) -> Self {
        let mut methods = self.methods.clone();
        methods.extend_from_slice(&other.methods);
        Self::new(methods)
    }

    /// Format as an HTTP Allow header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        let names: Vec<&str> = self.methods.iter().map(|m| m.as_str()).collect();
        names.join(", ")
    }
}

impl Default for AllowedMethods {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Method> for AllowedMethods {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
