//! Named value filters for `{name|filter}` tokens.
//!
//! A filter is a string transform applied to a token's resolved value before
//! it is substituted. Filters are looked up by name in a [`FilterRegistry`],
//! which is built once and immutable afterwards.
//!
//! # Example
//!
//! ```
//! use tokenstring::{register_core_filters, FilterRegistryBuilder};
//!
//! let filters = register_core_filters(FilterRegistryBuilder::new())
//!     .filter("shout", |s| format!("{}!", s.to_uppercase()))
//!     .build();
//!
//! assert_eq!(filters.apply("hi", ["shout"]), "HI!");
//! assert_eq!(filters.apply("  Hi ", ["trim", "lower"]), "hi");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-erased filter closure.
pub type FilterFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for a [`FilterRegistry`].
///
/// Registering a name twice replaces the earlier filter.
#[derive(Default)]
pub struct FilterRegistryBuilder {
    filters: HashMap<String, FilterFn>,
}

impl FilterRegistryBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter under `name`.
    #[must_use]
    pub fn filter<F>(mut self, name: &str, filter: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.filters.insert(name.to_owned(), Arc::new(filter));
        self
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> FilterRegistry {
        FilterRegistry {
            filters: self.filters,
        }
    }
}

/// Register the built-in filters: `upper`, `lower`, `trim`, `capitalize`.
#[must_use]
pub fn register_core_filters(builder: FilterRegistryBuilder) -> FilterRegistryBuilder {
    builder
        .filter("upper", str::to_uppercase)
        .filter("lower", str::to_lowercase)
        .filter("trim", |s| s.trim().to_owned())
        .filter("capitalize", capitalize)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable set of named filters.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, FilterFn>,
}

impl FilterRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> FilterRegistryBuilder {
        FilterRegistryBuilder::new()
    }

    /// Look up a filter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FilterFn> {
        self.filters.get(name)
    }

    /// Whether a filter is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Number of registered filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Registered filter names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Apply `names` to `value` in order.
    ///
    /// Unknown names pass the value through unchanged and log a warning.
    pub fn apply<I, S>(&self, value: &str, names: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut value = value.to_owned();
        for name in names {
            let name = name.as_ref();
            match self.filters.get(name) {
                Some(filter) => value = filter(&value),
                None => log::warn!("unknown filter \"{name}\", value left unchanged"),
            }
        }
        value
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> FilterRegistry {
        register_core_filters(FilterRegistryBuilder::new()).build()
    }

    #[test]
    fn core_filters_registered() {
        assert_eq!(core().names(), ["capitalize", "lower", "trim", "upper"]);
    }

    #[test]
    fn apply_in_order() {
        let filters = core();
        assert_eq!(filters.apply(" mixed Case ", ["trim", "upper"]), "MIXED CASE");
        assert_eq!(filters.apply("hello world", ["capitalize"]), "Hello world");
        assert_eq!(filters.apply("", ["capitalize"]), "");
    }

    #[test]
    fn unknown_filter_passes_through() {
        assert_eq!(core().apply("value", ["nope", "upper"]), "VALUE");
    }

    #[test]
    fn no_filters_is_identity() {
        assert_eq!(core().apply("same", Vec::<String>::new()), "same");
    }

    #[test]
    fn later_registration_replaces() {
        let filters = FilterRegistry::builder()
            .filter("x", |_| "first".into())
            .filter("x", |_| "second".into())
            .build();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.apply("v", ["x"]), "second");
    }

    #[test]
    fn debug_lists_names() {
        let debug = format!("{:?}", core());
        assert!(debug.contains("upper"));
    }
}
