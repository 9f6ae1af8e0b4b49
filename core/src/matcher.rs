//! Matcher — reverse matching with its own filters
//!
//! A [`Matcher`] wraps a [`Template`] and keeps a filter map and, optionally,
//! a source format of its own. The template's filters and its config's source
//! format are ignored, so one template can back several matchers with
//! different constraints:
//!
//! ```
//! use tokenstring::{Matcher, SourceFormat, Template};
//!
//! let template = Template::new("/blog/{date}/posts/{slug}/");
//!
//! let strict = Matcher::new(&template).with_filters([("date", r"\d{4}-\d{2}-\d{2}")])?;
//! let loose = Matcher::new(&template);
//!
//! assert!(strict.match_input("/blog/today/posts/x/")?.is_none());
//! assert!(loose.match_input("/blog/today/posts/x/")?.is_some());
//!
//! let mut prefix = Matcher::new(&template);
//! prefix.set_format(Some(SourceFormat::new("^source", "i")?));
//! assert!(prefix.is_match("/blog/today/posts/x/comments")?);
//! # Ok::<(), tokenstring::TemplateError>(())
//! ```

use crate::compiler::validate_filter;
use crate::{
    Bindings, Captures, CompiledPattern, FilterPatterns, PatternCompiler, SourceFormat,
    Template, TemplateError,
};
use std::borrow::Cow;
use std::sync::OnceLock;

/// Matches strings against a template.
///
/// Borrows the template (`Matcher<'t>`) or owns it (`Matcher<'static>`).
/// The compiled pattern is cached until the source, the filters or the
/// format change.
#[derive(Debug, Clone)]
pub struct Matcher<'t> {
    template: Cow<'t, Template>,
    filters: FilterPatterns,
    format: Option<SourceFormat>,
    pattern: OnceLock<CompiledPattern>,
}

impl<'t> Matcher<'t> {
    /// A matcher borrowing `template`, with no filters.
    #[must_use]
    pub fn new(template: &'t Template) -> Self {
        Self::from_cow(Cow::Borrowed(template))
    }

    fn from_cow(template: Cow<'t, Template>) -> Self {
        Self {
            template,
            filters: FilterPatterns::new(),
            format: None,
            pattern: OnceLock::new(),
        }
    }

    /// Set filters (builder form of [`set_filters`](Self::set_filters)).
    ///
    /// # Errors
    ///
    /// The first invalid filter.
    pub fn with_filters(
        mut self,
        filters: impl Into<Bindings<String>>,
    ) -> Result<Self, TemplateError> {
        self.set_filters(filters)?;
        Ok(self)
    }

    /// The template being matched against.
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Mutable access to the template; clones it first if borrowed.
    pub fn template_mut(&mut self) -> &mut Template {
        self.pattern = OnceLock::new();
        self.template.to_mut()
    }

    /// Replace the template's source.
    pub fn set_source(&mut self, source: impl Into<String>) -> &mut Self {
        self.template_mut().set_source(source);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Filters and format
    // ═══════════════════════════════════════════════════════════════════════

    /// This matcher's filters.
    #[must_use]
    pub fn filters(&self) -> &FilterPatterns {
        &self.filters
    }

    /// Constrain what token `name` may match.
    ///
    /// # Errors
    ///
    /// [`TemplateError::InvalidFilter`] or [`TemplateError::PatternTooLong`].
    pub fn set_filter(
        &mut self,
        name: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Result<&mut Self, TemplateError> {
        let (name, pattern) = (name.into(), pattern.into());
        validate_filter(&name, &pattern)?;
        self.filters.insert(name, pattern);
        self.pattern = OnceLock::new();
        Ok(self)
    }

    /// Set several filters, by name or by position against the template's tokens.
    ///
    /// # Errors
    ///
    /// The first invalid filter; the filters are unchanged on error.
    pub fn set_filters(
        &mut self,
        filters: impl Into<Bindings<String>>,
    ) -> Result<&mut Self, TemplateError> {
        let pairs = self.template.associate(filters);
        for (name, pattern) in &pairs {
            validate_filter(name, pattern)?;
        }
        self.filters.extend(pairs);
        self.pattern = OnceLock::new();
        Ok(self)
    }

    /// Remove the filter for `name`.
    pub fn remove_filter(&mut self, name: &str) -> &mut Self {
        if self.filters.remove(name).is_some() {
            self.pattern = OnceLock::new();
        }
        self
    }

    /// Remove all filters.
    pub fn clear_filters(&mut self) -> &mut Self {
        self.filters.clear();
        self.pattern = OnceLock::new();
        self
    }

    /// The source format override, if any.
    #[must_use]
    pub fn format(&self) -> Option<&SourceFormat> {
        self.format.as_ref()
    }

    /// Override the config's source format; `None` restores it.
    pub fn set_format(&mut self, format: Option<SourceFormat>) -> &mut Self {
        self.format = format;
        self.pattern = OnceLock::new();
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Matching
    // ═══════════════════════════════════════════════════════════════════════

    /// The compiled pattern, built on first use.
    ///
    /// # Errors
    ///
    /// [`TemplateError::CompileFailed`] if the assembled pattern does not compile.
    pub fn pattern(&self) -> Result<&CompiledPattern, TemplateError> {
        if let Some(pattern) = self.pattern.get() {
            return Ok(pattern);
        }
        let config = self.template.config();
        let mut compiler = PatternCompiler::new(config);
        if let Some(format) = &self.format {
            compiler = compiler.with_format(format);
        }
        let compiled = compiler.compile(self.template.source(), &self.filters)?;
        Ok(self.pattern.get_or_init(|| compiled))
    }

    /// Match `input`; `Ok(None)` when it does not fit.
    ///
    /// # Errors
    ///
    /// See [`pattern`](Self::pattern).
    pub fn match_input(&self, input: &str) -> Result<Option<Captures>, TemplateError> {
        Ok(self.pattern()?.captures(input))
    }

    /// Whether `input` fits.
    ///
    /// # Errors
    ///
    /// See [`pattern`](Self::pattern).
    pub fn is_match(&self, input: &str) -> Result<bool, TemplateError> {
        Ok(self.pattern()?.is_match(input))
    }
}

impl Matcher<'static> {
    /// A matcher owning `template`, with no filters.
    #[must_use]
    pub fn owned(template: Template) -> Self {
        Self::from_cow(Cow::Owned(template))
    }

    /// A matcher over a new template built from `source`.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self::owned(Template::new(source))
    }
}

impl<'t> From<&'t Template> for Matcher<'t> {
    fn from(template: &'t Template) -> Self {
        Self::new(template)
    }
}

impl From<Template> for Matcher<'static> {
    fn from(template: Template) -> Self {
        Self::owned(template)
    }
}
