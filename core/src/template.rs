//! `Template` — source text, its tokens, and the data they render with
//!
//! # Render, resolve, chain
//!
//! | Method | Data used | Mutates source |
//! |---|---|---|
//! | [`render`](Template::render) | bound data | no |
//! | [`render_with`](Template::render_with) | bound data, overridden by the argument | no |
//! | [`resolve`](Template::resolve) | bound data | yes, re-parses tokens |
//! | [`chain`](Template::chain) | bound data, overridden by the argument | yes, re-parses tokens |
//!
//! A placeholder whose name has no value stays in the output as written, so a
//! template can be filled in stages:
//!
//! ```
//! use tokenstring::Template;
//!
//! let mut template = Template::new("{foo} {bar} {baz}")
//!     .with_data([("foo", "foo"), ("bar", "bar")]);
//! assert_eq!(template.render(), "foo bar {baz}");
//!
//! template.resolve(false);
//! assert_eq!(template.source(), "foo bar {baz}");
//!
//! let lines: Vec<String> = (1..=3).map(|n| template.render_with([("baz", n)])).collect();
//! assert_eq!(lines, ["foo bar 1", "foo bar 2", "foo bar 3"]);
//! ```
//!
//! # Substitution is a single pass
//!
//! Placeholder occurrences are resolved left to right. Text produced by a
//! substitution is not scanned again in the same pass; use
//! [`chain`](Template::chain) or [`resolve`](Template::resolve) to expand
//! placeholders that a value itself produced. A function value is handed the
//! working copy: earlier occurrences already substituted, the rest as written.

use crate::compiler::validate_filter;
use crate::token::Scan;
use crate::value::Nesting;
use crate::{
    Bindings, Captures, CompiledPattern, Config, Data, DataMap, FilterPatterns, Matcher, Outcome,
    PatternCompiler, RenderStep, RenderTrace, RendererValue, TemplateError, Token,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A string with `{token}` placeholders.
///
/// # INV: tokens always reflect the source
///
/// `tokens` is re-derived whenever the source changes, and the cached
/// matching pattern is dropped whenever the source or the filters change.
///
/// # Sharing
///
/// All mutation goes through `&mut self`; a `&Template` can be rendered and
/// matched from several threads at once. The matching pattern is compiled on
/// first use and cached.
#[derive(Debug, Clone)]
pub struct Template {
    config: Arc<Config>,
    source: String,
    scan: Scan,
    data: DataMap,
    filters: FilterPatterns,
    pattern: OnceLock<CompiledPattern>,
}

impl Template {
    /// Create a template using the shared default [`Config`].
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_config(source, Config::shared_default())
    }

    /// Create a template using `config`.
    pub fn with_config(source: impl Into<String>, config: Arc<Config>) -> Self {
        let source = source.into();
        let scan = Scan::new(&source, &config);
        Self {
            config,
            source,
            scan,
            data: DataMap::new(),
            filters: FilterPatterns::new(),
            pattern: OnceLock::new(),
        }
    }

    /// Bind data (builder form of [`set_data`](Self::set_data)).
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Data>) -> Self {
        self.set_data(data);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Source and tokens
    // ═══════════════════════════════════════════════════════════════════════

    /// The configuration this template was built with.
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The current source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace the source text and re-parse its tokens.
    pub fn set_source(&mut self, source: impl Into<String>) -> &mut Self {
        self.source = source.into();
        self.scan = Scan::new(&self.source, &self.config);
        self.pattern = OnceLock::new();
        self
    }

    /// Distinct tokens in first-appearance order.
    ///
    /// A name used more than once appears once, holding its last occurrence.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.scan.tokens
    }

    /// The token named `name`.
    #[must_use]
    pub fn token(&self, name: &str) -> Option<&Token> {
        self.scan.tokens.iter().find(|t| t.name() == name)
    }

    /// Distinct token names in first-appearance order.
    pub fn token_names(&self) -> impl Iterator<Item = &str> {
        self.scan.tokens.iter().map(Token::name)
    }

    /// Zip positional bindings with this template's token names.
    pub fn associate<T>(&self, bindings: impl Into<Bindings<T>>) -> Vec<(String, T)> {
        bindings.into().associate(self.token_names())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Data
    // ═══════════════════════════════════════════════════════════════════════

    /// The bound data.
    #[must_use]
    pub fn data(&self) -> &DataMap {
        &self.data
    }

    /// Bind one value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<RendererValue>) -> &mut Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// Remove one bound value.
    pub fn unset(&mut self, name: &str) -> &mut Self {
        self.data.remove(name);
        self
    }

    /// Replace all bound data.
    pub fn set_data(&mut self, data: impl Into<Data>) -> &mut Self {
        self.data = self.associate(data).into_iter().collect();
        self
    }

    /// Merge data into the bound data; incoming values win.
    pub fn merge_data(&mut self, data: impl Into<Data>) -> &mut Self {
        let pairs = self.associate(data);
        self.data.extend(pairs);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Filters
    // ═══════════════════════════════════════════════════════════════════════

    /// Filter regexes used by [`match_input`](Self::match_input).
    #[must_use]
    pub fn filters(&self) -> &FilterPatterns {
        &self.filters
    }

    /// Constrain what token `name` may match. The pattern is a regex without
    /// capturing parentheses around the whole; those are added.
    ///
    /// # Errors
    ///
    /// [`TemplateError::InvalidFilter`] or [`TemplateError::PatternTooLong`];
    /// the filters are unchanged on error.
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

    /// Set several filters, by name or by position.
    ///
    /// # Errors
    ///
    /// The first invalid filter; the filters are unchanged on error.
    pub fn set_filters(
        &mut self,
        filters: impl Into<Bindings<String>>,
    ) -> Result<&mut Self, TemplateError> {
        let pairs = self.associate(filters);
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

    // ═══════════════════════════════════════════════════════════════════════
    // Rendering
    // ═══════════════════════════════════════════════════════════════════════

    /// Render with the bound data.
    #[must_use]
    pub fn render(&self) -> String {
        self.substitute(&self.data, &mut Nesting::default(), |_| {})
    }

    /// Render with `data` merged over the bound data.
    ///
    /// Names without a value keep their placeholder text.
    #[must_use]
    pub fn render_with(&self, data: impl Into<Data>) -> String {
        let data = data.into();
        if data.is_empty() {
            return self.render();
        }
        let merged = self.merged(data);
        self.substitute(&merged, &mut Nesting::default(), |_| {})
    }

    /// Render like [`render_with`](Self::render_with), recording what
    /// happened to each placeholder.
    #[must_use]
    pub fn render_trace(&self, data: impl Into<Data>) -> RenderTrace {
        let merged = self.merged(data.into());
        let mut steps = Vec::with_capacity(self.scan.occurrences.len());
        let output = self.substitute(&merged, &mut Nesting::default(), |step| steps.push(step));
        RenderTrace { output, steps }
    }

    /// Render with the bound data and make the result the new source.
    ///
    /// Tokens are re-parsed from the result: resolved placeholders disappear,
    /// and placeholders produced by values become new tokens. With
    /// `prune_unused`, bound data whose name is no longer a token is dropped.
    pub fn resolve(&mut self, prune_unused: bool) -> &mut Self {
        let rendered = self.render();
        self.set_source(rendered);

        if prune_unused {
            let names: HashSet<&str> = self.scan.tokens.iter().map(Token::name).collect();
            self.data.retain(|name, _| names.contains(name.as_str()));
        }
        log::debug!(
            "resolved template to {:?} ({} tokens left)",
            self.source,
            self.scan.tokens.len()
        );
        self
    }

    /// Render with `data` merged over the bound data, make the result the new
    /// source, and return `self` for another pass.
    ///
    /// ```
    /// use tokenstring::Template;
    ///
    /// let mut template = Template::new("{outer}");
    /// template
    ///     .chain([("outer", "<{inner}>")])
    ///     .chain([("inner", "done")]);
    /// assert_eq!(template.source(), "<done>");
    /// ```
    pub fn chain(&mut self, data: impl Into<Data>) -> &mut Self {
        let rendered = self.render_with(data);
        self.set_source(rendered)
    }

    /// Render as a nested value: own data first, the caller's data on top.
    pub(crate) fn render_nested(&self, data: &DataMap, nesting: &mut Nesting) -> String {
        if self.data.is_empty() {
            return self.substitute(data, nesting, |_| {});
        }
        let mut merged = self.data.clone();
        merged.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.substitute(&merged, nesting, |_| {})
    }

    fn merged(&self, data: Data) -> DataMap {
        let mut merged = self.data.clone();
        merged.extend(self.associate(data));
        merged
    }

    /// One left-to-right pass over the placeholder occurrences.
    ///
    /// Functions see the working copy: `out` so far followed by the source
    /// from this occurrence on.
    fn substitute(
        &self,
        data: &DataMap,
        nesting: &mut Nesting,
        mut observe: impl FnMut(RenderStep),
    ) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;

        for occurrence in &self.scan.occurrences {
            out.push_str(&self.source[cursor..occurrence.range.start]);
            cursor = occurrence.range.end;

            let token = &occurrence.token;
            let working;
            let source = if matches!(data.get(token.name()), Some(RendererValue::Function(_))) {
                working = [out.as_str(), &self.source[occurrence.range.start..]].concat();
                working.as_str()
            } else {
                self.source.as_str()
            };
            let outcome = self.resolve_token(token, data, source, nesting);
            match &outcome {
                Outcome::Resolved { value, .. } => {
                    log::trace!("{} -> {value:?}", token.match_text());
                    out.push_str(value);
                }
                Outcome::Unbound | Outcome::Unresolved { .. } => out.push_str(token.match_text()),
            }
            observe(RenderStep {
                token: token.clone(),
                outcome,
            });
        }

        out.push_str(&self.source[cursor..]);
        out
    }

    fn resolve_token(
        &self,
        token: &Token,
        data: &DataMap,
        source: &str,
        nesting: &mut Nesting,
    ) -> Outcome {
        let Some(value) = data.get(token.name()) else {
            return Outcome::Unbound;
        };
        let kind = value.kind();
        match value.resolve_at(token, data, source, nesting) {
            Some(raw) => Outcome::Resolved {
                kind,
                value: self.config.filters().apply(&raw, token.filters()),
            },
            None => Outcome::Unresolved { kind },
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Matching
    // ═══════════════════════════════════════════════════════════════════════

    /// The matching pattern, compiled on first use with this template's
    /// filters and the config's source format.
    ///
    /// # Errors
    ///
    /// [`TemplateError::CompileFailed`] if the assembled pattern does not compile.
    pub fn pattern(&self) -> Result<&CompiledPattern, TemplateError> {
        if let Some(pattern) = self.pattern.get() {
            return Ok(pattern);
        }
        let compiled = PatternCompiler::new(&self.config).compile(&self.source, &self.filters)?;
        Ok(self.pattern.get_or_init(|| compiled))
    }

    /// Match `input` against this template.
    ///
    /// `Ok(None)` when `input` does not fit; otherwise the captured value of
    /// each token (an empty [`Captures`] when there are no tokens).
    ///
    /// # Errors
    ///
    /// See [`pattern`](Self::pattern).
    pub fn match_input(&self, input: &str) -> Result<Option<Captures>, TemplateError> {
        Ok(self.pattern()?.captures(input))
    }

    /// Whether `input` fits this template.
    ///
    /// # Errors
    ///
    /// See [`pattern`](Self::pattern).
    pub fn is_match(&self, input: &str) -> Result<bool, TemplateError> {
        Ok(self.pattern()?.is_match(input))
    }

    /// A [`Matcher`] over this template with its own, initially empty, filters.
    #[must_use]
    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(self)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Template {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for Template {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}
