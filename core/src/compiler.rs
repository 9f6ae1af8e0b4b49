//! `PatternCompiler` — template source → one matching regex
//!
//! The compiled pattern must match the template's literal text exactly and
//! capture whatever stands in each placeholder's position, constrained by an
//! optional per-token filter regex. Literal text has to be escaped; filter
//! regexes must not be. The compiler keeps the two apart by position rather
//! than by textual markers:
//!
//! 1. **Fragments** — one capture fragment per distinct token: its filter, or `.*`
//! 2. **Segments** — the source is split into literal runs and token occurrences
//! 3. **Quote** — each literal run is regex-escaped, delimiter included
//! 4. **Assemble** — each occurrence becomes a named group around its fragment,
//!    with any bare delimiter inside the filter escaped
//!
//! The body is then embedded in the [`SourceFormat`] and prefixed with its
//! mode modifiers.
//!
//! # INV: repeated names capture the same text
//!
//! Every occurrence gets its own group. A name that occurs twice only matches
//! when both occurrences captured identical text.

use crate::config::is_escaped;
use crate::token::Scan;
use crate::{Config, SourceFormat, TemplateError, MAX_FILTER_PATTERN_LENGTH};
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Token name → filter regex used when matching.
pub type FilterPatterns = HashMap<String, String>;

/// Capture fragment for tokens without a filter.
const DEFAULT_FILTER: &str = ".*";

/// Prefix of the named group emitted for each token occurrence.
const GROUP_PREFIX: &str = "tok";

// ═══════════════════════════════════════════════════════════════════════════════
// Compiler
// ═══════════════════════════════════════════════════════════════════════════════

/// Compiles template sources against a [`Config`].
///
/// # Example
///
/// ```
/// use tokenstring::{Config, FilterPatterns, PatternCompiler};
///
/// let config = Config::default();
/// let mut filters = FilterPatterns::new();
/// filters.insert("id".into(), r"\d+".into());
///
/// let pattern = PatternCompiler::new(&config).compile("a.b/{id}", &filters)?;
/// assert_eq!(pattern.expression(), r"~^a\.b/(?P<tok0>\d+)$~i");
/// assert!(pattern.is_match("a.b/42"));
/// assert!(!pattern.is_match("acb/42"));
/// # Ok::<(), tokenstring::TemplateError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PatternCompiler<'c> {
    config: &'c Config,
    format: &'c SourceFormat,
}

impl<'c> PatternCompiler<'c> {
    /// A compiler using the config's own source format.
    #[must_use]
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            format: config.source_format(),
        }
    }

    /// Use `format` instead of the config's source format.
    #[must_use]
    pub fn with_format(mut self, format: &'c SourceFormat) -> Self {
        self.format = format;
        self
    }

    /// Compile `source`, constraining tokens named in `filters`.
    ///
    /// Filters for names that do not occur in `source` are ignored.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::InvalidFilter`] / [`TemplateError::PatternTooLong`] for a bad filter
    /// - [`TemplateError::CompileFailed`] if the assembled regex does not compile
    pub fn compile(
        &self,
        source: &str,
        filters: &FilterPatterns,
    ) -> Result<CompiledPattern, TemplateError> {
        let delimiter = self.config.delimiter();
        let scan = Scan::new(source, self.config);

        // phase 1: one fragment per distinct token
        let mut fragments = Vec::with_capacity(scan.tokens.len());
        for token in &scan.tokens {
            let fragment = match filters.get(token.name()) {
                Some(filter) => {
                    validate_filter(token.name(), filter)?;
                    escape_delimiter(filter, delimiter)
                }
                None => DEFAULT_FILTER.to_owned(),
            };
            fragments.push(fragment);
        }

        // phases 2-4: walk literal runs and occurrences in order
        let mut body = String::with_capacity(source.len() * 2);
        let mut cursor = 0;
        for (i, occurrence) in scan.occurrences.iter().enumerate() {
            body.push_str(&quote(&source[cursor..occurrence.range.start], delimiter));
            let _ = write!(body, "(?P<{GROUP_PREFIX}{i}>{})", fragments[occurrence.slot]);
            cursor = occurrence.range.end;
        }
        body.push_str(&quote(&source[cursor..], delimiter));

        let wrapped = self.format.wrap(&body);
        let modifiers = self.format.modifiers();
        let expression = self.config.delimit(&wrapped, modifiers);
        let regex = Regex::new(&format!("{}{wrapped}", modifiers.inline_flags())).map_err(|e| {
            TemplateError::CompileFailed {
                expression: expression.clone(),
                source: e.to_string(),
            }
        })?;

        let groups = group_slots(&regex, &scan);
        log::debug!(
            "compiled {source:?} into {expression} ({} tokens, {} groups)",
            scan.tokens.len(),
            groups.len()
        );

        Ok(CompiledPattern {
            regex,
            expression,
            names: scan.tokens.iter().map(|t| t.name().to_owned()).collect(),
            groups,
        })
    }
}

/// Reject filters that are too long or do not compile on their own.
pub(crate) fn validate_filter(name: &str, pattern: &str) -> Result<(), TemplateError> {
    if pattern.len() > MAX_FILTER_PATTERN_LENGTH {
        return Err(TemplateError::PatternTooLong {
            name: name.to_owned(),
            len: pattern.len(),
            max: MAX_FILTER_PATTERN_LENGTH,
        });
    }
    Regex::new(pattern).map_err(|e| TemplateError::InvalidFilter {
        name: name.to_owned(),
        pattern: pattern.to_owned(),
        source: e.to_string(),
    })?;
    Ok(())
}

/// Escape literal text for embedding in a regex, delimiter included.
fn quote(literal: &str, delimiter: char) -> String {
    escape_delimiter(&regex::escape(literal), delimiter)
}

/// Backslash-escape every `delimiter` not already escaped.
fn escape_delimiter(pattern: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(pattern.len());
    for (i, c) in pattern.char_indices() {
        if c == delimiter && !is_escaped(pattern, i) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Map each occurrence group to (capture index, token slot).
fn group_slots(regex: &Regex, scan: &Scan) -> Vec<(usize, usize)> {
    let index_of: HashMap<&str, usize> = regex
        .capture_names()
        .enumerate()
        .filter_map(|(idx, name)| name.map(|n| (n, idx)))
        .collect();

    scan.occurrences
        .iter()
        .enumerate()
        .filter_map(|(i, occurrence)| {
            index_of
                .get(format!("{GROUP_PREFIX}{i}").as_str())
                .map(|&idx| (idx, occurrence.slot))
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Compiled pattern
// ═══════════════════════════════════════════════════════════════════════════════

/// A template compiled for matching.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    expression: String,
    names: Vec<String>,
    groups: Vec<(usize, usize)>,
}

impl CompiledPattern {
    /// The compiled regex.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The pattern in delimited form, e.g. `~^/blog/(?P<tok0>.*)$~i`.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Distinct token names, in capture order.
    #[must_use]
    pub fn token_names(&self) -> &[String] {
        &self.names
    }

    /// Whether `input` fits the template.
    #[must_use]
    pub fn is_match(&self, input: &str) -> bool {
        self.captures(input).is_some()
    }

    /// Extract token values from `input`.
    ///
    /// Returns `None` when `input` does not fit, including when two
    /// occurrences of the same name captured different text.
    #[must_use]
    pub fn captures(&self, input: &str) -> Option<Captures> {
        let caps = self.regex.captures(input)?;

        let mut values: Vec<Option<&str>> = vec![None; self.names.len()];
        for &(idx, slot) in &self.groups {
            let text = caps.get(idx).map_or("", |m| m.as_str());
            match values[slot] {
                Some(previous) => {
                    if previous != text {
                        return None;
                    }
                }
                None => values[slot] = Some(text),
            }
        }

        Some(Captures {
            entries: self
                .names
                .iter()
                .zip(values)
                .map(|(name, value)| (name.clone(), value.unwrap_or_default().to_owned()))
                .collect(),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Captures
// ═══════════════════════════════════════════════════════════════════════════════

/// Token values extracted by a successful match, in token order.
///
/// Empty (but present) when the template has no tokens and its literal text
/// matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    entries: Vec<(String, String)>,
}

impl Captures {
    /// The value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of captured tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(name, value)` pairs in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Convert into a name → value map.
    #[must_use]
    pub fn into_map(self) -> HashMap<String, String> {
        self.entries.into_iter().collect()
    }
}

impl IntoIterator for Captures {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Captures {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
