//! `Config` — the immutable settings every template is built against
//!
//! A `Config` bundles:
//!
//! - the **delimiter** used when a pattern is shown in delimited form (`~…~i`)
//!   and escaped inside compiled patterns
//! - the **token pattern**: the regex that finds `{token}` placeholders and
//!   captures their selector
//! - the **source format**: how a compiled template body is anchored
//!   (`^source$` requires a full-string match)
//! - the **filter registry** that `{name|filter}` tokens resolve against
//!
//! Every rule is checked once, in [`ConfigBuilder::build`]. A built `Config`
//! is valid by construction and is shared by reference (`Arc<Config>`)
//! between templates and matchers; there is no global mutable configuration.
//!
//! # Example
//!
//! ```
//! use tokenstring::{Config, TemplateError};
//!
//! let config = Config::builder()
//!     .delimiter('!')
//!     .token(r"`(\w+)`", "i")
//!     .build()?;
//! assert_eq!(config.token_expression(), "!`(\\w+)`!i");
//!
//! // Anchors belong to the source format, not the token pattern.
//! let err = Config::builder().token(r"^\{(\w+)\}", "").build().unwrap_err();
//! assert!(matches!(err, TemplateError::AnchoredTokenPattern { .. }));
//! # Ok::<(), TemplateError>(())
//! ```

use crate::{register_core_filters, FilterRegistry, FilterRegistryBuilder, TemplateError};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Default delimiter for displayed and escaped patterns.
pub const DEFAULT_DELIMITER: char = '~';

/// Default token pattern: `{name}`, `{name.path}`, `{name|filter}`.
pub const DEFAULT_TOKEN_PATTERN: &str = r"\{([a-z][.\w]*(?:\|[|\w]+)?)\}";

/// Default modifiers for the token pattern.
pub const DEFAULT_TOKEN_MODIFIERS: &str = "i";

/// Default source format: the whole input must match.
pub const DEFAULT_SOURCE_FORMAT: &str = "^source$";

/// Default modifiers for the source format.
pub const DEFAULT_SOURCE_MODIFIERS: &str = "i";

/// The text in a source format that is replaced by the compiled template body.
pub const SOURCE_PLACEHOLDER: &str = "source";

static DEFAULT_CONFIG: LazyLock<Arc<Config>> = LazyLock::new(|| Arc::new(Config::default()));

// ═══════════════════════════════════════════════════════════════════════════════
// Modifiers
// ═══════════════════════════════════════════════════════════════════════════════

/// Validated regex mode modifiers, written the way they trail a delimited
/// pattern (`i`, `ms`, …).
///
/// Supported: `i` (case-insensitive), `m` (multi-line), `s` (dot matches
/// newline), `U` (swap greedy), `x` (verbose), and `u`, which is accepted and
/// ignored since matching is always Unicode-aware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers(String);

impl Modifiers {
    /// Parse and validate a modifier string.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidModifier`] for any unsupported character.
    pub fn parse(modifiers: &str) -> Result<Self, TemplateError> {
        let mut parsed = String::new();
        for c in modifiers.chars() {
            match c {
                'i' | 'm' | 's' | 'U' | 'x' | 'u' => {
                    if !parsed.contains(c) {
                        parsed.push(c);
                    }
                }
                _ => return Err(TemplateError::InvalidModifier { modifier: c }),
            }
        }
        Ok(Self(parsed))
    }

    /// The modifiers as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Inline flag group to prepend to a pattern, e.g. `(?i)`; empty when no
    /// flag applies.
    #[must_use]
    pub fn inline_flags(&self) -> String {
        let flags: String = self.0.chars().filter(|&c| c != 'u').collect();
        if flags.is_empty() {
            String::new()
        } else {
            format!("(?{flags})")
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Token pattern
// ═══════════════════════════════════════════════════════════════════════════════

/// The regex that recognises placeholders in a source string.
///
/// # INV: exactly one capturing group, no anchors
///
/// The single group captures the selector. Anchoring is the job of the
/// [`SourceFormat`]; an anchored token pattern would only ever find a token
/// at the edge of the source.
#[derive(Debug, Clone)]
pub struct TokenPattern {
    pattern: String,
    modifiers: Modifiers,
    regex: Regex,
}

impl TokenPattern {
    /// Validate and compile a token pattern.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::AnchoredTokenPattern`] if the pattern starts or ends with an anchor
    /// - [`TemplateError::InvalidModifier`] for unsupported modifiers
    /// - [`TemplateError::InvalidPattern`] if the regex does not compile
    /// - [`TemplateError::MissingCaptureGroup`] / [`TemplateError::TooManyCaptureGroups`]
    ///   unless there is exactly one capturing group
    pub fn new(pattern: &str, modifiers: &str) -> Result<Self, TemplateError> {
        if is_anchored(pattern) {
            return Err(TemplateError::AnchoredTokenPattern {
                pattern: pattern.to_owned(),
            });
        }
        let modifiers = Modifiers::parse(modifiers)?;
        let regex = Regex::new(&format!("{}{pattern}", modifiers.inline_flags())).map_err(|e| {
            TemplateError::InvalidPattern {
                pattern: pattern.to_owned(),
                source: e.to_string(),
            }
        })?;

        match regex.captures_len() - 1 {
            0 => Err(TemplateError::MissingCaptureGroup {
                pattern: pattern.to_owned(),
            }),
            1 => Ok(Self {
                pattern: pattern.to_owned(),
                modifiers,
                regex,
            }),
            count => Err(TemplateError::TooManyCaptureGroups {
                pattern: pattern.to_owned(),
                count,
            }),
        }
    }

    /// The pattern as supplied, without modifiers.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The pattern's modifiers.
    #[must_use]
    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    /// The compiled regex.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

fn is_anchored(pattern: &str) -> bool {
    pattern.starts_with('^')
        || pattern.starts_with(r"\A")
        || pattern.ends_with(r"\z")
        || (pattern.ends_with('$') && !is_escaped(pattern, pattern.len() - 1))
}

/// Whether the byte at `index` is preceded by an odd number of backslashes.
pub(crate) fn is_escaped(s: &str, index: usize) -> bool {
    s.as_bytes()[..index]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count()
        % 2
        == 1
}

// ═══════════════════════════════════════════════════════════════════════════════
// Source format
// ═══════════════════════════════════════════════════════════════════════════════

/// How a compiled template body is embedded in the final matching pattern.
///
/// The format contains the text `source` exactly once; the compiled body
/// replaces it.
///
/// | Format | Matches |
/// |---|---|
/// | `^source$` | the entire input (default) |
/// | `^source` | the start of the input |
/// | `source$` | the end of the input |
/// | `source` | anywhere in the input |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFormat {
    format: String,
    modifiers: Modifiers,
    prefix: String,
    suffix: String,
}

impl SourceFormat {
    /// Validate a source format.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::MissingSourcePlaceholder`] unless `source` occurs exactly once
    /// - [`TemplateError::InvalidModifier`] for unsupported modifiers
    /// - [`TemplateError::InvalidPattern`] if the surrounding text is not valid regex
    pub fn new(format: &str, modifiers: &str) -> Result<Self, TemplateError> {
        let count = format.matches(SOURCE_PLACEHOLDER).count();
        let Some((prefix, suffix)) = format.split_once(SOURCE_PLACEHOLDER).filter(|_| count == 1)
        else {
            return Err(TemplateError::MissingSourcePlaceholder {
                format: format.to_owned(),
                count,
            });
        };
        let modifiers = Modifiers::parse(modifiers)?;

        Regex::new(&format!("{}{prefix}{suffix}", modifiers.inline_flags())).map_err(|e| {
            TemplateError::InvalidPattern {
                pattern: format.to_owned(),
                source: e.to_string(),
            }
        })?;

        Ok(Self {
            format: format.to_owned(),
            modifiers,
            prefix: prefix.to_owned(),
            suffix: suffix.to_owned(),
        })
    }

    /// The format as supplied.
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The format's modifiers.
    #[must_use]
    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    /// Embed a compiled body: `^source$` + `a\.b` → `^a\.b$`.
    #[must_use]
    pub fn wrap(&self, body: &str) -> String {
        format!("{}{body}{}", self.prefix, self.suffix)
    }
}

impl Default for SourceFormat {
    fn default() -> Self {
        Self {
            format: DEFAULT_SOURCE_FORMAT.to_owned(),
            modifiers: Modifiers(DEFAULT_SOURCE_MODIFIERS.to_owned()),
            prefix: "^".to_owned(),
            suffix: "$".to_owned(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Config
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable template configuration.
///
/// Build one with [`Config::builder`], or use [`Config::shared_default`].
#[derive(Debug, Clone)]
pub struct Config {
    delimiter: char,
    token: TokenPattern,
    source: SourceFormat,
    filters: FilterRegistry,
}

impl Config {
    /// Start building a configuration from the defaults.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// The process-wide default configuration. It is never mutated.
    #[must_use]
    pub fn shared_default() -> Arc<Config> {
        Arc::clone(&DEFAULT_CONFIG)
    }

    /// The pattern delimiter.
    #[must_use]
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// The token-recognition pattern.
    #[must_use]
    pub fn token_pattern(&self) -> &TokenPattern {
        &self.token
    }

    /// Shorthand for `token_pattern().regex()`.
    #[must_use]
    pub fn token_regex(&self) -> &Regex {
        self.token.regex()
    }

    /// The source-wrap format.
    #[must_use]
    pub fn source_format(&self) -> &SourceFormat {
        &self.source
    }

    /// The registry `{name|filter}` tokens resolve against.
    #[must_use]
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// The token pattern in delimited form, e.g. `~\{(…)\}~i`.
    #[must_use]
    pub fn token_expression(&self) -> String {
        self.delimit(self.token.pattern(), self.token.modifiers())
    }

    /// The source format in delimited form, e.g. `~^source$~i`.
    #[must_use]
    pub fn source_expression(&self) -> String {
        self.delimit(self.source.format(), self.source.modifiers())
    }

    pub(crate) fn delimit(&self, body: &str, modifiers: &Modifiers) -> String {
        let d = self.delimiter;
        format!("{d}{body}{d}{}", modifiers.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        let token = TokenPattern::new(DEFAULT_TOKEN_PATTERN, DEFAULT_TOKEN_MODIFIERS)
            .expect("default token pattern is valid");
        Self {
            delimiter: DEFAULT_DELIMITER,
            token,
            source: SourceFormat::default(),
            filters: register_core_filters(FilterRegistryBuilder::new()).build(),
        }
    }
}

/// Builder for [`Config`]. Starts from the defaults; validation happens in
/// [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    delimiter: char,
    token: (String, String),
    source: (String, String),
    filters: Option<FilterRegistry>,
}

impl ConfigBuilder {
    /// Create a builder holding the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            token: (
                DEFAULT_TOKEN_PATTERN.to_owned(),
                DEFAULT_TOKEN_MODIFIERS.to_owned(),
            ),
            source: (
                DEFAULT_SOURCE_FORMAT.to_owned(),
                DEFAULT_SOURCE_MODIFIERS.to_owned(),
            ),
            filters: None,
        }
    }

    /// Set the delimiter. Must be ASCII punctuation other than `\`, `<` and `>`
    /// (`\<` and `\>` are word boundaries in a regex).
    #[must_use]
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the token pattern and its modifiers.
    #[must_use]
    pub fn token(mut self, pattern: &str, modifiers: &str) -> Self {
        self.token = (pattern.to_owned(), modifiers.to_owned());
        self
    }

    /// Set the source format and its modifiers.
    #[must_use]
    pub fn source(mut self, format: &str, modifiers: &str) -> Self {
        self.source = (format.to_owned(), modifiers.to_owned());
        self
    }

    /// Replace the filter registry (the core filters are used otherwise).
    #[must_use]
    pub fn filters(mut self, filters: FilterRegistry) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Validate everything and produce the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found: delimiter, then token
    /// pattern, then source format.
    pub fn build(self) -> Result<Config, TemplateError> {
        if !self.delimiter.is_ascii_punctuation() || matches!(self.delimiter, '\\' | '<' | '>')
        {
            return Err(TemplateError::InvalidDelimiter {
                delimiter: self.delimiter,
            });
        }
        let token = TokenPattern::new(&self.token.0, &self.token.1)?;
        let source = SourceFormat::new(&self.source.0, &self.source.1)?;
        let filters = self
            .filters
            .unwrap_or_else(|| register_core_filters(FilterRegistryBuilder::new()).build());

        Ok(Config {
            delimiter: self.delimiter,
            token,
            source,
            filters,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
