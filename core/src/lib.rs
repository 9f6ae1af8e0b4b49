//! tokenstring - bidirectional string templates
//!
//! A [`Template`] holds a source string with `{token}` placeholders. It can be
//! **rendered** (placeholders replaced by bound values) and **matched**
//! (an arbitrary string is checked against the template and the text that
//! filled each placeholder is extracted).
//!
//! # Architecture
//!
//! - [`Token`] — one parsed placeholder: `{name.path|filter}`
//! - [`Config`] — immutable settings: delimiter, token pattern, source format, filters
//! - [`RendererValue`] — what a name is bound to: literal, function, JSON object, nested template
//! - [`PatternCompiler`] — template → one escaped, anchored [`CompiledPattern`]
//! - [`Template`] — source + tokens + data; render / resolve / chain / match
//! - [`Matcher`] — reverse matching with its own filter map, leaving the template untouched
//!
//! # Key Design Insights
//!
//! 1. **Soft failure on render**: a name with no bound value, or an object path
//!    that leads nowhere, leaves the placeholder text in the output. Rendering
//!    can be staged across several passes.
//!
//! 2. **Index-based pattern compilation**: literal text and placeholders are
//!    kept as separate segments while the pattern is built, so literal text is
//!    escaped exactly once and filter regexes are never escaped at all.
//!
//! 3. **No match is not an error**: [`Template::match_input`] returns
//!    `Ok(None)` when the input does not fit, and `Ok(Some(captures))`
//!    (possibly empty) when it does.
//!
//! # Example
//!
//! ```
//! use tokenstring::prelude::*;
//!
//! let mut template = Template::new("/blog/{date}/posts/{slug}/");
//! template.set_filter("date", r"\d{4}-\d{2}-\d{2}")?;
//!
//! let url = template.render_with([("date", "2016-04-16"), ("slug", "hello-world")]);
//! assert_eq!(url, "/blog/2016-04-16/posts/hello-world/");
//!
//! let captures = template.match_input(&url)?.expect("url fits the template");
//! assert_eq!(captures.get("slug"), Some("hello-world"));
//!
//! assert!(template.match_input("/blog/today/posts/hello-world/")?.is_none());
//! # Ok::<(), TemplateError>(())
//! ```
//!
//! # Filter patterns and resource use
//!
//! Filter patterns are interpolated into the compiled regex. Matching uses the
//! `regex` crate (linear time, no backtracking), so hostile filters cannot
//! cause exponential matching time; their size is bounded by
//! [`MAX_FILTER_PATTERN_LENGTH`]. Lookaround and backreferences are not
//! supported and are rejected as [`TemplateError::InvalidFilter`].

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod compiler;
mod config;
mod filter;
mod matcher;
mod template;
mod token;
mod trace;
mod value;

#[cfg(feature = "serde")]
mod config_file;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

pub use compiler::{Captures, CompiledPattern, FilterPatterns, PatternCompiler};
pub use config::{
    Config, ConfigBuilder, Modifiers, SourceFormat, TokenPattern, DEFAULT_DELIMITER,
    DEFAULT_SOURCE_FORMAT, DEFAULT_SOURCE_MODIFIERS, DEFAULT_TOKEN_MODIFIERS,
    DEFAULT_TOKEN_PATTERN, SOURCE_PLACEHOLDER,
};
pub use filter::{register_core_filters, FilterFn, FilterRegistry, FilterRegistryBuilder};
pub use matcher::Matcher;
pub use template::Template;
pub use token::Token;
pub use trace::{Outcome, RenderStep, RenderTrace};
pub use value::{Bindings, Data, DataMap, RenderFn, RendererValue, ValueKind};

#[cfg(feature = "serde")]
pub use config_file::{ConfigFile, SourceConfig, TokenConfig};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use tokenstring::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Bindings, Captures, CompiledPattern, Config, Data, Matcher, RendererValue, SourceFormat,
        Template, TemplateError, Token,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum nesting depth for [`RendererValue::NestedTemplate`] during a render.
///
/// A name that is already being expanded further up is never expanded again,
/// so this only bounds chains of distinct names. Past this depth the
/// placeholder is left unresolved.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Maximum number of [`RendererValue::NestedTemplate`] expansions in one
/// render, across all branches.
///
/// Templates that each use the next one twice double the work per level;
/// once the budget is spent the remaining placeholders are left unresolved.
pub const MAX_NESTED_EXPANSIONS: usize = 1024;

/// Maximum length of a single filter pattern.
///
/// Regex compilation cost grows with pattern size even with the linear-time
/// `regex` crate.
pub const MAX_FILTER_PATTERN_LENGTH: usize = 4096;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from configuration, filter registration and pattern compilation.
///
/// Configuration errors are raised by [`ConfigBuilder::build`], never at
/// render or match time. Rendering itself cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The token pattern has no capturing group for the selector.
    MissingCaptureGroup {
        /// The offending token pattern.
        pattern: String,
    },
    /// The token pattern has more than one capturing group.
    TooManyCaptureGroups {
        /// The offending token pattern.
        pattern: String,
        /// Number of capturing groups found.
        count: usize,
    },
    /// The token pattern starts or ends with an anchor.
    AnchoredTokenPattern {
        /// The offending token pattern.
        pattern: String,
    },
    /// The source format does not contain `source` exactly once.
    MissingSourcePlaceholder {
        /// The offending source format.
        format: String,
        /// How many times `source` was found.
        count: usize,
    },
    /// The delimiter is not ASCII punctuation, or is one of `\ < >`.
    InvalidDelimiter {
        /// The rejected delimiter.
        delimiter: char,
    },
    /// A mode modifier is not one of `i m s U x u`.
    InvalidModifier {
        /// The rejected modifier.
        modifier: char,
    },
    /// A token pattern or source format is not a valid regex.
    InvalidPattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// The underlying error message.
        source: String,
    },
    /// Configuration deserialization failed.
    InvalidConfig {
        /// The underlying error message.
        source: String,
    },
    /// A filter pattern is not a valid regex.
    InvalidFilter {
        /// The token name the filter was set for.
        name: String,
        /// The filter pattern.
        pattern: String,
        /// The underlying error message.
        source: String,
    },
    /// A filter pattern exceeds [`MAX_FILTER_PATTERN_LENGTH`].
    PatternTooLong {
        /// The token name the filter was set for.
        name: String,
        /// Actual length of the pattern.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },
    /// The assembled matching pattern failed to compile (e.g. size limit).
    CompileFailed {
        /// The delimited expression that was built.
        expression: String,
        /// The underlying error message.
        source: String,
    },
}

impl TemplateError {
    /// Whether this error comes from configuration (as opposed to a filter or
    /// a compiled pattern).
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingCaptureGroup { .. }
                | Self::TooManyCaptureGroups { .. }
                | Self::AnchoredTokenPattern { .. }
                | Self::MissingSourcePlaceholder { .. }
                | Self::InvalidDelimiter { .. }
                | Self::InvalidModifier { .. }
                | Self::InvalidPattern { .. }
                | Self::InvalidConfig { .. }
        )
    }
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCaptureGroup { pattern } => {
                write!(
                    f,
                    "token pattern \"{pattern}\" must contain a capturing group for the token name"
                )
            }
            Self::TooManyCaptureGroups { pattern, count } => {
                write!(
                    f,
                    "token pattern \"{pattern}\" has {count} capturing groups, but exactly one is \
                     allowed (use (?:...) for the others)"
                )
            }
            Self::AnchoredTokenPattern { pattern } => {
                write!(
                    f,
                    "token pattern \"{pattern}\" must not contain anchors; anchor the source \
                     format instead"
                )
            }
            Self::MissingSourcePlaceholder { format, count } => {
                write!(
                    f,
                    "source format \"{format}\" must contain \"source\" exactly once, found {count}"
                )
            }
            Self::InvalidDelimiter { delimiter } => {
                write!(
                    f,
                    "invalid delimiter {delimiter:?}: use ASCII punctuation other than \\, < or >"
                )
            }
            Self::InvalidModifier { modifier } => {
                write!(f, "invalid mode modifier {modifier:?}, supported: i m s U x u")
            }
            Self::InvalidPattern { pattern, source } => {
                write!(f, "invalid pattern \"{pattern}\": {source}")
            }
            Self::InvalidConfig { source } => {
                write!(f, "invalid config: {source}")
            }
            Self::InvalidFilter {
                name,
                pattern,
                source,
            } => {
                write!(f, "invalid filter \"{pattern}\" for token \"{name}\": {source}")
            }
            Self::PatternTooLong { name, len, max } => {
                write!(
                    f,
                    "filter for token \"{name}\" is {len} bytes long, but maximum allowed is {max}"
                )
            }
            Self::CompileFailed { expression, source } => {
                write!(f, "could not compile {expression}: {source}")
            }
        }
    }
}

impl std::error::Error for TemplateError {}
