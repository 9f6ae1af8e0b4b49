//! Serde-deserializable configuration (feature = "serde").
//!
//! Mirrors [`ConfigBuilder`]: every field is optional, and an omitted field
//! keeps its default. Validation happens when the file is turned into a
//! [`Config`], with the same errors the builder reports.
//!
//! ```json
//! {
//!   "delimiter": "#",
//!   "token": { "pattern": "\\[\\[([a-z][.\\w]*)\\]\\]", "modifiers": "i" },
//!   "source": { "format": "^source", "modifiers": "" }
//! }
//! ```
//!
//! | File type | Runtime type | Loader |
//! |---|---|---|
//! | [`ConfigFile`] | [`Config`] | [`ConfigFile::build`] / `TryFrom` |
//! | [`TokenConfig`] | [`TokenPattern`](crate::TokenPattern) | [`ConfigBuilder::token`] |
//! | [`SourceConfig`] | [`SourceFormat`](crate::SourceFormat) | [`ConfigBuilder::source`] |

use crate::{
    Config, ConfigBuilder, FilterRegistry, TemplateError, DEFAULT_SOURCE_MODIFIERS,
    DEFAULT_TOKEN_MODIFIERS,
};
use serde::Deserialize;

/// Configuration for a [`Config`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Delimiter used in the display form of compiled patterns.
    #[serde(default)]
    pub delimiter: Option<char>,

    /// Token pattern; the default `{name}` syntax when omitted.
    #[serde(default)]
    pub token: Option<TokenConfig>,

    /// Source format; `^source$` when omitted.
    #[serde(default)]
    pub source: Option<SourceConfig>,
}

/// Configuration for a [`TokenPattern`](crate::TokenPattern).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    /// Regex with exactly one capturing group around the selector.
    pub pattern: String,

    /// Mode modifiers; [`DEFAULT_TOKEN_MODIFIERS`] when omitted, `""` for none.
    #[serde(default = "default_token_modifiers")]
    pub modifiers: String,
}

/// Configuration for a [`SourceFormat`](crate::SourceFormat).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Format containing the word `source` exactly once.
    pub format: String,

    /// Mode modifiers; [`DEFAULT_SOURCE_MODIFIERS`] when omitted, `""` for none.
    #[serde(default = "default_source_modifiers")]
    pub modifiers: String,
}

fn default_token_modifiers() -> String {
    DEFAULT_TOKEN_MODIFIERS.to_owned()
}

fn default_source_modifiers() -> String {
    DEFAULT_SOURCE_MODIFIERS.to_owned()
}

impl ConfigFile {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// [`TemplateError::InvalidConfig`] if the JSON does not describe a config.
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        serde_json::from_str(json).map_err(|e| TemplateError::InvalidConfig {
            source: e.to_string(),
        })
    }

    /// The builder this file describes.
    #[must_use]
    pub fn builder(&self) -> ConfigBuilder {
        let mut builder = Config::builder();
        if let Some(delimiter) = self.delimiter {
            builder = builder.delimiter(delimiter);
        }
        if let Some(token) = &self.token {
            builder = builder.token(&token.pattern, &token.modifiers);
        }
        if let Some(source) = &self.source {
            builder = builder.source(&source.format, &source.modifiers);
        }
        builder
    }

    /// Validate and build the configuration with the core filters.
    ///
    /// # Errors
    ///
    /// Any configuration error [`ConfigBuilder::build`] reports.
    pub fn build(&self) -> Result<Config, TemplateError> {
        self.builder().build()
    }

    /// Validate and build the configuration with `filters`.
    ///
    /// # Errors
    ///
    /// Any configuration error [`ConfigBuilder::build`] reports.
    pub fn build_with_filters(&self, filters: FilterRegistry) -> Result<Config, TemplateError> {
        self.builder().filters(filters).build()
    }
}

impl TryFrom<ConfigFile> for Config {
    type Error = TemplateError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        file.build()
    }
}
