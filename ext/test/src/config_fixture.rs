//! Config conformance fixture runner.
//!
//! Loads YAML fixtures holding a raw config (the same shape [`ConfigFile`]
//! deserializes) and checks either the error it is rejected with or the
//! expressions it produces. This exercises the config loading path:
//! YAML → `ConfigFile` → `Config` → compiled pattern.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokenstring::{Config, ConfigFile, Template, TemplateError};

/// A config conformance test fixture.
#[derive(Debug, Deserialize)]
pub struct ConfigFixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Raw config value, deserialized as [`ConfigFile`].
    pub config: serde_json::Value,
    /// Expected error kind, e.g. `MissingSourcePlaceholder`.
    #[serde(default)]
    pub expect_error: Option<String>,
    #[serde(default)]
    pub token_expression: Option<String>,
    #[serde(default)]
    pub source_expression: Option<String>,
    /// Template → expected compiled expression.
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,
}

impl ConfigFixture {
    /// Parse a single config fixture from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple config fixtures from a YAML file with `---` separators.
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Deserialize and validate the config.
    pub fn load(&self) -> Result<Config, TemplateError> {
        let file: ConfigFile =
            serde_json::from_value(self.config.clone()).map_err(|e| TemplateError::InvalidConfig {
                source: e.to_string(),
            })?;
        file.build()
    }

    /// Load the config and panic on the first expectation that fails.
    pub fn run_and_assert(&self) {
        let result = self.load();

        if let Some(expected) = &self.expect_error {
            match result {
                Err(e) => assert_eq!(
                    error_kind(&e),
                    expected,
                    "Fixture '{}' rejected with the wrong error: {e}",
                    self.name
                ),
                Ok(_) => panic!("Fixture '{}' expected {expected}, config loaded", self.name),
            }
            return;
        }

        let config = result.unwrap_or_else(|e| panic!("Fixture '{}' failed: {e}", self.name));
        if let Some(expected) = &self.token_expression {
            assert_eq!(&config.token_expression(), expected, "Fixture '{}'", self.name);
        }
        if let Some(expected) = &self.source_expression {
            assert_eq!(&config.source_expression(), expected, "Fixture '{}'", self.name);
        }

        let config = Arc::new(config);
        for (source, expected) in &self.patterns {
            let template = Template::with_config(source.as_str(), Arc::clone(&config));
            let pattern = template
                .pattern()
                .unwrap_or_else(|e| panic!("Fixture '{}' template {source:?}: {e}", self.name));
            assert_eq!(
                pattern.expression(),
                expected,
                "Fixture '{}' template {source:?}",
                self.name
            );
        }
    }
}

/// Variant name of a [`TemplateError`].
#[must_use]
pub fn error_kind(error: &TemplateError) -> &'static str {
    match error {
        TemplateError::MissingCaptureGroup { .. } => "MissingCaptureGroup",
        TemplateError::TooManyCaptureGroups { .. } => "TooManyCaptureGroups",
        TemplateError::AnchoredTokenPattern { .. } => "AnchoredTokenPattern",
        TemplateError::MissingSourcePlaceholder { .. } => "MissingSourcePlaceholder",
        TemplateError::InvalidDelimiter { .. } => "InvalidDelimiter",
        TemplateError::InvalidModifier { .. } => "InvalidModifier",
        TemplateError::InvalidPattern { .. } => "InvalidPattern",
        TemplateError::InvalidConfig { .. } => "InvalidConfig",
        TemplateError::InvalidFilter { .. } => "InvalidFilter",
        TemplateError::PatternTooLong { .. } => "PatternTooLong",
        TemplateError::CompileFailed { .. } => "CompileFailed",
    }
}
