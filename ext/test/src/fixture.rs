//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against tokenstring. A fixture is one
//! template plus render cases and match cases:
//!
//! ```yaml
//! name: blog_url
//! template: "/blog/{date}/posts/{slug}/"
//! data: { date: "2016-04-16" }
//! render:
//!   - name: bound and override
//!     data: { slug: hello }
//!     expect: "/blog/2016-04-16/posts/hello/"
//! match:
//!   - name: filtered date
//!     filters: { date: '\d{4}-\d{2}-\d{2}' }
//!     input: "/blog/today/posts/hello/"
//!     expect: ~
//! ```

use crate::{data_from_json, filters_from_json};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokenstring::{
    ConfigFile, Matcher, SourceFormat, Template, TemplateError, DEFAULT_SOURCE_MODIFIERS,
};

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Config for the template; defaults when omitted.
    #[serde(default)]
    pub config: Option<ConfigFile>,
    pub template: String,
    /// Data bound to the template before every case.
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub render: Vec<RenderCase>,
    #[serde(default, rename = "match")]
    pub matches: Vec<MatchCase>,
}

/// Render test case
#[derive(Debug, Deserialize)]
pub struct RenderCase {
    pub name: String,
    /// Data merged over the bound data for this render.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Resolve the bound data into the source first.
    #[serde(default)]
    pub resolve: bool,
    pub expect: String,
}

/// Match test case
#[derive(Debug, Deserialize)]
pub struct MatchCase {
    pub name: String,
    #[serde(default)]
    pub filters: serde_json::Value,
    /// Source format override, e.g. `^source`.
    #[serde(default)]
    pub format: Option<String>,
    /// Modifiers for `format`; the default source modifiers when omitted.
    #[serde(default)]
    pub modifiers: Option<String>,
    pub input: String,
    /// Expected captures; `~` for no match.
    pub expect: Option<BTreeMap<String, String>>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder: Convert fixture to tokenstring types
// ═══════════════════════════════════════════════════════════════════════════════

impl Fixture {
    /// Build the template with its config and bound data.
    pub fn build(&self) -> Result<Template, TemplateError> {
        let template = match &self.config {
            Some(config) => Template::with_config(self.template.as_str(), Arc::new(config.build()?)),
            None => Template::new(self.template.as_str()),
        };
        Ok(template.with_data(data_from_json(&self.data)))
    }
}

impl RenderCase {
    fn run(&self, template: &Template) -> String {
        let data = data_from_json(&self.data);
        if self.resolve {
            let mut template = template.clone();
            template.resolve(false);
            template.render_with(data)
        } else {
            template.render_with(data)
        }
    }
}

impl MatchCase {
    fn run(&self, template: &Template) -> Result<Option<BTreeMap<String, String>>, TemplateError> {
        let mut matcher = Matcher::new(template).with_filters(filters_from_json(&self.filters))?;
        if let Some(format) = &self.format {
            let modifiers = self.modifiers.as_deref().unwrap_or(DEFAULT_SOURCE_MODIFIERS);
            matcher.set_format(Some(SourceFormat::new(format, modifiers)?));
        }
        Ok(matcher
            .match_input(&self.input)?
            .map(|captures| captures.into_iter().collect()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Run all test cases and return results
    pub fn run(&self) -> Result<Vec<CaseResult>, TemplateError> {
        let template = self.build()?;
        let mut results = Vec::with_capacity(self.render.len() + self.matches.len());

        for case in &self.render {
            let actual = case.run(&template);
            results.push(CaseResult {
                case_name: case.name.clone(),
                passed: actual == case.expect,
                expected: case.expect.clone(),
                actual,
            });
        }

        for case in &self.matches {
            let actual = case.run(&template)?;
            results.push(CaseResult {
                case_name: case.name.clone(),
                passed: actual == case.expect,
                expected: format!("{:?}", case.expect),
                actual: format!("{actual:?}"),
            });
        }

        Ok(results)
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        let results = self
            .run()
            .unwrap_or_else(|e| panic!("Fixture '{}' failed to build: {e}", self.name));
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {:?}, got {:?}",
                self.name, result.case_name, result.expected, result.actual
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: partial
template: "{foo} {bar} {baz}"
data: { foo: foo, bar: bar }
render:
  - name: staged
    expect: "foo bar {baz}"
  - name: resolved then rendered
    resolve: true
    data: { baz: 1 }
    expect: "foo bar 1"
match:
  - name: captures
    input: "a b c"
    expect: { foo: a, bar: b, baz: c }
  - name: filtered miss
    filters: { baz: '\d+' }
    input: "a b c"
    expect: ~
---
name: literal
template: "/foo/"
match:
  - name: prefix format
    format: "^source"
    input: "/foo/bar"
    expect: {}
"#;

    #[test]
    fn parses_and_runs_multi() {
        let fixtures = Fixture::from_yaml_multi(YAML).unwrap();
        assert_eq!(fixtures.len(), 2);
        for fixture in &fixtures {
            fixture.run_and_assert();
        }
    }

    #[test]
    fn reports_failures() {
        let fixture = Fixture::from_yaml(
            r#"
name: wrong
template: "{a}"
render:
  - name: mismatch
    data: { a: x }
    expect: "y"
"#,
        )
        .unwrap();
        let results = fixture.run().unwrap();
        assert!(!results[0].passed);
        assert_eq!(results[0].actual, "x");
    }

    #[test]
    fn bad_config_fails_to_build() {
        let fixture = Fixture::from_yaml(
            r#"
name: bad
config: { delimiter: "a" }
template: "{a}"
"#,
        )
        .unwrap();
        assert!(matches!(
            fixture.run(),
            Err(TemplateError::InvalidDelimiter { .. })
        ));
    }
}
