//! tokenstring-test: conformance fixtures and test helpers
//!
//! Converts plain JSON (or YAML, through the `fixtures` feature) into render
//! data and filters, so test cases can be written as data rather than code.
//!
//! Two object shapes are reserved in data:
//!
//! - `{"$fn": "name" | "selector" | "source"}` — a function value returning
//!   that property of the token being rendered
//! - `{"$template": "..."}` — a nested template
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tokenstring::Template;
//! use tokenstring_test::data_from_json;
//!
//! let data = data_from_json(&json!({
//!     "user": {"name": "Dave"},
//!     "who": {"$fn": "name"},
//!     "line": {"$template": "{user.name} ({who})"}
//! }));
//! assert_eq!(Template::new("{line}").render_with(data), "Dave (who)");
//! ```

use serde_json::{Map, Value};
use tokenstring::{Bindings, Data, RendererValue, Template, Token};

#[cfg(feature = "fixtures")]
pub mod config_fixture;
#[cfg(feature = "fixtures")]
pub mod fixture;

/// Reserved key for function values.
pub const FUNCTION_KEY: &str = "$fn";

/// Reserved key for nested template values.
pub const TEMPLATE_KEY: &str = "$template";

/// Convert JSON into render data.
///
/// Objects bind by name, arrays by position; anything else is empty data.
#[must_use]
pub fn data_from_json(value: &Value) -> Data {
    match value {
        Value::Object(map) => Bindings::Named(
            map.iter()
                .map(|(name, v)| (name.clone(), value_from_json(v)))
                .collect(),
        ),
        Value::Array(items) => Bindings::Positional(items.iter().map(value_from_json).collect()),
        _ => Bindings::default(),
    }
}

/// Convert one JSON value, honoring the reserved object shapes.
#[must_use]
pub fn value_from_json(value: &Value) -> RendererValue {
    if let Value::Object(map) = value {
        if let Some(value) = reserved(map) {
            return value;
        }
    }
    RendererValue::from(value.clone())
}

fn reserved(map: &Map<String, Value>) -> Option<RendererValue> {
    if map.len() != 1 {
        return None;
    }
    if let Some(Value::String(property)) = map.get(FUNCTION_KEY) {
        return Some(token_function(property));
    }
    if let Some(Value::String(source)) = map.get(TEMPLATE_KEY) {
        return Some(RendererValue::from(Template::new(source.as_str())));
    }
    None
}

/// A function value returning one property of the rendered token.
///
/// Unknown properties render as an empty string.
#[must_use]
pub fn token_function(property: &str) -> RendererValue {
    let property = property.to_owned();
    RendererValue::function(move |name: &str, token: &Token, source: &str| {
        match property.as_str() {
            "name" => name.to_owned(),
            "selector" => token.selector().to_owned(),
            "match" => token.match_text().to_owned(),
            "source" => source.to_owned(),
            _ => String::new(),
        }
    })
}

/// Convert JSON into filter bindings: an object of strings by name, an
/// array of strings by position. Non-string entries are skipped.
#[must_use]
pub fn filters_from_json(value: &Value) -> Bindings<String> {
    match value {
        Value::Object(map) => Bindings::Named(
            map.iter()
                .filter_map(|(name, v)| v.as_str().map(|s| (name.clone(), s.to_owned())))
                .collect(),
        ),
        Value::Array(items) => Bindings::Positional(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect(),
        ),
        _ => Bindings::default(),
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{data_from_json, filters_from_json, token_function, value_from_json};
    pub use tokenstring::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokenstring::ValueKind;

    #[test]
    fn objects_bind_by_name() {
        let data = data_from_json(&json!({"a": "1", "b": 2}));
        assert!(matches!(data, Bindings::Named(ref v) if v.len() == 2));
        assert_eq!(Template::new("{a}{b}").render_with(data), "12");
    }

    #[test]
    fn arrays_bind_by_position() {
        let data = data_from_json(&json!(["x", "y"]));
        assert_eq!(Template::new("{a}-{b}-{c}").render_with(data), "x-y-{c}");
    }

    #[test]
    fn scalars_are_empty_data() {
        assert!(data_from_json(&json!(null)).is_empty());
        assert!(data_from_json(&json!("x")).is_empty());
    }

    #[test]
    fn reserved_shapes() {
        assert_eq!(
            value_from_json(&json!({"$fn": "source"})).kind(),
            ValueKind::Function
        );
        assert_eq!(
            value_from_json(&json!({"$template": "{x}"})).kind(),
            ValueKind::NestedTemplate
        );
        // extra keys make it an ordinary object
        assert_eq!(
            value_from_json(&json!({"$fn": "name", "other": 1})).kind(),
            ValueKind::ObjectPath
        );
    }

    #[test]
    fn token_function_properties() {
        let data = data_from_json(&json!({
            "a": {"$fn": "selector"},
            "b": {"$fn": "match"},
            "c": {"$fn": "nope"}
        }));
        assert_eq!(
            Template::new("{a.x}|{b|upper}|{c}").render_with(data),
            "a.x|{B|UPPER}|"
        );
    }

    #[test]
    fn filters_by_name_and_position() {
        let named = filters_from_json(&json!({"a": r"\d+", "b": 5}));
        assert!(matches!(named, Bindings::Named(ref v) if v.len() == 1));

        let positional = filters_from_json(&json!([r"\d+", "x"]));
        let pairs = positional.associate(["id", "name"]);
        assert_eq!(pairs[1], ("name".to_owned(), "x".to_owned()));
    }
}
