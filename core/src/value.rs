//! `RendererValue` — what a token name is bound to
//!
//! | Variant | Resolves to |
//! |---|---|
//! | [`Literal`](RendererValue::Literal) | itself |
//! | [`Function`](RendererValue::Function) | the function's return value |
//! | [`ObjectPath`](RendererValue::ObjectPath) | the JSON value at the token's path |
//! | [`NestedTemplate`](RendererValue::NestedTemplate) | the nested template, rendered with the same data |
//!
//! Values are usually built through `From`: strings, numbers and `bool`
//! become literals, `serde_json::Value` objects become object paths,
//! `Template`s become nested templates.
//!
//! [`Bindings`] is the input side: values supplied either by name or by
//! position.

use crate::{Template, Token, MAX_NESTED_EXPANSIONS, MAX_NESTING_DEPTH};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Function value: called with `(name, token, source)`, where `source` is the
/// working copy of the text: earlier placeholders of the same pass already
/// substituted, this one and the rest still as written.
pub type RenderFn = Arc<dyn Fn(&str, &Token, &str) -> String + Send + Sync>;

/// Name → value mapping a template renders against.
pub type DataMap = HashMap<String, RendererValue>;

/// Render data, by name or by position.
pub type Data = Bindings<RendererValue>;

/// A value bound to a token name.
#[derive(Clone)]
pub enum RendererValue {
    /// Plain text.
    Literal(String),
    /// Computed on every render.
    Function(RenderFn),
    /// A JSON value walked with the token's path (`{user.name}`).
    ObjectPath(serde_json::Value),
    /// Another template, rendered with the caller's data. Shared, never mutated.
    NestedTemplate(Arc<Template>),
}

/// Discriminant of a [`RendererValue`], used in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// [`RendererValue::Literal`]
    Literal,
    /// [`RendererValue::Function`]
    Function,
    /// [`RendererValue::ObjectPath`]
    ObjectPath,
    /// [`RendererValue::NestedTemplate`]
    NestedTemplate,
}

impl RendererValue {
    /// A literal value.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// A function value.
    ///
    /// # Example
    ///
    /// ```
    /// use tokenstring::{RendererValue, Template};
    ///
    /// let mut template = Template::new("{greeting}, world");
    /// template.set("greeting", RendererValue::function(|name, _, _| name.to_uppercase()));
    /// assert_eq!(template.render(), "GREETING, world");
    /// ```
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&str, &Token, &str) -> String + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// An object value walked by path.
    #[must_use]
    pub fn object(value: serde_json::Value) -> Self {
        Self::ObjectPath(value)
    }

    /// A nested template value.
    pub fn template(template: impl Into<Arc<Template>>) -> Self {
        Self::NestedTemplate(template.into())
    }

    /// Which variant this is.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Literal(_) => ValueKind::Literal,
            Self::Function(_) => ValueKind::Function,
            Self::ObjectPath(_) => ValueKind::ObjectPath,
            Self::NestedTemplate(_) => ValueKind::NestedTemplate,
        }
    }

    /// Resolve this value for `token`, without applying the token's filters.
    ///
    /// A failed object path walk returns the token's own placeholder text.
    #[must_use]
    pub fn resolve(&self, token: &Token, data: &DataMap, source: &str) -> String {
        self.resolve_at(token, data, source, &mut Nesting::default())
            .unwrap_or_else(|| token.match_text().to_owned())
    }

    /// `None` means "leave the placeholder as it is".
    pub(crate) fn resolve_at(
        &self,
        token: &Token,
        data: &DataMap,
        source: &str,
        nesting: &mut Nesting,
    ) -> Option<String> {
        match self {
            Self::Literal(value) => Some(value.clone()),
            Self::Function(f) => Some(f(token.name(), token, source)),
            Self::ObjectPath(root) => walk(root, token.path()),
            Self::NestedTemplate(template) => {
                nesting.enter(token)?;
                let rendered = template.render_nested(data, nesting);
                nesting.leave();
                Some(rendered)
            }
        }
    }
}

/// Nested-template bookkeeping for one render pass.
///
/// Data only grows on the way down and the caller's value wins, so a name
/// already on the path is bound to the same template again: a cycle.
#[derive(Debug, Default)]
pub(crate) struct Nesting {
    /// Names whose templates are being expanded, outermost first.
    path: Vec<String>,
    /// Nested templates expanded so far, across all branches.
    expansions: usize,
}

impl Nesting {
    fn enter(&mut self, token: &Token) -> Option<()> {
        let name = token.name();
        if self.path.iter().any(|n| n == name) {
            log::warn!(
                "{} refers back to itself through {:?}, left unresolved",
                token.match_text(),
                self.path
            );
            return None;
        }
        if self.path.len() >= MAX_NESTING_DEPTH {
            log::warn!(
                "nesting depth {MAX_NESTING_DEPTH} exceeded at {}, left unresolved",
                token.match_text()
            );
            return None;
        }
        if self.expansions >= MAX_NESTED_EXPANSIONS {
            log::warn!(
                "{MAX_NESTED_EXPANSIONS} nested expansions reached at {}, left unresolved",
                token.match_text()
            );
            return None;
        }
        self.expansions += 1;
        self.path.push(name.to_owned());
        Some(())
    }

    fn leave(&mut self) {
        self.path.pop();
    }
}

/// Walk `path` from `root`. Only a scalar at the end of the walk renders.
fn walk(root: &serde_json::Value, path: &[String]) -> Option<String> {
    use serde_json::Value;

    let mut current = root;
    for prop in path {
        current = match current {
            Value::Object(map) => map.get(prop)?,
            Value::Array(items) => items.get(prop.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl fmt::Debug for RendererValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
            Self::ObjectPath(v) => f.debug_tuple("ObjectPath").field(v).finish(),
            Self::NestedTemplate(t) => f.debug_tuple("NestedTemplate").field(&t.source()).finish(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Conversions
// ═══════════════════════════════════════════════════════════════════════════════

impl From<&str> for RendererValue {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_owned())
    }
}

impl From<String> for RendererValue {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<&String> for RendererValue {
    fn from(value: &String) -> Self {
        Self::Literal(value.clone())
    }
}

macro_rules! literal_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RendererValue {
                fn from(value: $ty) -> Self {
                    Self::Literal(value.to_string())
                }
            }
        )*
    };
}

literal_from_display!(char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// Strings become literals; everything else is walked as an object path.
impl From<serde_json::Value> for RendererValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::Literal(s),
            other => Self::ObjectPath(other),
        }
    }
}

impl From<Template> for RendererValue {
    fn from(template: Template) -> Self {
        Self::NestedTemplate(Arc::new(template))
    }
}

impl From<Arc<Template>> for RendererValue {
    fn from(template: Arc<Template>) -> Self {
        Self::NestedTemplate(template)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Bindings
// ═══════════════════════════════════════════════════════════════════════════════

/// Values supplied by name, or by position against a template's token names.
///
/// Positional values are zipped with the distinct token names in
/// first-appearance order: extra values are dropped, missing ones leave the
/// trailing names unbound.
///
/// # Example
///
/// ```
/// use tokenstring::{Data, Template};
///
/// let template = Template::new("{a} {b} {c}");
/// assert_eq!(template.render_with(vec!["1", "2"]), "1 2 {c}");
/// assert_eq!(template.render_with([("c", "3")]), "{a} {b} 3");
/// assert_eq!(template.render_with(Data::default()), "{a} {b} {c}");
/// ```
#[derive(Debug, Clone)]
pub enum Bindings<T> {
    /// Values keyed by token name.
    Named(Vec<(String, T)>),
    /// Values in token order.
    Positional(Vec<T>),
}

impl<T> Bindings<T> {
    /// Values keyed by name.
    pub fn named<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<T>,
    {
        Self::Named(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Values in token order.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Number of supplied values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Named(values) => values.len(),
            Self::Positional(values) => values.len(),
        }
    }

    /// Whether no values were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to name → value pairs, zipping positional values with `names`.
    pub fn associate<'a, I>(self, names: I) -> Vec<(String, T)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            Self::Named(values) => values,
            Self::Positional(values) => names
                .into_iter()
                .map(str::to_owned)
                .zip(values)
                .collect(),
        }
    }
}

impl<T> Default for Bindings<T> {
    fn default() -> Self {
        Self::Named(Vec::new())
    }
}

impl<T, K, V, const N: usize> From<[(K, V); N]> for Bindings<T>
where
    K: Into<String>,
    V: Into<T>,
{
    fn from(values: [(K, V); N]) -> Self {
        Self::named(values)
    }
}

impl<T, K, V, S> From<HashMap<K, V, S>> for Bindings<T>
where
    K: Into<String>,
    V: Into<T>,
{
    fn from(values: HashMap<K, V, S>) -> Self {
        Self::named(values)
    }
}

impl<T, K, V> From<BTreeMap<K, V>> for Bindings<T>
where
    K: Into<String>,
    V: Into<T>,
{
    fn from(values: BTreeMap<K, V>) -> Self {
        Self::named(values)
    }
}

impl<T, V> From<Vec<V>> for Bindings<T>
where
    V: Into<T>,
{
    fn from(values: Vec<V>) -> Self {
        Self::positional(values)
    }
}
