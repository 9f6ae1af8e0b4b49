//! `Token` — one parsed `{selector}` placeholder
//!
//! A token's selector is split on `|` first (filters), then on `.` (path):
//!
//! ```text
//! {user.name|upper|trim}
//!  └──┬───┘ └────┬────┘
//!  name.path   filters
//! ```
//!
//! Scanning a source yields two views of the same placeholders:
//!
//! - the distinct [`Token`]s, one per name, in first-appearance order
//! - every [`Occurrence`], with its byte range and a slot into that token list
//!
//! Render and pattern compilation work on occurrences (positions), so a
//! repeated placeholder is handled the same way each time it appears.

use crate::Config;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

/// A single parsed placeholder.
///
/// # INV: `name` is never empty
///
/// Selectors whose name part is empty (only reachable with a custom token
/// pattern) are skipped during scanning and never become a `Token`.
///
/// # Example
///
/// ```
/// use tokenstring::Token;
///
/// let token = Token::parse("user.name|upper", "{user.name|upper}").unwrap();
/// assert_eq!(token.name(), "user");
/// assert_eq!(token.path(), ["name"]);
/// assert_eq!(token.filters(), ["upper"]);
/// assert_eq!(token.match_text(), "{user.name|upper}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    match_text: String,
    selector: String,
    name: String,
    path: Vec<String>,
    filters: Vec<String>,
}

impl Token {
    /// Parse a selector captured from `match_text`.
    ///
    /// Returns `None` when the selector has no name.
    #[must_use]
    pub fn parse(selector: &str, match_text: &str) -> Option<Self> {
        let mut parts = selector.split('|');
        let head = parts.next().unwrap_or_default();
        let filters = parts
            .filter(|f| !f.is_empty())
            .map(str::to_owned)
            .collect();

        let mut segments = head.split('.');
        let name = segments.next().unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        let path = segments
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect();

        Some(Self {
            match_text: match_text.to_owned(),
            selector: selector.to_owned(),
            name: name.to_owned(),
            path,
            filters,
        })
    }

    /// The exact text matched in the source, e.g. `{user.name|upper}`.
    #[must_use]
    pub fn match_text(&self) -> &str {
        &self.match_text
    }

    /// The placeholder's inner content, e.g. `user.name|upper`.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// The root identifier, e.g. `user`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Property names following the first dot.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Filter names, in application order.
    #[must_use]
    pub fn filters(&self) -> &[String] {
        &self.filters
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.match_text)
    }
}

/// One placeholder occurrence inside a source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Occurrence {
    /// Byte range of the placeholder text in the source.
    pub range: Range<usize>,
    /// Index into the distinct token list.
    pub slot: usize,
    /// The token as written at this occurrence (its own path and filters).
    pub token: Token,
}

/// Result of scanning a source string with the configured token pattern.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scan {
    pub tokens: Vec<Token>,
    pub occurrences: Vec<Occurrence>,
}

impl Scan {
    /// Scan `source` for placeholders.
    ///
    /// Duplicate names collapse into one token: the slot keeps the position of
    /// the first occurrence, the stored token is the last one seen.
    pub fn new(source: &str, config: &Config) -> Self {
        let mut scan = Self::default();
        let mut slots: HashMap<String, usize> = HashMap::new();
        for caps in config.token_regex().captures_iter(source) {
            let (Some(whole), Some(selector)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Some(token) = Token::parse(selector.as_str(), whole.as_str()) else {
                continue;
            };

            let slot = match slots.get(token.name()) {
                Some(&slot) => {
                    scan.tokens[slot] = token.clone();
                    slot
                }
                None => {
                    let slot = scan.tokens.len();
                    slots.insert(token.name().to_owned(), slot);
                    scan.tokens.push(token.clone());
                    slot
                }
            };

            scan.occurrences.push(Occurrence {
                range: whole.range(),
                slot,
                token,
            });
        }
        scan
    }
}
