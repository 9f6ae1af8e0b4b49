//! Render trace types for debugging template output.
//!
//! A [`RenderTrace`] records, for every placeholder occurrence, what the
//! render pass did with it. Use [`Template::render_trace`](crate::Template::render_trace)
//! to find out why a placeholder survived into the output.
//!
//! # Example
//!
//! ```
//! use tokenstring::{Outcome, Template};
//!
//! let template = Template::new("{greeting}, {name}!");
//! let trace = template.render_trace([("greeting", "Hello")]);
//!
//! assert_eq!(trace.output, "Hello, {name}!");
//! assert!(!trace.is_complete());
//! assert_eq!(trace.unresolved().collect::<Vec<_>>(), ["{name}"]);
//! assert!(matches!(trace.steps[1].outcome, Outcome::Unbound));
//! ```

use crate::{Token, ValueKind};

/// What happened to one placeholder occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Replaced by `value` (filters already applied).
    Resolved {
        /// The variant that produced the value.
        kind: ValueKind,
        /// The substituted text.
        value: String,
    },
    /// No value bound to the token's name; placeholder kept.
    Unbound,
    /// A value was bound but could not produce text (broken object path,
    /// nesting cycle or limit); placeholder kept.
    Unresolved {
        /// The variant that failed.
        kind: ValueKind,
    },
}

impl Outcome {
    /// Whether the placeholder was replaced.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// One placeholder occurrence in a trace, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderStep {
    /// The token as written at this occurrence.
    pub token: Token,
    /// What the render pass did with it.
    pub outcome: Outcome,
}

/// Trace of a full render pass.
///
/// # INV: `output` == `render_with()` result
///
/// The `output` field is exactly what [`Template::render_with`](crate::Template::render_with)
/// returns for the same data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTrace {
    /// The rendered string.
    pub output: String,
    /// One step per placeholder occurrence.
    pub steps: Vec<RenderStep>,
}

impl RenderTrace {
    /// Whether every placeholder was replaced.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.outcome.is_resolved())
    }

    /// Placeholder text of every occurrence left in the output.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.steps
            .iter()
            .filter(|s| !s.outcome.is_resolved())
            .map(|s| s.token.match_text())
    }
}
