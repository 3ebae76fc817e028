//! Storage-layer literals.
//!
//! [`Literal::format`] normalizes a raw [`FilterValue`] into the literal a
//! predicate carries. Formatting never fails: every input shape has a
//! literal counterpart.

use std::fmt;

use crate::value::{FilterValue, Number};

/// A normalized literal ready to be bound or inlined into a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Unquoted numeric literal.
    Number(Number),
    /// `true` / `false` token.
    Bool(bool),
    /// Quoted string literal.
    Str(String),
    /// Per-element formatted list.
    List(Vec<Literal>),
}

impl Literal {
    /// Formats a raw filter value.
    ///
    /// `null` becomes the empty string literal, not a NULL test. Callers
    /// that need NULL semantics use the `EMPTY` / `NEMPTY` operators.
    ///
    /// ```
    /// use standout_grid::{FilterValue, Literal};
    ///
    /// assert_eq!(Literal::format(&FilterValue::Null).to_string(), "''");
    /// assert_eq!(Literal::format(&FilterValue::from("it's")).to_string(), "'it''s'");
    /// assert_eq!(Literal::format(&FilterValue::from(3)).to_string(), "3");
    /// ```
    pub fn format(value: &FilterValue) -> Literal {
        match value {
            FilterValue::Null => Literal::Str(String::new()),
            FilterValue::Bool(b) => Literal::Bool(*b),
            FilterValue::Number(n) => Literal::Number(*n),
            FilterValue::String(s) => Literal::Str(s.clone()),
            FilterValue::List(items) => Literal::List(items.iter().map(Literal::format).collect()),
        }
    }

    /// Builds a string literal, used for `LIKE` patterns.
    pub fn string(s: impl Into<String>) -> Literal {
        Literal::Str(s.into())
    }

    /// Extracts the string content, if this is a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Bool(true) => write!(f, "true"),
            Literal::Bool(false) => write!(f, "false"),
            Literal::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::List(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&FilterValue> for Literal {
    fn from(value: &FilterValue) -> Self {
        Literal::format(value)
    }
}
