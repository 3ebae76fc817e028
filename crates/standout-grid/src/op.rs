//! Filter operators.
//!
//! The [`Operator`] enum names every predicate shape a condition can
//! request. The mapping from operator to predicate lives in
//! [`compile`](crate::compile).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operator for a filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    // Equality
    /// Equal, or `IN` for lists.
    Eq,
    /// Not equal, or `NOT IN` for lists.
    Neq,

    // Ordering
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Greater than or equal.
    Gte,
    /// Less than or equal.
    Lte,

    // Pattern
    /// Contains (`LIKE '%v%'`).
    Like,
    /// Starts with (`LIKE 'v%'`).
    Starts,
    /// Ends with (`LIKE '%v'`).
    Ends,

    // Null tests
    /// `IS NOT NULL`.
    #[serde(rename = "NEMPTY")]
    NEmpty,
    /// `IS NULL`.
    Empty,

    // Ranges
    /// Inclusive range.
    Between,
    /// Outside an inclusive range.
    #[serde(rename = "NBETWEEN")]
    NBetween,
}

/// Every operator, in declaration order.
pub const ALL_OPERATORS: [Operator; 13] = [
    Operator::Eq,
    Operator::Neq,
    Operator::Gt,
    Operator::Lt,
    Operator::Gte,
    Operator::Lte,
    Operator::Like,
    Operator::Starts,
    Operator::Ends,
    Operator::NEmpty,
    Operator::Empty,
    Operator::Between,
    Operator::NBetween,
];

/// Key suffixes that select an operator in a simple filter map.
///
/// Longer suffixes come first so `_gte` wins over `_gt` and `_nbetween`
/// over `_between`.
const SUFFIXES: [(&str, Operator); 10] = [
    ("_nbetween", Operator::NBetween),
    ("_between", Operator::Between),
    ("_starts", Operator::Starts),
    ("_ends", Operator::Ends),
    ("_like", Operator::Like),
    ("_neq", Operator::Neq),
    ("_gte", Operator::Gte),
    ("_lte", Operator::Lte),
    ("_gt", Operator::Gt),
    ("_lt", Operator::Lt),
];

impl Operator {
    /// Parses an operator name, ignoring case.
    ///
    /// Returns `None` for unknown names; the compiler treats a missing
    /// operator as `EQ`.
    pub fn parse(name: &str) -> Option<Operator> {
        ALL_OPERATORS
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Returns the wire name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "EQ",
            Operator::Neq => "NEQ",
            Operator::Gt => "GT",
            Operator::Lt => "LT",
            Operator::Gte => "GTE",
            Operator::Lte => "LTE",
            Operator::Like => "LIKE",
            Operator::Starts => "STARTS",
            Operator::Ends => "ENDS",
            Operator::NEmpty => "NEMPTY",
            Operator::Empty => "EMPTY",
            Operator::Between => "BETWEEN",
            Operator::NBetween => "NBETWEEN",
        }
    }

    /// Returns `false` for the null tests, which ignore any supplied value.
    pub fn requires_value(self) -> bool {
        !matches!(self, Operator::NEmpty | Operator::Empty)
    }

    /// Splits an operator suffix off a simple filter key.
    ///
    /// `"int_gte"` becomes `("int", Gte)`. Keys without a known suffix, or
    /// whose stem would be empty, return `None`.
    pub fn split_suffix(key: &str) -> Option<(&str, Operator)> {
        SUFFIXES.iter().find_map(|(suffix, op)| {
            key.strip_suffix(suffix)
                .filter(|stem| !stem.is_empty())
                .map(|stem| (stem, *op))
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_every_name() {
        for op in ALL_OPERATORS {
            assert_eq!(Operator::parse(op.as_str()), Some(op));
        }
    }

    #[test]
    fn parse_ignores_case() {
        assert_eq!(Operator::parse("gte"), Some(Operator::Gte));
        assert_eq!(Operator::parse("NEmpty"), Some(Operator::NEmpty));
    }

    #[test]
    fn parse_unknown() {
        assert_eq!(Operator::parse("FL"), None);
        assert_eq!(Operator::parse(""), None);
    }

    #[test]
    fn serde_names() {
        let op: Operator = serde_json::from_str(r#""NBETWEEN""#).unwrap();
        assert_eq!(op, Operator::NBetween);
        assert_eq!(serde_json::to_string(&Operator::NEmpty).unwrap(), r#""NEMPTY""#);
    }

    #[test]
    fn null_tests_take_no_value() {
        assert!(!Operator::Empty.requires_value());
        assert!(!Operator::NEmpty.requires_value());
        assert!(Operator::Between.requires_value());
    }

    #[test]
    fn suffix_split() {
        assert_eq!(Operator::split_suffix("int_gte"), Some(("int", Operator::Gte)));
        assert_eq!(Operator::split_suffix("int_gt"), Some(("int", Operator::Gt)));
        assert_eq!(Operator::split_suffix("int_lt"), Some(("int", Operator::Lt)));
        assert_eq!(
            Operator::split_suffix("date_nbetween"),
            Some(("date", Operator::NBetween))
        );
        assert_eq!(Operator::split_suffix("custom_string"), None);
        assert_eq!(Operator::split_suffix("_gt"), None);
    }
}
