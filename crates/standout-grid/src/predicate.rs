//! Predicate trees and the expression accumulator.
//!
//! A [`Predicate`] is the backend-neutral boolean expression handed to a
//! [`QueryTarget`](crate::QueryTarget). Columns are storage references
//! (`e.string`), never public keys. [`Junction`] collects predicates into an
//! `AND` or `OR` while a request is being compiled; it is also the
//! accumulator custom contributors fold their output into.

use std::cmp::Ordering;
use std::fmt;

use crate::literal::Literal;

/// Binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    /// The SQL token for this comparison.
    pub fn as_sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }

    /// Evaluates the comparison given `column.cmp(value)`.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ne => ordering != Ordering::Equal,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Gte => ordering != Ordering::Less,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Lte => ordering != Ordering::Greater,
        }
    }
}

/// A boolean expression over storage columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column <cmp> value`
    Compare {
        column: String,
        cmp: Comparison,
        value: Literal,
    },
    /// `column IN (...)` or `column NOT IN (...)`
    In {
        column: String,
        values: Vec<Literal>,
        negated: bool,
    },
    /// `column LIKE pattern`, with `%` and `_` wildcards.
    Like { column: String, pattern: String },
    /// `column IS NULL` or `column IS NOT NULL`
    Null { column: String, negated: bool },
    /// `column BETWEEN low AND high`, inclusive.
    Between {
        column: String,
        low: Literal,
        high: Literal,
    },
    /// All parts hold. An empty conjunction is true.
    And(Vec<Predicate>),
    /// At least one part holds. An empty disjunction is false.
    ///
    /// [`Junction`] never closes into an empty `Or`: an accumulator that
    /// received nothing imposes no condition at all.
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(column: impl Into<String>, cmp: Comparison, value: Literal) -> Self {
        Predicate::Compare {
            column: column.into(),
            cmp,
            value,
        }
    }

    pub fn eq(column: impl Into<String>, value: Literal) -> Self {
        Self::compare(column, Comparison::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: Literal) -> Self {
        Self::compare(column, Comparison::Ne, value)
    }

    pub fn is_in(column: impl Into<String>, values: Vec<Literal>) -> Self {
        Predicate::In {
            column: column.into(),
            values,
            negated: false,
        }
    }

    pub fn not_in(column: impl Into<String>, values: Vec<Literal>) -> Self {
        Predicate::In {
            column: column.into(),
            values,
            negated: true,
        }
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Predicate::Null {
            column: column.into(),
            negated: false,
        }
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Predicate::Null {
            column: column.into(),
            negated: true,
        }
    }

    pub fn between(column: impl Into<String>, low: Literal, high: Literal) -> Self {
        Predicate::Between {
            column: column.into(),
            low,
            high,
        }
    }

    /// Returns `true` for `And` / `Or` nodes.
    pub fn is_compound(&self) -> bool {
        matches!(self, Predicate::And(_) | Predicate::Or(_))
    }

    /// Storage columns referenced by this predicate, in visit order.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::In { column, .. }
            | Predicate::Like { column, .. }
            | Predicate::Null { column, .. }
            | Predicate::Between { column, .. } => out.push(column),
            Predicate::And(parts) | Predicate::Or(parts) => {
                for part in parts {
                    part.collect_columns(out);
                }
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { column, cmp, value } => {
                write!(f, "{column} {} {value}", cmp.as_sql())
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{column} {not}IN (")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, ")")
            }
            Predicate::Like { column, pattern } => {
                write!(f, "{column} LIKE {}", Literal::string(pattern.as_str()))
            }
            Predicate::Null { column, negated } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{column} IS {not}NULL")
            }
            Predicate::Between { column, low, high } => {
                write!(f, "{column} BETWEEN {low} AND {high}")
            }
            Predicate::And(parts) => write_joined(f, parts, " AND ", "1 = 1"),
            Predicate::Or(parts) => write_joined(f, parts, " OR ", "1 = 0"),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    parts: &[Predicate],
    sep: &str,
    empty: &str,
) -> fmt::Result {
    if parts.is_empty() {
        return write!(f, "{empty}");
    }
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            write!(f, "{sep}")?;
        }
        if part.is_compound() {
            write!(f, "({part})")?;
        } else {
            write!(f, "{part}")?;
        }
    }
    Ok(())
}

/// How a [`Junction`] combines its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

/// An `AND` or `OR` expression under construction.
///
/// ```
/// use standout_grid::{Junction, Literal, Predicate};
///
/// let mut any = Junction::any();
/// any.add(Predicate::like("e.string", "%9%"));
/// any.add(Predicate::eq("e.int", Literal::format(&9.into())));
/// assert_eq!(
///     any.into_predicate().unwrap().to_string(),
///     "e.string LIKE '%9%' OR e.int = 9"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    connective: Connective,
    parts: Vec<Predicate>,
}

impl Junction {
    /// An empty conjunction.
    pub fn all() -> Self {
        Junction {
            connective: Connective::And,
            parts: Vec::new(),
        }
    }

    /// An empty disjunction.
    pub fn any() -> Self {
        Junction {
            connective: Connective::Or,
            parts: Vec::new(),
        }
    }

    pub fn connective(&self) -> Connective {
        self.connective
    }

    /// Folds a predicate into the expression.
    pub fn add(&mut self, predicate: Predicate) {
        self.parts.push(predicate);
    }

    /// Folds another junction in as a single part.
    ///
    /// Empty junctions are dropped whatever their connective, so an empty
    /// disjunction adds no condition instead of rejecting every row.
    pub fn add_junction(&mut self, junction: Junction) {
        if let Some(predicate) = junction.into_predicate() {
            self.add(predicate);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn parts(&self) -> &[Predicate] {
        &self.parts
    }

    /// Closes the expression.
    ///
    /// Returns `None` when nothing was added and the bare predicate when
    /// exactly one part was added.
    pub fn into_predicate(mut self) -> Option<Predicate> {
        match self.parts.len() {
            0 => None,
            1 => self.parts.pop(),
            _ => Some(match self.connective {
                Connective::And => Predicate::And(self.parts),
                Connective::Or => Predicate::Or(self.parts),
            }),
        }
    }
}
