//! In-memory query target.
//!
//! [`MemoryTarget`] evaluates compiled queries over a vector of records with
//! SQL-like semantics:
//!
//! - a NULL field never satisfies a comparison, `IN`, `LIKE`, or `BETWEEN`
//! - strings and numbers compare numerically when the text parses as a
//!   number, otherwise not at all
//! - `LIKE` supports `%` and `_` and ignores ASCII case
//! - NULLs sort last in either direction
//!
//! Each record is one result row. Rows of a one-to-many join share a
//! [`Record::root_id`]; row queries return one row per root and distinct
//! counts count roots. A root sorts by the smallest value across its rows
//! when ascending and the largest when descending, the `MIN`/`MAX` ranking
//! [`SqlRenderer`](crate::SqlRenderer) emits for joined sources.

use std::cmp::Ordering;
use std::convert::Infallible;

use crate::literal::Literal;
use crate::predicate::Predicate;
use crate::query::{CountStrategy, Projection, Query};
use crate::sort::SortKey;
use crate::target::QueryTarget;
use crate::value::{FilterValue, Number};

/// A row the memory target can evaluate.
pub trait Record {
    /// The value stored at a storage reference (`e.string`). Unknown
    /// references read as `Null`.
    fn field(&self, column: &str) -> FilterValue;

    /// Identity of the root entity this row belongs to.
    fn root_id(&self) -> FilterValue;
}

/// Query target over an owned vector of records.
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget<R> {
    rows: Vec<R>,
}

impl<R: Record> MemoryTarget<R> {
    pub fn new(rows: Vec<R>) -> Self {
        MemoryTarget { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    fn matching(&self, query: &Query) -> Vec<&R> {
        self.rows
            .iter()
            .filter(|row| query.predicate.as_ref().map_or(true, |p| eval(*row, p)))
            .collect()
    }
}

impl<R: Record + Clone> QueryTarget for MemoryTarget<R> {
    type Row = R;
    type Error = Infallible;

    fn fetch_rows(&self, query: &Query) -> Result<Vec<R>, Infallible> {
        let mut roots: Vec<(&R, Vec<FilterValue>)> = group_by_root(self.matching(query))
            .into_iter()
            .filter_map(|group| Some((*group.first()?, rank(&group, &query.order))))
            .collect();
        if !query.order.is_empty() {
            roots.sort_by(|a, b| compare_ranks(&a.1, &b.1, &query.order));
        }
        let rows = roots.into_iter().map(|(row, _)| row.clone());
        Ok(match query.window {
            Some(window) => window.slice(rows).collect(),
            None => rows.collect(),
        })
    }

    fn count(&self, query: &Query) -> Result<u64, Infallible> {
        let strategy = match query.projection {
            Projection::Count(strategy) => strategy,
            _ => CountStrategy::Rows,
        };
        let matching = self.matching(query);
        let count = if strategy.is_distinct() {
            distinct_roots(matching).len()
        } else {
            matching.len()
        };
        Ok(count as u64)
    }

    fn fetch_values(&self, query: &Query) -> Result<Vec<FilterValue>, Infallible> {
        let Projection::Values(column) = &query.projection else {
            return Ok(Vec::new());
        };

        let mut values: Vec<FilterValue> = Vec::new();
        for row in self.matching(query) {
            let value = row.field(column);
            if !value.is_null() && !values.contains(&value) {
                values.push(value);
            }
        }
        Ok(match query.window {
            Some(window) => window.slice(values.into_iter()).collect(),
            None => values,
        })
    }
}

/// Keeps the first row of each root, preserving order.
fn distinct_roots<R: Record>(rows: Vec<&R>) -> Vec<&R> {
    let mut seen: Vec<FilterValue> = Vec::new();
    rows.into_iter()
        .filter(|row| {
            let id = row.root_id();
            if seen.contains(&id) {
                false
            } else {
                seen.push(id);
                true
            }
        })
        .collect()
}

/// Groups rows by root, in order of first appearance.
fn group_by_root<R: Record>(rows: Vec<&R>) -> Vec<Vec<&R>> {
    let mut ids: Vec<FilterValue> = Vec::new();
    let mut groups: Vec<Vec<&R>> = Vec::new();
    for row in rows {
        let id = row.root_id();
        match ids.iter().position(|seen| *seen == id) {
            Some(idx) => groups[idx].push(row),
            None => {
                ids.push(id);
                groups.push(vec![row]);
            }
        }
    }
    groups
}

/// The sort value of a root for each key: the smallest non-null value
/// across its rows when ascending, the largest when descending. NULL only
/// when every row is NULL.
fn rank<R: Record>(group: &[&R], keys: &[SortKey]) -> Vec<FilterValue> {
    keys.iter()
        .map(|key| {
            group
                .iter()
                .map(|row| row.field(&key.column))
                .filter(|value| !value.is_null())
                .fold(FilterValue::Null, |best, value| {
                    let better = best.is_null()
                        || compare_values(&value, &best).map(|o| key.dir.apply(o))
                            == Some(Ordering::Less);
                    if better {
                        value
                    } else {
                        best
                    }
                })
        })
        .collect()
}

/// Evaluates a predicate against one record.
pub fn eval<R: Record + ?Sized>(record: &R, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Compare { column, cmp, value } => {
            compare_literal(&record.field(column), value).is_some_and(|o| cmp.holds(o))
        }
        Predicate::In {
            column,
            values,
            negated,
        } => {
            let field = record.field(column);
            if field.is_null() {
                return false;
            }
            let found = values
                .iter()
                .any(|v| compare_literal(&field, v) == Some(Ordering::Equal));
            found != *negated
        }
        Predicate::Like { column, pattern } => {
            let field = record.field(column);
            !field.is_null() && like_match(&field.text(), pattern)
        }
        Predicate::Null { column, negated } => record.field(column).is_null() != *negated,
        Predicate::Between { column, low, high } => {
            let field = record.field(column);
            compare_literal(&field, low).is_some_and(|o| o != Ordering::Less)
                && compare_literal(&field, high).is_some_and(|o| o != Ordering::Greater)
        }
        Predicate::And(parts) => parts.iter().all(|p| eval(record, p)),
        Predicate::Or(parts) => parts.iter().any(|p| eval(record, p)),
    }
}

/// Compares a field to a literal, `None` when SQL would yield NULL.
fn compare_literal(field: &FilterValue, literal: &Literal) -> Option<Ordering> {
    match (field, literal) {
        (FilterValue::Null, _) => None,
        (FilterValue::Number(a), Literal::Number(b)) => a.compare(*b),
        (FilterValue::Number(a), Literal::Str(s)) => a.compare(Number::parse(s)?),
        (FilterValue::Number(a), Literal::Bool(b)) => a.compare(Number::from(*b as i64)),
        (FilterValue::String(a), Literal::Str(b)) => Some(a.as_str().cmp(b.as_str())),
        (FilterValue::String(a), Literal::Number(b)) => Number::parse(a)?.compare(*b),
        (FilterValue::Bool(a), Literal::Bool(b)) => Some(a.cmp(b)),
        (FilterValue::Bool(a), Literal::Number(b)) => Number::from(*a as i64).compare(*b),
        _ => None,
    }
}

/// Compares two field values for sorting. `None` on type mismatch.
fn compare_values(a: &FilterValue, b: &FilterValue) -> Option<Ordering> {
    match (a, b) {
        (FilterValue::Number(a), FilterValue::Number(b)) => a.compare(*b),
        (FilterValue::String(a), FilterValue::String(b)) => Some(a.cmp(b)),
        (FilterValue::Bool(a), FilterValue::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Compares two roots by their ranks, first key first.
///
/// NULLs go last regardless of direction. Incomparable values are treated
/// as equal and fall through to the next key.
fn compare_ranks(a: &[FilterValue], b: &[FilterValue], keys: &[SortKey]) -> Ordering {
    for ((va, vb), key) in a.iter().zip(b).zip(keys) {
        let ordering = match (va.is_null(), vb.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => compare_values(va, vb)
                .map(|o| key.dir.apply(o))
                .unwrap_or(Ordering::Equal),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// SQL `LIKE` matching with `%` (any run) and `_` (one character),
/// ignoring ASCII case.
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();
    let pattern: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '_' || c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star, mark)) => {
                    p = star + 1;
                    t = mark + 1;
                    backtrack = Some((star, mark + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '%')
}
