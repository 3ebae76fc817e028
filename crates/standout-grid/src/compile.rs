//! Condition compilation: `(column, operator, value)` to [`Predicate`].
//!
//! The value is always viewed as a list. Scalars are one-element lists, so
//! `v[0]` below is the scalar itself, and a missing element reads as null
//! (which formats as `''`).
//!
//! | Operator | One element | Several elements |
//! |----------|-------------|------------------|
//! | `EQ` / none | `col = v[0]` | `col IN (v...)` |
//! | `NEQ` | `col != v[0]` | `col NOT IN (v...)` |
//! | `GT` `GTE` `LT` `LTE` | `col <op> v[0]` | extra elements ignored |
//! | `LIKE` | `col LIKE '%v[0]%'` | |
//! | `STARTS` | `col LIKE 'v[0]%'` | |
//! | `ENDS` | `col LIKE '%v[0]'` | |
//! | `NEMPTY` | `col IS NOT NULL` | value ignored |
//! | `EMPTY` | `col IS NULL` | value ignored |
//! | `BETWEEN` | `col = v[0]` | `col BETWEEN v[0] AND v[1]` |
//! | `NBETWEEN` | `col != v[0]` | `col <= v[0] OR col >= v[1]` |

use crate::literal::Literal;
use crate::op::Operator;
use crate::predicate::{Comparison, Predicate};
use crate::value::FilterValue;

/// Compiles one condition against a storage column.
///
/// An absent operator compiles as `EQ`.
///
/// ```
/// use standout_grid::{compile, FilterValue, Operator};
///
/// let value = FilterValue::from(vec![6, 7, 8]);
/// assert_eq!(compile("e.int", None, &value).to_string(), "e.int IN (6, 7, 8)");
///
/// let value = FilterValue::from(vec![2]);
/// assert_eq!(
///     compile("e.int", Some(Operator::Between), &value).to_string(),
///     "e.int = 2"
/// );
/// ```
pub fn compile(column: &str, operator: Option<Operator>, value: &FilterValue) -> Predicate {
    let items = value.elements();
    let first = || Literal::format(value.element(0));

    match operator.unwrap_or(Operator::Eq) {
        Operator::Eq if items.len() > 1 => Predicate::is_in(column, format_all(items)),
        Operator::Eq => Predicate::eq(column, first()),
        Operator::Neq if items.len() > 1 => Predicate::not_in(column, format_all(items)),
        Operator::Neq => Predicate::ne(column, first()),
        Operator::Gt => Predicate::compare(column, Comparison::Gt, first()),
        Operator::Gte => Predicate::compare(column, Comparison::Gte, first()),
        Operator::Lt => Predicate::compare(column, Comparison::Lt, first()),
        Operator::Lte => Predicate::compare(column, Comparison::Lte, first()),
        Operator::Like => Predicate::like(column, format!("%{}%", value.element(0).text())),
        Operator::Starts => Predicate::like(column, format!("{}%", value.element(0).text())),
        Operator::Ends => Predicate::like(column, format!("%{}", value.element(0).text())),
        Operator::NEmpty => Predicate::is_not_null(column),
        Operator::Empty => Predicate::is_null(column),
        Operator::Between if items.len() >= 2 => Predicate::between(
            column,
            Literal::format(&items[0]),
            Literal::format(&items[1]),
        ),
        Operator::Between => Predicate::eq(column, first()),
        Operator::NBetween if items.len() >= 2 => Predicate::Or(vec![
            Predicate::compare(column, Comparison::Lte, Literal::format(&items[0])),
            Predicate::compare(column, Comparison::Gte, Literal::format(&items[1])),
        ]),
        Operator::NBetween => Predicate::ne(column, first()),
    }
}

fn format_all(items: &[FilterValue]) -> Vec<Literal> {
    items.iter().map(Literal::format).collect()
}
