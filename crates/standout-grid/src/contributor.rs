//! Per-column predicate contributors.
//!
//! A [`PredicateContributor`] replaces the operator table for one column.
//! It receives the raw value, the storage reference, the accumulator it
//! must fold its predicate into, and the requested operator (`None` when
//! invoked for a search term). Contributors are registered once and shared
//! read-only across requests, hence the `Send + Sync` bound.

use crate::compile::compile;
use crate::error::Result;
use crate::op::Operator;
use crate::predicate::Junction;
use crate::query::QueryDraft;
use crate::value::FilterValue;

/// Produces the predicate for one column.
pub trait PredicateContributor: Send + Sync {
    /// Compiles `value` against `column` and folds the result into `expr`.
    ///
    /// Adding nothing is allowed; an advanced group left empty is skipped.
    fn contribute(
        &self,
        draft: &mut QueryDraft,
        value: &FilterValue,
        column: &str,
        expr: &mut Junction,
        operator: Option<Operator>,
    ) -> Result<()>;
}

impl<F> PredicateContributor for F
where
    F: Fn(&mut QueryDraft, &FilterValue, &str, &mut Junction, Option<Operator>) -> Result<()>
        + Send
        + Sync,
{
    fn contribute(
        &self,
        draft: &mut QueryDraft,
        value: &FilterValue,
        column: &str,
        expr: &mut Junction,
        operator: Option<Operator>,
    ) -> Result<()> {
        self(draft, value, column, expr, operator)
    }
}

/// The default contributor: the built-in operator table.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorTable;

impl PredicateContributor for OperatorTable {
    fn contribute(
        &self,
        _draft: &mut QueryDraft,
        value: &FilterValue,
        column: &str,
        expr: &mut Junction,
        operator: Option<Operator>,
    ) -> Result<()> {
        expr.add(compile(column, operator, value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use crate::predicate::Predicate;
    use crate::query::{Join, QuerySource};

    fn draft() -> QueryDraft {
        QueryDraft::new(QuerySource::new("entity", "e"))
    }

    #[test]
    fn operator_table_compiles() {
        let mut expr = Junction::all();
        OperatorTable
            .contribute(
                &mut draft(),
                &FilterValue::from(3),
                "e.int",
                &mut expr,
                Some(Operator::Gte),
            )
            .unwrap();
        assert_eq!(expr.into_predicate().unwrap().to_string(), "e.int >= 3");
    }

    #[test]
    fn closures_are_contributors() {
        let contributor = |draft: &mut QueryDraft,
                           value: &FilterValue,
                           _column: &str,
                           expr: &mut Junction,
                           _op: Option<Operator>|
         -> Result<()> {
            draft.add_join(Join::left("tag", "t", "t.entity_id = e.id"));
            expr.add(Predicate::eq("t.name", Literal::format(value)));
            Ok(())
        };

        let mut draft = draft();
        let mut expr = Junction::any();
        contributor
            .contribute(&mut draft, &"red".into(), "e.string", &mut expr, None)
            .unwrap();
        assert_eq!(draft.source().joins.len(), 1);
        assert_eq!(expr.into_predicate().unwrap().to_string(), "t.name = 'red'");
    }
}
