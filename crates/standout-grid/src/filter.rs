//! Filter assembly.
//!
//! Builds the top-level predicate of a request from three sources, in
//! order:
//!
//! ```text
//! predicate = simple_1 AND simple_2 AND ...
//!           AND (group_1: c OR c ...) AND (group_2: c OR c ...) ...
//!           AND (search: col_1 LIKE '%t%' OR col_2 LIKE '%t%' ...)
//! ```
//!
//! Every condition is validated before anything is returned, so a failure
//! never leaves a partial predicate behind.
//!
//! A group or search whose contributors add nothing is skipped: it narrows
//! nothing rather than matching nothing.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::contributor::{OperatorTable, PredicateContributor};
use crate::error::{GridError, Result};
use crate::op::Operator;
use crate::predicate::{Junction, Predicate};
use crate::query::QueryDraft;
use crate::registry::ColumnRegistry;
use crate::request::{ConditionEntry, MODIFIER_VAL_NOT_NULL, MODIFIER_VAL_NULL};
use crate::value::FilterValue;

/// Assembles the filter predicate of a request.
///
/// Returns `None` when the request carries no conditions. Contributors may
/// attach joins to `draft`.
pub fn assemble(
    registry: &ColumnRegistry,
    draft: &mut QueryDraft,
    simple: &BTreeMap<String, FilterValue>,
    advanced: &[Vec<ConditionEntry>],
    search: Option<&str>,
) -> Result<Option<Predicate>> {
    let mut all = Junction::all();

    apply_simple(registry, draft, simple, &mut all)?;

    let mut groups = Junction::all();
    for group in advanced {
        groups.add_junction(compile_group(registry, draft, group)?);
    }
    let group_count = groups.len();
    all.add_junction(groups);

    let searched = match search.filter(|term| !term.is_empty()) {
        Some(term) => {
            all.add_junction(compile_search(registry, draft, term)?);
            true
        }
        None => false,
    };

    debug!(
        grid = registry.name(),
        simple = simple.len(),
        groups = group_count,
        searched,
        "assembled filter"
    );

    Ok(all.into_predicate())
}

/// Resolves a simple filter key to its column key and operator.
///
/// A key that is itself filterable always wins over suffix parsing, so a
/// column literally named `price_gt` stays addressable.
fn resolve_simple_key<'k>(registry: &ColumnRegistry, key: &'k str) -> (&'k str, Operator) {
    if registry.is_filterable(key) {
        return (key, Operator::Eq);
    }
    match Operator::split_suffix(key) {
        Some((stem, op)) if registry.is_filterable(stem) => (stem, op),
        _ => (key, Operator::Eq),
    }
}

fn apply_simple(
    registry: &ColumnRegistry,
    draft: &mut QueryDraft,
    simple: &BTreeMap<String, FilterValue>,
    all: &mut Junction,
) -> Result<()> {
    for (key, value) in simple {
        let (column, mut operator) = resolve_simple_key(registry, key);
        let storage = registry.resolve_filter(column)?;

        match value.as_str() {
            Some(MODIFIER_VAL_NOT_NULL) => operator = Operator::NEmpty,
            Some(MODIFIER_VAL_NULL) => operator = Operator::Empty,
            _ => {}
        }

        contribute(registry, draft, column, storage, value, all, Some(operator))?;
    }
    Ok(())
}

fn compile_group(
    registry: &ColumnRegistry,
    draft: &mut QueryDraft,
    group: &[ConditionEntry],
) -> Result<Junction> {
    let mut any = Junction::any();

    for entry in group {
        let column = entry
            .column
            .as_deref()
            .ok_or_else(|| GridError::malformed("condition is missing its 'column' field"))?;
        let operator_name = entry.operator.as_deref().ok_or_else(|| {
            GridError::malformed(format!("condition on '{column}' is missing its 'operator' field"))
        })?;
        let operator = Operator::parse(operator_name);

        let empty = FilterValue::String(String::new());
        let value = match (&entry.value, operator) {
            (Some(value), _) => value,
            (None, Some(op)) if !op.requires_value() => &empty,
            (None, _) => {
                return Err(GridError::malformed(format!(
                    "condition on '{column}' with operator '{operator_name}' is missing its 'value' field"
                )))
            }
        };

        let storage = registry.resolve_filter(column)?;
        contribute(registry, draft, column, storage, value, &mut any, operator)?;
    }

    Ok(any)
}

fn compile_search(registry: &ColumnRegistry, draft: &mut QueryDraft, term: &str) -> Result<Junction> {
    let columns = registry.resolve_search()?;
    let value = FilterValue::from(term);
    let mut any = Junction::any();

    for column in columns {
        match registry.contributor_for(column.key) {
            Some(contributor) => {
                let mut expr = Junction::all();
                contributor.contribute(draft, &value, column.storage, &mut expr, None)?;
                any.add_junction(expr);
            }
            None => {
                OperatorTable.contribute(draft, &value, column.storage, &mut any, Some(Operator::Like))?;
            }
        }
    }

    trace!(grid = registry.name(), term, columns = any.len(), "expanded search");
    Ok(any)
}

fn contribute(
    registry: &ColumnRegistry,
    draft: &mut QueryDraft,
    column: &str,
    storage: &str,
    value: &FilterValue,
    expr: &mut Junction,
    operator: Option<Operator>,
) -> Result<()> {
    let contributor: &dyn PredicateContributor = match registry.contributor_for(column) {
        Some(custom) => custom,
        None => &OperatorTable,
    };
    let before = expr.len();
    contributor.contribute(draft, value, storage, expr, operator)?;
    // A contributor may replace the accumulator rather than extend it.
    for predicate in expr.parts().get(before..).unwrap_or_default() {
        trace!(column, %predicate, "compiled condition");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::literal::Literal;
    use crate::query::{Join, QuerySource};

    fn registry() -> ColumnRegistry {
        let custom = |draft: &mut QueryDraft,
                      value: &FilterValue,
                      column: &str,
                      expr: &mut Junction,
                      _op: Option<Operator>|
         -> Result<()> {
            draft.add_join(Join::left("alias", "a", "a.entity_id = e.id"));
            expr.add(Predicate::eq(column, Literal::format(value)));
            Ok(())
        };

        ColumnRegistry::new("entities")
            .filter_column("string", "e.string")
            .filter_column("int", "e.int")
            .filter_column("custom_string", "a.string")
            .search_column("string")
            .search_column("custom_string")
            .contributor("custom_string", Arc::new(custom))
    }

    fn draft() -> QueryDraft {
        QueryDraft::new(QuerySource::new("entity", "e"))
    }

    fn run(
        simple: &[(&str, FilterValue)],
        advanced: &[Vec<ConditionEntry>],
        search: Option<&str>,
    ) -> Result<Option<String>> {
        let simple: BTreeMap<String, FilterValue> = simple
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        assemble(&registry(), &mut draft(), &simple, advanced, search)
            .map(|p| p.map(|p| p.to_string()))
    }

    #[test]
    fn empty_request_has_no_predicate() {
        assert_eq!(run(&[], &[], None).unwrap(), None);
        assert_eq!(run(&[], &[], Some("")).unwrap(), None);
        assert_eq!(run(&[], &[vec![]], None).unwrap(), None);
    }

    #[test]
    fn simple_conditions_are_and_ed() {
        let got = run(
            &[("int", FilterValue::from(vec![6, 7, 8])), ("string", "String 6".into())],
            &[],
            None,
        )
        .unwrap();
        assert_eq!(
            got.as_deref(),
            Some("e.int IN (6, 7, 8) AND e.string = 'String 6'")
        );
    }

    #[test]
    fn suffixes_select_operators() {
        let got = run(&[("int_gte", 8.into())], &[], None).unwrap();
        assert_eq!(got.as_deref(), Some("e.int >= 8"));
        let got = run(&[("int_lt", 1.into())], &[], None).unwrap();
        assert_eq!(got.as_deref(), Some("e.int < 1"));
    }

    #[test]
    fn unknown_suffixed_key_reports_full_key() {
        let err = run(&[("float_gt", 1.into())], &[], None).unwrap_err();
        assert!(matches!(err, GridError::UnknownFilterColumn { ref column, .. } if column == "float_gt"));
    }

    #[test]
    fn null_modifiers() {
        let got = run(&[("string", MODIFIER_VAL_NOT_NULL.into())], &[], None).unwrap();
        assert_eq!(got.as_deref(), Some("e.string IS NOT NULL"));
        let got = run(&[("string", MODIFIER_VAL_NULL.into())], &[], None).unwrap();
        assert_eq!(got.as_deref(), Some("e.string IS NULL"));
    }

    #[test]
    fn null_value_keeps_the_empty_string_quirk() {
        let got = run(&[("string", FilterValue::Null)], &[], None).unwrap();
        assert_eq!(got.as_deref(), Some("e.string = ''"));
    }

    #[test]
    fn groups_are_and_of_or() {
        let got = run(
            &[],
            &[
                vec![
                    ConditionEntry::new("int", Operator::Lt, 2),
                    ConditionEntry::new("int", Operator::Gt, 7),
                ],
                vec![ConditionEntry::new("string", Operator::Like, "ri")],
            ],
            None,
        )
        .unwrap();
        assert_eq!(
            got.as_deref(),
            Some("(e.int < 2 OR e.int > 7) AND e.string LIKE '%ri%'")
        );
    }

    #[test]
    fn simple_and_groups_combine() {
        let got = run(
            &[("string", "String 1".into())],
            &[vec![ConditionEntry::new("int", Operator::Eq, 1)]],
            None,
        )
        .unwrap();
        assert_eq!(got.as_deref(), Some("e.string = 'String 1' AND e.int = 1"));
    }

    #[test]
    fn null_tests_need_no_value() {
        let got = run(
            &[],
            &[vec![ConditionEntry::without_value("string", Operator::NEmpty)]],
            None,
        )
        .unwrap();
        assert_eq!(got.as_deref(), Some("e.string IS NOT NULL"));
    }

    #[test]
    fn malformed_entries_fail_the_request() {
        let missing_column = ConditionEntry {
            column: None,
            ..ConditionEntry::new("x", Operator::Eq, 1)
        };
        let missing_operator = ConditionEntry {
            operator: None,
            ..ConditionEntry::new("int", Operator::Eq, 1)
        };
        let missing_value = ConditionEntry::without_value("int", Operator::Gt);

        for entry in [missing_column, missing_operator, missing_value] {
            let err = run(
                &[("int", 1.into())],
                &[vec![ConditionEntry::new("int", Operator::Eq, 1), entry]],
                None,
            )
            .unwrap_err();
            assert!(matches!(err, GridError::MalformedCondition { .. }), "{err}");
        }
    }

    #[test]
    fn unknown_operator_compiles_as_eq() {
        let entry = ConditionEntry {
            operator: Some("FL".to_string()),
            ..ConditionEntry::new("int", Operator::Eq, 3)
        };
        let got = run(&[], &[vec![entry]], None).unwrap();
        assert_eq!(got.as_deref(), Some("e.int = 3"));
    }

    #[test]
    fn unknown_group_column_fails() {
        let err = run(
            &[],
            &[vec![ConditionEntry::new("Unknown", Operator::Eq, 1)]],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, GridError::UnknownFilterColumn { .. }));
    }

    #[test]
    fn search_expands_over_columns_with_callbacks() {
        let got = run(&[], &[], Some("9")).unwrap();
        assert_eq!(
            got.as_deref(),
            Some("e.string LIKE '%9%' OR a.string = '9'")
        );
    }

    #[test]
    fn search_is_and_ed_with_filters() {
        let got = run(&[("int_gt", 5.into())], &[], Some("9")).unwrap();
        assert_eq!(
            got.as_deref(),
            Some("e.int > 5 AND (e.string LIKE '%9%' OR a.string = '9')")
        );
    }

    #[test]
    fn callbacks_attach_joins() {
        let mut draft = draft();
        let simple = BTreeMap::from([("custom_string".to_string(), FilterValue::from("String 0"))]);
        let predicate = assemble(&registry(), &mut draft, &simple, &[], None)
            .unwrap()
            .unwrap();
        assert_eq!(predicate.to_string(), "a.string = 'String 0'");
        assert_eq!(draft.source().joins.len(), 1);
    }

    #[test]
    fn contributor_may_replace_the_accumulator() {
        let reset = |_draft: &mut QueryDraft,
                     value: &FilterValue,
                     column: &str,
                     expr: &mut Junction,
                     _op: Option<Operator>|
         -> Result<()> {
            *expr = Junction::any();
            expr.add(Predicate::eq(column, Literal::format(value)));
            Ok(())
        };
        let registry = ColumnRegistry::new("entities")
            .filter_column("id", "e.id")
            .filter_column("name", "e.name")
            .contributor("name", Arc::new(reset));
        let group = vec![
            ConditionEntry::new("id", Operator::Eq, 1),
            ConditionEntry::new("id", Operator::Eq, 2),
            ConditionEntry::new("name", Operator::Eq, "a"),
        ];

        let predicate = assemble(&registry, &mut draft(), &BTreeMap::new(), &[group], None)
            .unwrap()
            .unwrap();
        assert_eq!(predicate.to_string(), "e.name = 'a'");
    }

    #[test]
    fn search_with_silent_contributors_filters_nothing() {
        let silent = |_draft: &mut QueryDraft,
                      _value: &FilterValue,
                      _column: &str,
                      _expr: &mut Junction,
                      _op: Option<Operator>|
         -> Result<()> { Ok(()) };
        let registry = ColumnRegistry::new("entities")
            .filter_column("name", "e.name")
            .search_column("name")
            .contributor("name", Arc::new(silent));

        let got = assemble(&registry, &mut draft(), &BTreeMap::new(), &[], Some("x")).unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn search_without_columns_fails() {
        let registry = ColumnRegistry::new("bare").filter_column("int", "e.int");
        let err = assemble(&registry, &mut draft(), &BTreeMap::new(), &[], Some("x")).unwrap_err();
        assert!(matches!(err, GridError::SearchNotConfigured { .. }));
    }
}
