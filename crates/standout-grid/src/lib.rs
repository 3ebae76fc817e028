//! Grid - Allowlisted filter, search, sort and pagination compiler.
//!
//! Grid turns loosely-typed client filter requests into safe, composable
//! predicates over a configured base query. It provides:
//!
//! - Column allowlists for filtering, sorting, and searching
//! - Thirteen filter operators, selectable by key suffix (`int_gte`)
//! - Advanced condition groups: OR within a group, AND across groups
//! - Free-text search across configured columns
//! - Per-column predicate contributors that replace default compilation
//! - Pagination with totals that stay correct under one-to-many joins
//!
//! Execution is delegated to a [`QueryTarget`]. [`MemoryTarget`] evaluates
//! queries over a vector of records; [`SqlRenderer`] turns them into
//! parameterised SQL for a database-backed target.
//!
//! # Quick Start
//!
//! ```rust
//! use standout_grid::{FilterValue, Grid, GridConfig, GridRequest, MemoryTarget, QuerySource, Record, SortRequest};
//!
//! #[derive(Clone)]
//! struct Task {
//!     id: i64,
//!     name: String,
//!     priority: i64,
//! }
//!
//! impl Record for Task {
//!     fn field(&self, column: &str) -> FilterValue {
//!         match column {
//!             "t.id" => self.id.into(),
//!             "t.name" => self.name.as_str().into(),
//!             "t.priority" => self.priority.into(),
//!             _ => FilterValue::Null,
//!         }
//!     }
//!
//!     fn root_id(&self) -> FilterValue {
//!         self.id.into()
//!     }
//! }
//!
//! let tasks = vec![
//!     Task { id: 1, name: "Write docs".into(), priority: 3 },
//!     Task { id: 2, name: "Fix bug".into(), priority: 5 },
//!     Task { id: 3, name: "Old task".into(), priority: 1 },
//! ];
//!
//! let config = GridConfig::new("tasks")
//!     .source(QuerySource::new("task", "t"))
//!     .column("name", "t.name")
//!     .column("priority", "t.priority")
//!     .search_column("name");
//! let grid = Grid::<MemoryTarget<Task>>::builder(config).build(MemoryTarget::new(tasks)).unwrap();
//!
//! let mut request = GridRequest::new()
//!     .with_filter("priority_gte", 3)
//!     .with_order(SortRequest::desc("priority"));
//!
//! let page = grid.fetch(&mut request).unwrap();
//! assert_eq!(page.total, 2);
//! assert_eq!(page.rows[0].name, "Fix bug");
//! ```
//!
//! # Filter Semantics
//!
//! The three condition sources combine with fixed logic:
//!
//! ```text
//! where = (all simple conditions)
//!       ∧ (each advanced group: at least one condition in it)
//!       ∧ (search term LIKE any searchable column)
//! ```
//!
//! Absent sources impose nothing. An unknown column anywhere fails the
//! whole request before the target is called.
//!
//! # Operators
//!
//! | Operator | Predicate |
//! |----------|-----------|
//! | `EQ` (default) | `=`, or `IN` for several values |
//! | `NEQ` | `!=`, or `NOT IN` for several values |
//! | `GT`, `LT`, `GTE`, `LTE` | comparison against the first value |
//! | `LIKE`, `STARTS`, `ENDS` | `LIKE '%v%'`, `'v%'`, `'%v'` |
//! | `EMPTY`, `NEMPTY` | `IS NULL`, `IS NOT NULL` |
//! | `BETWEEN` | `BETWEEN v0 AND v1`, or `=` with one value |
//! | `NBETWEEN` | `<= v0 OR >= v1`, or `!=` with one value |
//!
//! A null value is rendered as the empty string, not as SQL NULL.

mod compile;
mod config;
mod contributor;
mod error;
mod grid;
mod literal;
mod memory;
mod op;
mod page;
mod predicate;
mod query;
mod registry;
mod request;
mod sql;
mod target;
mod value;

pub mod filter;
pub mod sort;

// Re-export public API
pub use compile::compile;
pub use config::GridConfig;
pub use contributor::{OperatorTable, PredicateContributor};
pub use error::{GridError, Result};
pub use grid::{CompiledRequest, Grid, GridBuilder, DEFAULT_SUGGEST_LIMIT};
pub use literal::Literal;
pub use memory::{eval, like_match, MemoryTarget, Record};
pub use op::{Operator, ALL_OPERATORS};
pub use page::{PageSpec, QueryResult, Window, DEFAULT_ITEMS_PER_PAGE};
pub use predicate::{Comparison, Connective, Junction, Predicate};
pub use query::{CountStrategy, Join, JoinKind, Projection, Query, QueryDraft, QuerySource};
pub use registry::{ColumnRegistry, SearchColumn};
pub use request::{
    ConditionEntry, FilterRequest, GridParams, GridRequest, MODIFIER_SEARCH,
    MODIFIER_VAL_NOT_NULL, MODIFIER_VAL_NULL, SEARCH_KEY,
};
pub use sort::{Dir, SortKey, SortRequest};
pub use sql::{Dialect, SqlRenderer, SqlStatement};
pub use target::QueryTarget;
pub use value::{FilterValue, Number};
