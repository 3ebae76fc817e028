//! The grid facade.
//!
//! A [`Grid`] owns immutable configuration and a [`QueryTarget`]. Each call
//! compiles the request from scratch, so one grid can serve concurrent
//! requests through `&self`.
//!
//! ```
//! use standout_grid::{FilterValue, GridBuilder, GridConfig, GridRequest, MemoryTarget, QuerySource, Record};
//!
//! #[derive(Clone)]
//! struct Task { id: i64, title: String }
//!
//! impl Record for Task {
//!     fn field(&self, column: &str) -> FilterValue {
//!         match column {
//!             "t.id" => self.id.into(),
//!             "t.title" => self.title.as_str().into(),
//!             _ => FilterValue::Null,
//!         }
//!     }
//!     fn root_id(&self) -> FilterValue { self.id.into() }
//! }
//!
//! let config = GridConfig::new("tasks")
//!     .source(QuerySource::new("task", "t"))
//!     .column("id", "t.id")
//!     .column("title", "t.title")
//!     .search_column("title");
//!
//! let tasks = vec![
//!     Task { id: 1, title: "Write docs".into() },
//!     Task { id: 2, title: "Fix bug".into() },
//! ];
//! let grid = GridBuilder::new(config).build(MemoryTarget::new(tasks)).unwrap();
//!
//! let mut request = GridRequest::new().with_search("bug");
//! let result = grid.fetch(&mut request).unwrap();
//! assert_eq!(result.total, 1);
//! assert_eq!(result.rows[0].id, 2);
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::config::GridConfig;
use crate::contributor::PredicateContributor;
use crate::error::{GridError, Result};
use crate::filter;
use crate::op::Operator;
use crate::page::{PageSpec, QueryResult};
use crate::predicate::Junction;
use crate::query::{CountStrategy, Projection, Query, QueryDraft, QuerySource};
use crate::registry::ColumnRegistry;
use crate::request::FilterRequest;
use crate::sort;
use crate::target::QueryTarget;
use crate::value::FilterValue;

/// Per-column result cap for [`Grid::suggest`].
pub const DEFAULT_SUGGEST_LIMIT: u64 = 50;

/// The queries compiled for one request.
#[derive(Debug, Clone)]
pub struct CompiledRequest {
    /// Filtered, sorted, windowed row query.
    pub rows: Query,
    /// Filtered count query, never windowed.
    pub count: Query,
    pub page: PageSpec,
}

/// Composes a [`GridConfig`] with contributors and a target.
pub struct GridBuilder {
    config: GridConfig,
    contributors: Vec<(String, Arc<dyn PredicateContributor>)>,
}

impl GridBuilder {
    pub fn new(config: GridConfig) -> Self {
        GridBuilder {
            config,
            contributors: Vec::new(),
        }
    }

    /// Registers a closure that replaces default compilation for `key`.
    ///
    /// The closure receives the query draft, the raw value, the storage
    /// reference, the accumulator, and the operator (`None` for search).
    pub fn callback<F>(self, key: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut QueryDraft, &FilterValue, &str, &mut Junction, Option<Operator>) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.contributor(key, Arc::new(callback))
    }

    /// Registers a contributor that replaces default compilation for `key`.
    pub fn contributor(mut self, key: impl Into<String>, contributor: Arc<dyn PredicateContributor>) -> Self {
        self.contributors.push((key.into(), contributor));
        self
    }

    /// Builds the grid. Fails if no base query is configured.
    pub fn build<T: QueryTarget>(self, target: T) -> Result<Grid<T>> {
        let GridBuilder {
            config,
            contributors,
        } = self;

        let source = config.source.clone().ok_or_else(|| GridError::MissingSearchQuery {
            grid: config.name.clone(),
        })?;

        let mut registry = config.registry();
        for (key, contributor) in contributors {
            registry.insert_contributor(key, contributor);
        }

        let count_strategy = CountStrategy::from_flags(config.fetch_join, config.count_subquery);
        debug!(
            grid = %config.name,
            filter = config.filter.len(),
            order = config.order.len(),
            search = config.search.len(),
            ?count_strategy,
            custom_count = config.count_source.is_some(),
            "built grid"
        );

        Ok(Grid {
            registry,
            source,
            count_source: config.count_source,
            count_strategy,
            target,
        })
    }
}

/// Allowlisted, paginated access to a query target.
pub struct Grid<T> {
    registry: ColumnRegistry,
    source: QuerySource,
    count_source: Option<QuerySource>,
    count_strategy: CountStrategy,
    target: T,
}

impl<T: QueryTarget> Grid<T> {
    pub fn builder(config: GridConfig) -> GridBuilder {
        GridBuilder::new(config)
    }

    pub fn registry(&self) -> &ColumnRegistry {
        &self.registry
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn count_strategy(&self) -> CountStrategy {
        self.count_strategy
    }

    /// Compiles a request into its row and count queries without touching
    /// the target.
    pub fn compile<R: FilterRequest + ?Sized>(&self, request: &R) -> Result<CompiledRequest> {
        let mut draft = QueryDraft::new(self.source.clone());
        let predicate = filter::assemble(
            &self.registry,
            &mut draft,
            request.simple_filter(),
            request.advanced_filter(),
            request.search(),
        )?;
        let order = sort::assemble(&self.registry, request.order_by())?;
        let page = PageSpec::new(request.page(), request.items_per_page());
        let window = page.window();

        let rows = Query {
            source: draft.into_source(),
            predicate,
            order,
            window: Some(window),
            projection: Projection::Rows,
        };

        let count = match &self.count_source {
            Some(custom) => {
                let mut count_draft = QueryDraft::new(custom.clone());
                // Joins attached by contributors.
                for join in &rows.source.joins[self.source.joins.len()..] {
                    count_draft.add_join(join.clone());
                }
                let mut count = rows.to_count(self.count_strategy);
                count.source = count_draft.into_source();
                count
            }
            None => rows.to_count(self.count_strategy),
        };

        debug!(
            grid = self.registry.name(),
            offset = window.offset,
            limit = window.limit,
            sort_keys = rows.order.len(),
            filtered = rows.predicate.is_some(),
            count_strategy = ?self.count_strategy,
            custom_count = self.count_source.is_some(),
            "compiled request"
        );

        Ok(CompiledRequest { rows, count, page })
    }

    /// Fetches one page of rows and the total, and reports the total back
    /// through [`FilterRequest::set_total`].
    ///
    /// Validation failures return before the target is called. Target
    /// failures are wrapped in [`GridError::Target`] unchanged.
    pub fn fetch<R: FilterRequest + ?Sized>(&self, request: &mut R) -> Result<QueryResult<T::Row>> {
        let compiled = self.compile(request)?;

        let rows = self
            .target
            .fetch_rows(&compiled.rows)
            .map_err(GridError::target)?;
        let total = self
            .target
            .count(&compiled.count)
            .map_err(GridError::target)?;

        debug!(grid = self.registry.name(), rows = rows.len(), total, "fetched page");
        request.set_total(total);
        Ok(QueryResult::new(rows, total, compiled.page))
    }

    /// Typeahead values for the searchable columns under the request's
    /// filters, at most [`DEFAULT_SUGGEST_LIMIT`] per column.
    pub fn suggest<R: FilterRequest + ?Sized>(&self, request: &R) -> Result<Vec<FilterValue>> {
        self.suggest_limited(request, DEFAULT_SUGGEST_LIMIT)
    }

    /// Typeahead values with an explicit per-column cap.
    ///
    /// Each searchable column is queried separately, truncated at `limit`,
    /// and the results are concatenated with duplicates removed, keeping
    /// first occurrences.
    pub fn suggest_limited<R: FilterRequest + ?Sized>(
        &self,
        request: &R,
        limit: u64,
    ) -> Result<Vec<FilterValue>> {
        let compiled = self.compile(request)?;
        let columns: Vec<String> = self
            .registry
            .resolve_search()?
            .into_iter()
            .map(|c| c.storage.to_string())
            .collect();

        let cap = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut values: Vec<FilterValue> = Vec::new();
        for column in columns {
            let query = compiled.rows.to_values(column.as_str(), limit);
            let found = self.target.fetch_values(&query).map_err(GridError::target)?;
            for value in found.into_iter().take(cap) {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }

        debug!(grid = self.registry.name(), suggestions = values.len(), "suggested values");
        Ok(values)
    }
}

impl<T> std::fmt::Debug for Grid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("registry", &self.registry)
            .field("source", &self.source)
            .field("count_source", &self.count_source)
            .field("count_strategy", &self.count_strategy)
            .finish_non_exhaustive()
    }
}
