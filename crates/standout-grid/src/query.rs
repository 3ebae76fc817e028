//! Compiled queries handed to a [`QueryTarget`](crate::QueryTarget).
//!
//! A [`Query`] is plain data: the base source with its joins, an optional
//! predicate, sort keys, an optional page window, and what to project.
//! Every `fetch` builds fresh queries; nothing here is shared between
//! requests.

use serde::{Deserialize, Serialize};

use crate::page::Window;
use crate::predicate::Predicate;
use crate::sort::SortKey;

fn default_id_column() -> String {
    "id".to_string()
}

/// How a joined table is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
    #[default]
    Left,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// A joined table. One-to-many joins are what make root counting
/// necessary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    #[serde(default)]
    pub kind: JoinKind,
    pub table: String,
    pub alias: String,
    /// Join condition, in storage terms (`p.entity_id = e.id`).
    pub on: String,
}

impl Join {
    pub fn left(table: impl Into<String>, alias: impl Into<String>, on: impl Into<String>) -> Self {
        Join {
            kind: JoinKind::Left,
            table: table.into(),
            alias: alias.into(),
            on: on.into(),
        }
    }

    pub fn inner(
        table: impl Into<String>,
        alias: impl Into<String>,
        on: impl Into<String>,
    ) -> Self {
        Join {
            kind: JoinKind::Inner,
            ..Join::left(table, alias, on)
        }
    }
}

/// The base query a grid selects from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySource {
    pub table: String,
    pub alias: String,
    /// Identity column of the root entity, used for distinct counting.
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default)]
    pub joins: Vec<Join>,
}

impl QuerySource {
    pub fn new(table: impl Into<String>, alias: impl Into<String>) -> Self {
        QuerySource {
            table: table.into(),
            alias: alias.into(),
            id_column: default_id_column(),
            joins: Vec::new(),
        }
    }

    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Storage reference of the root identity (`e.id`).
    pub fn root_ref(&self) -> String {
        format!("{}.{}", self.alias, self.id_column)
    }

    /// Returns `true` if any join is attached.
    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }
}

/// Per-request query-building state exposed to predicate contributors.
///
/// Contributors may attach extra joins their predicates need. Joins are
/// deduplicated by alias so a contributor that runs for both a filter and
/// a search attaches its join once.
#[derive(Debug, Clone)]
pub struct QueryDraft {
    source: QuerySource,
}

impl QueryDraft {
    pub fn new(source: QuerySource) -> Self {
        QueryDraft { source }
    }

    pub fn source(&self) -> &QuerySource {
        &self.source
    }

    /// Attaches a join unless one with the same alias already exists.
    pub fn add_join(&mut self, join: Join) {
        if !self.source.joins.iter().any(|j| j.alias == join.alias) {
            self.source.joins.push(join);
        }
    }

    pub fn into_source(self) -> QuerySource {
        self.source
    }
}

/// How a count query counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountStrategy {
    /// Count raw result rows.
    Rows,
    /// Count distinct root identities.
    DistinctRoot,
    /// Count distinct root identities through a wrapped subquery.
    Subquery,
}

impl CountStrategy {
    /// Picks the strategy from the grid's count flags.
    pub fn from_flags(fetch_join: bool, count_subquery: bool) -> Self {
        match (fetch_join, count_subquery) {
            (false, _) => CountStrategy::Rows,
            (true, false) => CountStrategy::DistinctRoot,
            (true, true) => CountStrategy::Subquery,
        }
    }

    /// Returns `true` if this strategy deduplicates fanned-out rows.
    pub fn is_distinct(self) -> bool {
        !matches!(self, CountStrategy::Rows)
    }
}

/// What a query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Root entity rows.
    Rows,
    /// A single count.
    Count(CountStrategy),
    /// Distinct values of one storage column, for suggestions.
    Values(String),
}

/// A compiled, validated query.
#[derive(Debug, Clone)]
pub struct Query {
    pub source: QuerySource,
    pub predicate: Option<Predicate>,
    pub order: Vec<SortKey>,
    pub window: Option<Window>,
    pub projection: Projection,
}

impl Query {
    /// A row query over `source` with no predicate, order, or window.
    pub fn rows(source: QuerySource) -> Self {
        Query {
            source,
            predicate: None,
            order: Vec::new(),
            window: None,
            projection: Projection::Rows,
        }
    }

    /// The count shape of this query: same source and predicate, no
    /// order, no window.
    pub fn to_count(&self, strategy: CountStrategy) -> Query {
        Query {
            source: self.source.clone(),
            predicate: self.predicate.clone(),
            order: Vec::new(),
            window: None,
            projection: Projection::Count(strategy),
        }
    }

    /// The value-suggestion shape of this query for one storage column.
    pub fn to_values(&self, column: impl Into<String>, limit: u64) -> Query {
        Query {
            source: self.source.clone(),
            predicate: self.predicate.clone(),
            order: Vec::new(),
            window: Some(Window { offset: 0, limit }),
            projection: Projection::Values(column.into()),
        }
    }
}
