//! SQL rendering.
//!
//! [`SqlRenderer`] turns a compiled [`Query`] into a statement with bound
//! parameters. Values never reach the SQL text; they are collected in
//! [`SqlStatement::params`] in placeholder order. Identifiers come from the
//! allowlists and are emitted as configured, optionally quoted.
//!
//! ```
//! use standout_grid::{compile, Dialect, FilterValue, Operator, Query, QuerySource, SqlRenderer};
//!
//! let mut query = Query::rows(QuerySource::new("entity", "e"));
//! query.predicate = Some(compile("e.int", Some(Operator::Gte), &FilterValue::from(8)));
//!
//! let stmt = SqlRenderer::new(Dialect::Postgres).render(&query);
//! assert_eq!(stmt.sql, "SELECT e.* FROM entity e WHERE e.int >= $1");
//! assert_eq!(stmt.params.len(), 1);
//! ```

use crate::literal::Literal;
use crate::predicate::Predicate;
use crate::query::{CountStrategy, Projection, Query, QuerySource};
use crate::sort::Dir;

/// Placeholder and quoting style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Generic SQL using `?` placeholders.
    #[default]
    Generic,
    /// SQLite-style `?` placeholders.
    Sqlite,
    /// MySQL-style `?` placeholders with backtick quoting.
    MySql,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }
}

/// A rendered statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Literal>,
}

/// Renders queries for one dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlRenderer {
    dialect: Dialect,
    quote_identifiers: bool,
}

impl SqlRenderer {
    pub fn new(dialect: Dialect) -> Self {
        SqlRenderer {
            dialect,
            quote_identifiers: false,
        }
    }

    /// Quotes every dotted identifier segment (`"e"."string"`).
    pub fn quoted(mut self) -> Self {
        self.quote_identifiers = true;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Renders a query according to its projection.
    pub fn render(&self, query: &Query) -> SqlStatement {
        let mut w = Writer::new(*self);
        let source = &query.source;
        let alias = w.ident(&source.alias);
        let root = w.ident(&source.root_ref());

        match &query.projection {
            Projection::Rows if source.has_joins() && !query.order.is_empty() => {
                // One row per root, ranked by the extreme joined value of
                // each sort key.
                let table = w.ident(&source.table);
                let ranks: Vec<String> = query
                    .order
                    .iter()
                    .enumerate()
                    .map(|(idx, key)| {
                        let agg = match key.dir {
                            Dir::Asc => "MIN",
                            Dir::Desc => "MAX",
                        };
                        format!("{agg}({}) AS grid_sort_{idx}", w.ident(&key.column))
                    })
                    .collect();
                w.push(&format!(
                    "SELECT {alias}.* FROM {table} {alias} INNER JOIN (SELECT {root} AS grid_root, {}",
                    ranks.join(", ")
                ));
                w.from(source);
                w.filter(query.predicate.as_ref(), None);
                w.push(&format!(
                    " GROUP BY {root}) grid_rows ON grid_rows.grid_root = {root}"
                ));
                let clauses: Vec<String> = query
                    .order
                    .iter()
                    .enumerate()
                    .map(|(idx, key)| format!("grid_rows.grid_sort_{idx} {}", key.dir.as_sql()))
                    .collect();
                w.push(&format!(" ORDER BY {}", clauses.join(", ")));
                w.window(query);
            }
            Projection::Rows => {
                let distinct = if source.has_joins() { "DISTINCT " } else { "" };
                w.push(&format!("SELECT {distinct}{alias}.*"));
                w.from(source);
                w.filter(query.predicate.as_ref(), None);
                w.order(query);
                w.window(query);
            }
            Projection::Count(CountStrategy::Rows) => {
                w.push("SELECT COUNT(*)");
                w.from(source);
                w.filter(query.predicate.as_ref(), None);
            }
            Projection::Count(CountStrategy::DistinctRoot) => {
                w.push(&format!("SELECT COUNT(DISTINCT {root})"));
                w.from(source);
                w.filter(query.predicate.as_ref(), None);
            }
            Projection::Count(CountStrategy::Subquery) => {
                w.push(&format!("SELECT COUNT(*) FROM (SELECT DISTINCT {root}"));
                w.from(source);
                w.filter(query.predicate.as_ref(), None);
                w.push(") grid_count");
            }
            Projection::Values(column) => {
                let column_sql = w.ident(column);
                w.push(&format!("SELECT DISTINCT {column_sql}"));
                w.from(source);
                w.filter(query.predicate.as_ref(), Some(&column_sql));
                w.window(query);
            }
        }

        SqlStatement {
            sql: w.sql,
            params: w.params,
        }
    }
}

struct Writer {
    renderer: SqlRenderer,
    sql: String,
    params: Vec<Literal>,
    next_placeholder: usize,
}

impl Writer {
    fn new(renderer: SqlRenderer) -> Self {
        Writer {
            renderer,
            sql: String::new(),
            params: Vec::new(),
            next_placeholder: 1,
        }
    }

    fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn ident(&self, name: &str) -> String {
        if !self.renderer.quote_identifiers {
            return name.to_string();
        }
        let q = self.renderer.dialect.quote_char();
        name.split('.')
            .map(|part| {
                let escaped = part.replace(q, &format!("{q}{q}"));
                format!("{q}{escaped}{q}")
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    fn bind(&mut self, literal: Literal) -> String {
        let placeholder = self.renderer.dialect.placeholder(self.next_placeholder);
        self.next_placeholder += 1;
        self.params.push(literal);
        placeholder
    }

    fn from(&mut self, source: &QuerySource) {
        let table = self.ident(&source.table);
        let alias = self.ident(&source.alias);
        self.push(&format!(" FROM {table} {alias}"));
        for join in &source.joins {
            let table = self.ident(&join.table);
            let alias = self.ident(&join.alias);
            self.push(&format!(" {} {table} {alias} ON {}", join.kind.as_sql(), join.on));
        }
    }

    fn filter(&mut self, predicate: Option<&Predicate>, not_null: Option<&str>) {
        if predicate.is_none() && not_null.is_none() {
            return;
        }
        self.push(" WHERE ");
        if let Some(predicate) = predicate {
            if not_null.is_some() && predicate.is_compound() {
                self.push("(");
                self.predicate(predicate);
                self.push(")");
            } else {
                self.predicate(predicate);
            }
        }
        if let Some(column) = not_null {
            if predicate.is_some() {
                self.push(" AND ");
            }
            self.push(&format!("{column} IS NOT NULL"));
        }
    }

    fn predicate(&mut self, predicate: &Predicate) {
        match predicate {
            Predicate::Compare { column, cmp, value } => {
                let column = self.ident(column);
                let placeholder = self.bind(value.clone());
                self.push(&format!("{column} {} {placeholder}", cmp.as_sql()));
            }
            Predicate::In {
                values, negated, ..
            } if values.is_empty() => {
                self.push(if *negated { "1 = 1" } else { "1 = 0" });
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                let column = self.ident(column);
                let placeholders: Vec<_> = values.iter().map(|v| self.bind(v.clone())).collect();
                let not = if *negated { "NOT " } else { "" };
                self.push(&format!("{column} {not}IN ({})", placeholders.join(", ")));
            }
            Predicate::Like { column, pattern } => {
                let column = self.ident(column);
                let placeholder = self.bind(Literal::string(pattern.as_str()));
                self.push(&format!("{column} LIKE {placeholder}"));
            }
            Predicate::Null { column, negated } => {
                let column = self.ident(column);
                let not = if *negated { "NOT " } else { "" };
                self.push(&format!("{column} IS {not}NULL"));
            }
            Predicate::Between { column, low, high } => {
                let column = self.ident(column);
                let low = self.bind(low.clone());
                let high = self.bind(high.clone());
                self.push(&format!("{column} BETWEEN {low} AND {high}"));
            }
            Predicate::And(parts) => self.joined(parts, " AND ", "1 = 1"),
            Predicate::Or(parts) => self.joined(parts, " OR ", "1 = 0"),
        }
    }

    fn joined(&mut self, parts: &[Predicate], sep: &str, empty: &str) {
        if parts.is_empty() {
            self.push(empty);
            return;
        }
        for (idx, part) in parts.iter().enumerate() {
            if idx > 0 {
                self.push(sep);
            }
            if part.is_compound() {
                self.push("(");
                self.predicate(part);
                self.push(")");
            } else {
                self.predicate(part);
            }
        }
    }

    fn order(&mut self, query: &Query) {
        if query.order.is_empty() {
            return;
        }
        let clauses: Vec<_> = query
            .order
            .iter()
            .map(|key| format!("{} {}", self.ident(&key.column), key.dir.as_sql()))
            .collect();
        self.push(&format!(" ORDER BY {}", clauses.join(", ")));
    }

    fn window(&mut self, query: &Query) {
        if let Some(window) = query.window {
            self.push(&format!(" LIMIT {} OFFSET {}", window.limit, window.offset));
        }
    }
}
