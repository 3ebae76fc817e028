//! Grid configuration.
//!
//! Everything a grid needs except code: allowlists, base query, optional
//! count query, and the counting flags. Loadable from JSON or YAML:
//!
//! ```yaml
//! name: entities
//! source: { table: entity, alias: e }
//! filter: { string: e.string, int: e.int }
//! order: { int: e.int }
//! search: [string]
//! fetch_join: true
//! ```
//!
//! Per-column contributors are code and are attached through
//! [`GridBuilder`](crate::GridBuilder).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::QuerySource;
use crate::registry::ColumnRegistry;

fn default_name() -> String {
    "grid".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Name used in error messages and logs.
    #[serde(default = "default_name")]
    pub name: String,
    /// Filter allowlist: column key → storage reference.
    #[serde(default)]
    pub filter: BTreeMap<String, String>,
    /// Sort allowlist: column key → storage reference.
    #[serde(default)]
    pub order: BTreeMap<String, String>,
    /// Searchable column keys, resolved through `filter`.
    #[serde(default)]
    pub search: Vec<String>,
    /// The base query rows are selected from.
    #[serde(default)]
    pub source: Option<QuerySource>,
    /// A cheaper query to count against. The request predicate is applied
    /// to it as well.
    #[serde(default)]
    pub count_source: Option<QuerySource>,
    /// Count distinct root identities instead of raw rows, so one-to-many
    /// joins do not inflate totals.
    #[serde(default = "default_true")]
    pub fetch_join: bool,
    /// Count distinct roots through a wrapped subquery rather than
    /// `COUNT(DISTINCT ...)`. Only meaningful with `fetch_join`.
    #[serde(default)]
    pub count_subquery: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig::new(default_name())
    }
}

impl GridConfig {
    pub fn new(name: impl Into<String>) -> Self {
        GridConfig {
            name: name.into(),
            filter: BTreeMap::new(),
            order: BTreeMap::new(),
            search: Vec::new(),
            source: None,
            count_source: None,
            fetch_join: true,
            count_subquery: false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn source(mut self, source: QuerySource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn count_source(mut self, source: QuerySource) -> Self {
        self.count_source = Some(source);
        self
    }

    pub fn filter_column(mut self, key: impl Into<String>, storage: impl Into<String>) -> Self {
        self.filter.insert(key.into(), storage.into());
        self
    }

    pub fn order_column(mut self, key: impl Into<String>, storage: impl Into<String>) -> Self {
        self.order.insert(key.into(), storage.into());
        self
    }

    /// Allows both filtering and sorting on `key`.
    pub fn column(self, key: impl Into<String>, storage: impl Into<String>) -> Self {
        let (key, storage) = (key.into(), storage.into());
        self.filter_column(key.clone(), storage.clone())
            .order_column(key, storage)
    }

    pub fn search_column(mut self, key: impl Into<String>) -> Self {
        self.search.push(key.into());
        self
    }

    pub fn fetch_join(mut self, enabled: bool) -> Self {
        self.fetch_join = enabled;
        self
    }

    pub fn count_subquery(mut self, enabled: bool) -> Self {
        self.count_subquery = enabled;
        self
    }

    /// Builds the allowlists, without contributors.
    pub fn registry(&self) -> ColumnRegistry {
        let registry = self
            .filter
            .iter()
            .fold(ColumnRegistry::new(self.name.as_str()), |r, (k, v)| {
                r.filter_column(k.as_str(), v.as_str())
            });
        let registry = self
            .order
            .iter()
            .fold(registry, |r, (k, v)| r.order_column(k.as_str(), v.as_str()));
        self.search
            .iter()
            .fold(registry, |r, k| r.search_column(k.as_str()))
    }
}
