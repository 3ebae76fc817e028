//! Column allowlists.
//!
//! The [`ColumnRegistry`] maps public column keys to storage references for
//! three operations: filtering, sorting, and searching. Anything a request
//! names must resolve here first; a miss is a validation error that names
//! the allowlist to extend.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::contributor::PredicateContributor;
use crate::error::{GridError, Result};

/// One searchable column, resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchColumn<'a> {
    pub key: &'a str,
    pub storage: &'a str,
}

/// Allowlists plus per-column contributors. Immutable once a grid is built.
#[derive(Clone, Default)]
pub struct ColumnRegistry {
    name: String,
    filter: BTreeMap<String, String>,
    order: BTreeMap<String, String>,
    search: Vec<String>,
    contributors: BTreeMap<String, Arc<dyn PredicateContributor>>,
}

impl ColumnRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        ColumnRegistry {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The grid name used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allows filtering on `key`, stored at `storage`.
    pub fn filter_column(mut self, key: impl Into<String>, storage: impl Into<String>) -> Self {
        self.filter.insert(key.into(), storage.into());
        self
    }

    /// Allows sorting on `key`, stored at `storage`.
    pub fn order_column(mut self, key: impl Into<String>, storage: impl Into<String>) -> Self {
        self.order.insert(key.into(), storage.into());
        self
    }

    /// Adds `key` to the searchable columns. Search order follows
    /// registration order.
    pub fn search_column(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.search.contains(&key) {
            self.search.push(key);
        }
        self
    }

    /// Replaces default compilation for `key`.
    pub fn contributor(mut self, key: impl Into<String>, contributor: Arc<dyn PredicateContributor>) -> Self {
        self.contributors.insert(key.into(), contributor);
        self
    }

    pub(crate) fn insert_contributor(&mut self, key: String, contributor: Arc<dyn PredicateContributor>) {
        self.contributors.insert(key, contributor);
    }

    /// Returns `true` if `key` is in the filter allowlist.
    pub fn is_filterable(&self, key: &str) -> bool {
        self.filter.contains_key(key)
    }

    /// The custom contributor registered for `key`, if any.
    pub fn contributor_for(&self, key: &str) -> Option<&dyn PredicateContributor> {
        self.contributors.get(key).map(|c| c.as_ref())
    }

    /// Resolves a filter key to its storage reference.
    pub fn resolve_filter(&self, key: &str) -> Result<&str> {
        self.filter.get(key).map(String::as_str).ok_or_else(|| {
            warn!(grid = %self.name, column = key, "rejected filter column");
            GridError::UnknownFilterColumn {
                column: key.to_string(),
                grid: self.name.clone(),
            }
        })
    }

    /// Resolves a sort key to its storage reference.
    pub fn resolve_sort(&self, key: &str) -> Result<&str> {
        self.order.get(key).map(String::as_str).ok_or_else(|| {
            warn!(grid = %self.name, column = key, "rejected sort column");
            GridError::UnknownSortColumn {
                column: key.to_string(),
                grid: self.name.clone(),
            }
        })
    }

    /// Resolves every searchable column through the filter allowlist.
    ///
    /// Fails if no searchable columns are configured, or if one of them is
    /// missing from the filter allowlist.
    pub fn resolve_search(&self) -> Result<Vec<SearchColumn<'_>>> {
        if self.search.is_empty() {
            warn!(grid = %self.name, "search requested without searchable columns");
            return Err(GridError::SearchNotConfigured {
                grid: self.name.clone(),
            });
        }

        self.search
            .iter()
            .map(|key| match self.filter.get(key) {
                Some(storage) => Ok(SearchColumn {
                    key: key.as_str(),
                    storage: storage.as_str(),
                }),
                None => {
                    warn!(grid = %self.name, column = %key, "searchable column is not filterable");
                    Err(GridError::UnknownSearchColumn {
                        column: key.clone(),
                        grid: self.name.clone(),
                    })
                }
            })
            .collect()
    }

    pub fn filter_columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filter.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn order_columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn search_columns(&self) -> &[String] {
        &self.search
    }
}

impl std::fmt::Debug for ColumnRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnRegistry")
            .field("name", &self.name)
            .field("filter", &self.filter)
            .field("order", &self.order)
            .field("search", &self.search)
            .field("contributors", &self.contributors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contributor::OperatorTable;

    fn registry() -> ColumnRegistry {
        ColumnRegistry::new("entities")
            .filter_column("string", "e.string")
            .filter_column("int", "e.int")
            .order_column("int", "e.int")
            .search_column("string")
    }

    #[test]
    fn resolves_known_columns() {
        let registry = registry();
        assert_eq!(registry.resolve_filter("int").unwrap(), "e.int");
        assert_eq!(registry.resolve_sort("int").unwrap(), "e.int");
        assert_eq!(
            registry.resolve_search().unwrap(),
            vec![SearchColumn {
                key: "string",
                storage: "e.string"
            }]
        );
    }

    #[test]
    fn unknown_filter_names_the_column() {
        let err = registry().resolve_filter("Unknown").unwrap_err();
        assert!(matches!(
            err,
            GridError::UnknownFilterColumn { ref column, ref grid } if column == "Unknown" && grid == "entities"
        ));
    }

    #[test]
    fn sort_and_filter_allowlists_are_separate() {
        let err = registry().resolve_sort("string").unwrap_err();
        assert!(matches!(err, GridError::UnknownSortColumn { .. }));
    }

    #[test]
    fn search_requires_columns() {
        let registry = ColumnRegistry::new("bare").filter_column("a", "t.a");
        assert!(matches!(
            registry.resolve_search(),
            Err(GridError::SearchNotConfigured { .. })
        ));
    }

    #[test]
    fn search_columns_must_be_filterable() {
        let registry = registry().search_column("float");
        assert!(matches!(
            registry.resolve_search(),
            Err(GridError::UnknownSearchColumn { ref column, .. }) if column == "float"
        ));
    }

    #[test]
    fn contributors_are_keyed_by_column() {
        let registry = registry().contributor("string", Arc::new(OperatorTable));
        assert!(registry.contributor_for("string").is_some());
        assert!(registry.contributor_for("int").is_none());
    }
}
