//! Sort keys and their validation.
//!
//! Requested sort entries name public column keys. [`assemble`] resolves
//! them through the order allowlist and keeps request order, which is the
//! tie-break precedence.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::registry::ColumnRegistry;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    #[serde(rename = "ASC", alias = "asc", alias = "Asc")]
    Asc,
    /// Descending order (largest first).
    #[serde(rename = "DESC", alias = "desc", alias = "Desc")]
    Desc,
}

impl Dir {
    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Parses `asc` / `desc`, ignoring case.
    pub fn parse(s: &str) -> Option<Dir> {
        match s.trim() {
            d if d.eq_ignore_ascii_case("asc") => Some(Dir::Asc),
            d if d.eq_ignore_ascii_case("desc") => Some(Dir::Desc),
            _ => None,
        }
    }

    /// The SQL keyword for this direction.
    pub fn as_sql(self) -> &'static str {
        match self {
            Dir::Asc => "ASC",
            Dir::Desc => "DESC",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// A requested sort entry, naming a public column key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRequest {
    pub column: String,
    #[serde(default)]
    pub direction: Dir,
}

impl SortRequest {
    pub fn asc(column: impl Into<String>) -> Self {
        SortRequest {
            column: column.into(),
            direction: Dir::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        SortRequest {
            column: column.into(),
            direction: Dir::Desc,
        }
    }

    /// Parses an `orderby` list: `"+int,-string"`.
    ///
    /// A `-` prefix sorts descending; `+` or no prefix sorts ascending.
    /// Blank entries are skipped.
    pub fn parse_list(list: &str) -> Vec<SortRequest> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| {
                let (direction, column) = match entry.as_bytes()[0] {
                    b'-' => (Dir::Desc, &entry[1..]),
                    b'+' => (Dir::Asc, &entry[1..]),
                    _ => (Dir::Asc, entry),
                };
                let column = column.trim();
                (!column.is_empty()).then(|| SortRequest {
                    column: column.to_string(),
                    direction,
                })
            })
            .collect()
    }

    /// Renders back to `orderby` list form.
    pub fn format_list(requests: &[SortRequest]) -> String {
        requests
            .iter()
            .map(|r| match r.direction {
                Dir::Asc => format!("+{}", r.column),
                Dir::Desc => format!("-{}", r.column),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A resolved sort key over a storage column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub dir: Dir,
}

impl SortKey {
    pub fn new(column: impl Into<String>, dir: Dir) -> Self {
        SortKey {
            column: column.into(),
            dir,
        }
    }
}

/// Resolves sort requests in order.
///
/// The first unknown column aborts the whole sort; no partial sort is
/// returned.
pub fn assemble(registry: &ColumnRegistry, requests: &[SortRequest]) -> Result<Vec<SortKey>> {
    requests
        .iter()
        .map(|r| {
            registry
                .resolve_sort(&r.column)
                .map(|storage| SortKey::new(storage, r.direction))
        })
        .collect()
}
