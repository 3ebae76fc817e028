//! The execution seam.

use crate::query::Query;
use crate::value::FilterValue;

/// Executes compiled queries against a backing store.
///
/// Implementations receive fully validated queries and own every I/O
/// concern: connections, timeouts, cancellation, retries. Their errors are
/// surfaced unchanged through [`GridError::Target`](crate::GridError::Target).
pub trait QueryTarget {
    /// The record type returned for row queries.
    type Row;
    /// The backend's error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs a [`Projection::Rows`](crate::Projection::Rows) query.
    fn fetch_rows(&self, query: &Query) -> Result<Vec<Self::Row>, Self::Error>;

    /// Runs a [`Projection::Count`](crate::Projection::Count) query.
    fn count(&self, query: &Query) -> Result<u64, Self::Error>;

    /// Runs a [`Projection::Values`](crate::Projection::Values) query:
    /// distinct values of one column, in storage order, windowed.
    fn fetch_values(&self, query: &Query) -> Result<Vec<FilterValue>, Self::Error>;
}

impl<T: QueryTarget + ?Sized> QueryTarget for &T {
    type Row = T::Row;
    type Error = T::Error;

    fn fetch_rows(&self, query: &Query) -> Result<Vec<Self::Row>, Self::Error> {
        (**self).fetch_rows(query)
    }

    fn count(&self, query: &Query) -> Result<u64, Self::Error> {
        (**self).count(query)
    }

    fn fetch_values(&self, query: &Query) -> Result<Vec<FilterValue>, Self::Error> {
        (**self).fetch_values(query)
    }
}
