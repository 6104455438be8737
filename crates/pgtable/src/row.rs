//! Hydrating records from result rows.

use crate::error::{TableError, TableResult};
use std::fmt::Display;
use tokio_postgres::Row;
use tokio_postgres::row::RowIndex;
use tokio_postgres::types::FromSql;

/// Build a record from one result row.
///
/// Usually derived with `#[derive(FromRow)]`. Hand-written impls are useful
/// when a column needs a conversion the driver does not provide:
///
/// ```ignore
/// impl FromRow for Price {
///     fn from_row(row: &Row) -> TableResult<Self> {
///         let cents: i64 = row.try_get_column("cents")?;
///         Ok(Price { amount: cents as f64 / 100.0 })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> TableResult<Self>;
}

pub trait RowExt {
    /// Decode one column by name or position; failures become
    /// [`TableError::Decode`] naming the column.
    fn try_get_column<I, T>(&self, column: I) -> TableResult<T>
    where
        I: RowIndex + Display,
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<I, T>(&self, column: I) -> TableResult<T>
    where
        I: RowIndex + Display,
        T: for<'a> FromSql<'a>,
    {
        self.try_get(&column)
            .map_err(|e| TableError::decode(column.to_string(), e.to_string()))
    }
}
