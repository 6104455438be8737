//! The database handle contract used by table operations.

use crate::client::GenericClient;
use crate::error::TableResult;
use crate::row::FromRow;
use tokio_postgres::types::ToSql;

/// What a [`Table`](crate::Table) needs from the database: fetch one row into a
/// record, and execute a statement.
///
/// Every [`GenericClient`] is a handle for any [`FromRow`] record, so callers
/// normally pass a client, a pooled connection or a transaction. Implement this
/// trait directly to put something else behind a table (a test double, a
/// routing layer, ...).
pub trait DbHandle<R>: Send + Sync {
    /// Run `sql` and hydrate the first returned row.
    ///
    /// Zero rows must be reported as [`TableError::NotFound`](crate::TableError::NotFound).
    fn fetch_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = TableResult<R>> + Send;

    /// Run `sql` and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = TableResult<u64>> + Send;
}

impl<C, R> DbHandle<R> for C
where
    C: GenericClient,
    R: FromRow + Send,
{
    async fn fetch_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> TableResult<R> {
        let row = GenericClient::query_one(self, sql, params).await?;
        R::from_row(&row)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> TableResult<u64> {
        GenericClient::execute(self, sql, params).await
    }
}
