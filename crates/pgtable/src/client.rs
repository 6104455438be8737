//! The connection abstraction shared by plain clients, pooled connections and
//! transactions.

use crate::error::{TableError, TableResult};
use std::future::Future;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Anything that can run a statement on a PostgreSQL session.
///
/// Table operations reach this through the blanket
/// [`DbHandle`](crate::DbHandle) impl, so one descriptor serves a plain
/// connection, a pooled connection and an open transaction alike.
pub trait GenericClient: Send + Sync {
    /// Run `sql` and collect every returned row.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = TableResult<Vec<Row>>> + Send;

    /// Run `sql` and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = TableResult<u64>> + Send;

    /// Run `sql` and keep the first row.
    ///
    /// No row is [`TableError::NotFound`]; extra rows are ignored.
    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = TableResult<Row>> + Send {
        async move {
            self.query_opt(sql, params)
                .await?
                .ok_or_else(|| TableError::not_found("statement returned no rows"))
        }
    }

    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = TableResult<Option<Row>>> + Send {
        async move { Ok(self.query(sql, params).await?.into_iter().next()) }
    }
}

/// Forward to the inherent `tokio_postgres` methods of the session `$target`
/// derefs to, classifying database errors on the way out.
macro_rules! impl_generic_client {
    ($ty:ty, |$this:ident| $target:expr) => {
        impl GenericClient for $ty {
            async fn query(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> TableResult<Vec<Row>> {
                let $this = self;
                $target
                    .query(sql, params)
                    .await
                    .map_err(TableError::from_db_error)
            }

            async fn execute(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> TableResult<u64> {
                let $this = self;
                $target
                    .execute(sql, params)
                    .await
                    .map_err(TableError::from_db_error)
            }
        }
    };
}

impl_generic_client!(tokio_postgres::Client, |c| c);
impl_generic_client!(tokio_postgres::Transaction<'_>, |tx| tx);

// deadpool's Client derefs through ClientWrapper to tokio_postgres::Client.
#[cfg(feature = "pool")]
impl_generic_client!(deadpool_postgres::Client, |c| (***c));
#[cfg(feature = "pool")]
impl_generic_client!(deadpool_postgres::Transaction<'_>, |tx| (**tx));
