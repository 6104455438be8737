//! Table descriptors and the generic CRUD operations built on them.
//!
//! A [`Table`] is configured once per record type, usually at startup, and is
//! read-only afterwards. Every operation is a single round trip through a
//! [`DbHandle`]: arguments come from the field descriptors, the row (if any)
//! is hydrated through [`FromRow`](crate::FromRow) and handed to the optional
//! post-process callback.
//!
//! # Example
//!
//! ```ignore
//! use pgtable::{Field, QueryOptions, Table};
//!
//! let users = Table::<User>::builder("users")
//!     .schema("app")
//!     .field(Field::new("id").id().value(|u: &User| u.id))
//!     .field(Field::new("email").value(|u: &User| u.email.clone()))
//!     .field(Field::new("created_at").insert_expr("now()"))
//!     .build()?;
//!
//! users.insert(&client, &mut user, QueryOptions::default()).await?;
//! let same = users.get_by_id(&client, &[&user.id]).await?;
//! users.delete_by_id(&client, &[&user.id]).await?;
//! ```

mod builder;
mod statements;


pub use builder::TableBuilder;

use crate::error::{BoxError, TableError, TableResult};
use crate::field::{Field, FieldValue};
use crate::handle::DbHandle;
use crate::ident::Ident;
use crate::options::QueryOptions;
use statements::{Statements, Stored};
use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// Callback applied to every freshly hydrated record before it is returned.
pub type PostProcessFn<T> = Arc<dyn Fn(&mut T) -> Result<(), BoxError> + Send + Sync>;

/// The operations a table descriptor carries a statement for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetById,
    DeleteById,
    Insert,
    Update,
    Upsert,
    GetByQuery,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::GetById => "get_by_id",
            Operation::DeleteById => "delete_by_id",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Upsert => "upsert",
            Operation::GetByQuery => "get_by_query",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relational table (or view) mapped to the record type `T`.
pub struct Table<T> {
    name: Ident,
    qualified: String,
    fields: Vec<Field<T>>,
    joins: Option<String>,
    select_list: String,
    post_process: Option<PostProcessFn<T>>,
    statements: Statements,
}

impl<T> Table<T> {
    /// Start configuring a descriptor for `table`.
    ///
    /// The name may be schema-qualified (`"app.users"`) or combined with
    /// [`TableBuilder::schema`].
    pub fn builder(table: impl Into<String>) -> TableBuilder<T> {
        TableBuilder::new(table)
    }

    /// Bare table name, as used for column qualifiers (`users`).
    pub fn name(&self) -> String {
        self.name.to_sql()
    }

    /// Schema-qualified table name as it appears after `FROM` (`app.users`).
    pub fn qualified_name(&self) -> &str {
        &self.qualified
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    pub fn joins(&self) -> Option<&str> {
        self.joins.as_deref()
    }

    /// The select list used by reads, without the `SELECT` keyword.
    pub fn select_list(&self) -> &str {
        &self.select_list
    }

    pub fn get_by_id_sql(&self) -> Option<&str> {
        self.statements.get(Stored::GetById)
    }

    pub fn delete_by_id_sql(&self) -> Option<&str> {
        self.statements.get(Stored::DeleteById)
    }

    pub fn insert_sql(&self) -> Option<&str> {
        self.statements.get(Stored::Insert)
    }

    pub fn update_sql(&self) -> Option<&str> {
        self.statements.get(Stored::Update)
    }

    pub fn upsert_sql(&self) -> Option<&str> {
        self.statements.get(Stored::Upsert)
    }

    /// Render this table's selected columns for use as another table's
    /// additional select fields, typically when this table is joined in.
    ///
    /// Each column becomes `alias.col AS prefixcol`. With `coalesce`, columns
    /// that declare a [`Field::null_val`] become
    /// `COALESCE(alias.col, null_val) AS prefixcol`, which keeps left joins
    /// without a match decodable into non-optional record fields.
    pub fn additional_fields(&self, alias: Option<&str>, prefix: &str, coalesce: bool) -> String {
        let alias = alias.map_or_else(|| self.name.to_sql(), str::to_string);
        self.fields
            .iter()
            .filter(|f| f.select)
            .map(|f| {
                let column = format!("{alias}.{}", statements::column_sql(&f.name));
                let output = statements::prefixed_output_name(prefix, &f.name);
                match (&f.null_val, coalesce) {
                    (Some(null_val), true) => {
                        format!("COALESCE({column}, {null_val}) AS {output}")
                    }
                    _ => format!("{column} AS {output}"),
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Fetch one record by its id value(s), in id-field declaration order.
    pub async fn get_by_id<D>(&self, db: &D, ids: &[&(dyn ToSql + Sync)]) -> TableResult<T>
    where
        D: DbHandle<T> + ?Sized,
    {
        let sql = self.statement(Stored::GetById)?;
        self.fetch(Operation::GetById, db, sql, ids).await
    }

    /// Fetch one record with an arbitrary statement.
    ///
    /// Hydration and post-processing are the same as [`Table::get_by_id`].
    pub async fn get_by_query<D>(
        &self,
        db: &D,
        sql: &str,
        values: &[&(dyn ToSql + Sync)],
    ) -> TableResult<T>
    where
        D: DbHandle<T> + ?Sized,
    {
        self.fetch(Operation::GetByQuery, db, sql, values).await
    }

    /// Delete one record by its id value(s).
    ///
    /// A statement that succeeds but affects no rows is reported as
    /// [`TableError::NotFound`].
    pub async fn delete_by_id<D>(&self, db: &D, ids: &[&(dyn ToSql + Sync)]) -> TableResult<()>
    where
        D: DbHandle<T> + ?Sized,
    {
        let sql = self.statement(Stored::DeleteById)?;
        self.log_statement(Operation::DeleteById, ids.len());
        let affected = db
            .execute(sql, ids)
            .await
            .inspect_err(|e| self.log_failure(Operation::DeleteById, e))?;
        if affected == 0 {
            return Err(TableError::not_found(format!(
                "no {} row matched the given id",
                self.qualified
            )));
        }
        Ok(())
    }

    /// Insert `record`, then read the inserted row back into it unless
    /// `opts.ignore_return` is set.
    pub async fn insert<D>(&self, db: &D, record: &mut T, opts: QueryOptions) -> TableResult<()>
    where
        D: DbHandle<T> + ?Sized,
    {
        self.write(Stored::Insert, db, record, opts).await
    }

    /// Update `record` by its id field(s), then read the row back into it
    /// unless `opts.ignore_return` is set.
    pub async fn update<D>(&self, db: &D, record: &mut T, opts: QueryOptions) -> TableResult<()>
    where
        D: DbHandle<T> + ?Sized,
    {
        self.write(Stored::Update, db, record, opts).await
    }

    /// Insert or update `record`, then read the row back into it unless
    /// `opts.ignore_return` is set.
    pub async fn upsert<D>(&self, db: &D, record: &mut T, opts: QueryOptions) -> TableResult<()>
    where
        D: DbHandle<T> + ?Sized,
    {
        self.write(Stored::Upsert, db, record, opts).await
    }

    /// Extract one argument per value field, in declaration order.
    pub fn args(&self, record: &T) -> TableResult<Vec<FieldValue>> {
        self.fields
            .iter()
            .filter_map(|field| {
                field
                    .extract(record)
                    .map(|res| res.map_err(|e| TableError::field_value(&field.name, e)))
            })
            .collect()
    }

    async fn write<D>(
        &self,
        stored: Stored,
        db: &D,
        record: &mut T,
        opts: QueryOptions,
    ) -> TableResult<()>
    where
        D: DbHandle<T> + ?Sized,
    {
        let op = stored.operation();
        let sql = self.statement(stored)?;
        let args = self.args(record)?;
        let params: Vec<&(dyn ToSql + Sync)> = args
            .iter()
            .map(|a| &**a as &(dyn ToSql + Sync))
            .collect();
        self.log_statement(op, params.len());

        if opts.ignore_return {
            db.execute(sql, &params)
                .await
                .inspect_err(|e| self.log_failure(op, e))?;
            return Ok(());
        }

        *record = db
            .fetch_one(sql, &params)
            .await
            .inspect_err(|e| self.log_failure(op, e))?;
        self.apply_post_process(record)
    }

    async fn fetch<D>(
        &self,
        op: Operation,
        db: &D,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> TableResult<T>
    where
        D: DbHandle<T> + ?Sized,
    {
        self.log_statement(op, params.len());
        let mut record = db
            .fetch_one(sql, params)
            .await
            .inspect_err(|e| self.log_failure(op, e))?;
        self.apply_post_process(&mut record)?;
        Ok(record)
    }

    fn statement(&self, stored: Stored) -> TableResult<&str> {
        self.statements
            .get(stored)
            .ok_or_else(|| TableError::MissingStatement {
                table: self.qualified.clone(),
                operation: stored.operation().as_str(),
            })
    }

    fn apply_post_process(&self, record: &mut T) -> TableResult<()> {
        match &self.post_process {
            Some(post_process) => post_process(record).map_err(|e| {
                tracing::debug!(
                    target: "pgtable::table",
                    table = %self.qualified,
                    error = %e,
                    "post process rejected record"
                );
                TableError::PostProcess(e)
            }),
            None => Ok(()),
        }
    }

    fn log_statement(&self, op: Operation, arg_count: usize) {
        tracing::debug!(
            target: "pgtable::table",
            table = %self.qualified,
            operation = op.as_str(),
            arg_count,
            "executing table operation"
        );
    }

    fn log_failure(&self, op: Operation, err: &TableError) {
        tracing::debug!(
            target: "pgtable::table",
            table = %self.qualified,
            operation = op.as_str(),
            error = %err,
            "table operation failed"
        );
    }
}

impl<T> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("qualified", &self.qualified)
            .field("fields", &self.fields)
            .field("joins", &self.joins)
            .field("select_list", &self.select_list)
            .field("post_process", &self.post_process.is_some())
            .field("statements", &self.statements)
            .finish()
    }
}
