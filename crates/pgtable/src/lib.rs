//! # pgtable
//!
//! Generic table descriptors with CRUD operations for PostgreSQL.
//!
//! Describe a table once per record type, then run `get_by_id`, `insert`,
//! `update`, `upsert`, `delete_by_id` and `get_by_query` against any client,
//! pooled connection or transaction.
//!
//! ## Features
//!
//! - **Descriptor, not per-call SQL**: fields declare columns, key membership and
//!   how to extract an argument from the record
//! - **Statements are explicit or derived**: hand-written SQL always wins; missing
//!   statements are derived from the fields once, at build time
//! - **Type-safe mapping**: Row → Struct via `FromRow` (derivable)
//! - **Transaction-friendly**: pass a transaction anywhere a `GenericClient` is expected
//! - **Distinct failures**: not-found, post-processing and argument extraction
//!   errors are separate [`TableError`] variants
//!
//! ```ignore
//! use pgtable::{Field, FromRow, QueryOptions, Table};
//!
//! #[derive(Debug, FromRow)]
//! struct User {
//!     id: i64,
//!     email: String,
//! }
//!
//! let users = Table::<User>::builder("users")
//!     .field(Field::new("id").id().value(|u: &User| u.id))
//!     .field(Field::new("email").value(|u: &User| u.email.clone()))
//!     .build()?;
//!
//! let mut user = User { id: 1, email: "a@example.com".into() };
//! users.insert(&client, &mut user, QueryOptions::default()).await?;
//! let user = users.get_by_id(&client, &[&1i64]).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod field;
pub mod handle;
pub mod ident;
pub mod options;
pub mod row;
pub mod table;

pub use client::GenericClient;
pub use config::{DatabaseConfig, Recycling};
pub use error::{BoxError, TableError, TableResult};
pub use field::{Field, FieldValue, VALUE, ValueFn};
pub use handle::DbHandle;
pub use ident::{Ident, IdentPart};
pub use options::QueryOptions;
pub use row::{FromRow, RowExt};
pub use table::{Operation, PostProcessFn, Table, TableBuilder};

// Re-exported so derived code and downstream crates agree on one version.
pub use tokio_postgres;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{
    create_pool, create_pool_from_config, create_pool_with_config, create_pool_with_manager_config,
};

#[cfg(feature = "derive")]
pub use pgtable_derive::FromRow;

pub mod prelude;
