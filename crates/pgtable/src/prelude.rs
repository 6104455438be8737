//! Convenient imports for typical `pgtable` usage.
//!
//! ```ignore
//! use pgtable::prelude::*;
//! ```

pub use crate::{
    DbHandle, Field, FromRow, GenericClient, QueryOptions, RowExt, Table, TableError, TableResult,
};

#[cfg(feature = "pool")]
pub use crate::{DatabaseConfig, create_pool, create_pool_from_config};
