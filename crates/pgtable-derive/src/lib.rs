//! Derive macros for pgtable
//!
//! Provides `#[derive(FromRow)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_row;

/// Derive `FromRow` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use pgtable::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     username: String,
///     #[pgtable(column = "email_address")]
///     email: Option<String>,
///     #[pgtable(skip)]
///     display: String,
/// }
/// ```
///
/// # Attributes
///
/// - `#[pgtable(column = "name")]` - read the field from a differently named column
/// - `#[pgtable(skip)]` - not read from the row, filled with `Default::default()`
///   (typically set later by a post-process callback)
#[proc_macro_derive(FromRow, attributes(pgtable))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
