//! Field descriptors: one entry per column of a [`Table`](crate::Table).

use crate::error::BoxError;
use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// Positional argument placeholder for insert/update expressions.
///
/// Each occurrence is replaced with the field's `$n` when statements are
/// derived, e.g. `"COALESCE($#, now())"` becomes `"COALESCE($3, now())"`.
pub const VALUE: &str = "$#";

/// A boxed statement argument produced by a field's value function.
pub type FieldValue = Box<dyn ToSql + Sync + Send>;

/// Extracts one statement argument from a record.
pub type ValueFn<T> = Arc<dyn Fn(&T) -> Result<FieldValue, BoxError> + Send + Sync>;

/// How a field takes part in a derived INSERT or UPDATE.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WriteExpr {
    /// [`VALUE`] when the field has a value function, otherwise left out.
    Default,
    Expr(String),
    Skip,
}

/// Column metadata and argument extraction for one record attribute.
///
/// # Example
///
/// ```ignore
/// use pgtable::Field;
///
/// let id = Field::new("id").id().value(|u: &User| u.id);
/// let created = Field::<User>::new("created_at").insert_expr("now()").no_update();
/// let email = Field::new("email").try_value(|u: &User| normalize_email(&u.email));
/// ```
pub struct Field<T> {
    pub(crate) name: String,
    pub(crate) id: bool,
    pub(crate) select: bool,
    insert: WriteExpr,
    update: WriteExpr,
    pub(crate) value: Option<ValueFn<T>>,
    pub(crate) null_val: Option<String>,
}

impl<T> Field<T> {
    /// A selected column with no value function and no write expressions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: false,
            select: true,
            insert: WriteExpr::Default,
            update: WriteExpr::Default,
            value: None,
            null_val: None,
        }
    }

    /// Mark this field as part of the primary key.
    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }

    /// Exclude this field from the derived select list.
    pub fn no_select(mut self) -> Self {
        self.select = false;
        self
    }

    /// Set the expression used in derived INSERT statements.
    pub fn insert_expr(mut self, expr: impl Into<String>) -> Self {
        self.insert = WriteExpr::Expr(expr.into());
        self
    }

    /// Set the expression used in derived UPDATE / upsert SET clauses.
    pub fn update_expr(mut self, expr: impl Into<String>) -> Self {
        self.update = WriteExpr::Expr(expr.into());
        self
    }

    /// Leave this column out of derived INSERT statements.
    pub fn no_insert(mut self) -> Self {
        self.insert = WriteExpr::Skip;
        self
    }

    /// Leave this column out of derived UPDATE / upsert SET clauses.
    pub fn no_update(mut self) -> Self {
        self.update = WriteExpr::Skip;
        self
    }

    /// SQL literal returned when this column is selected through `COALESCE`.
    pub fn null_val(mut self, literal: impl Into<String>) -> Self {
        self.null_val = Some(literal.into());
        self
    }

    /// Attach an infallible value function.
    ///
    /// Write expressions that are not set explicitly default to [`VALUE`].
    pub fn value<V, F>(self, f: F) -> Self
    where
        V: ToSql + Sync + Send + 'static,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.with_value_fn(Arc::new(move |record: &T| {
            Ok::<_, BoxError>(Box::new(f(record)) as FieldValue)
        }))
    }

    /// Attach a value function that may reject the record.
    ///
    /// A failure aborts the operation before any statement runs.
    pub fn try_value<V, E, F>(self, f: F) -> Self
    where
        V: ToSql + Sync + Send + 'static,
        E: Into<BoxError>,
        F: Fn(&T) -> Result<V, E> + Send + Sync + 'static,
    {
        self.with_value_fn(Arc::new(move |record: &T| {
            f(record)
                .map(|v| Box::new(v) as FieldValue)
                .map_err(Into::<BoxError>::into)
        }))
    }

    fn with_value_fn(mut self, f: ValueFn<T>) -> Self {
        self.value = Some(f);
        self
    }

    /// Expression used for this column in derived INSERT statements.
    pub fn insert_sql(&self) -> Option<&str> {
        self.resolve(&self.insert)
    }

    /// Expression used for this column in derived UPDATE / upsert SET clauses.
    pub fn update_sql(&self) -> Option<&str> {
        self.resolve(&self.update)
    }

    fn resolve<'a>(&'a self, expr: &'a WriteExpr) -> Option<&'a str> {
        match expr {
            WriteExpr::Default => self.value.as_ref().map(|_| VALUE),
            WriteExpr::Expr(expr) => Some(expr),
            WriteExpr::Skip => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_id(&self) -> bool {
        self.id
    }

    pub fn is_selected(&self) -> bool {
        self.select
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub(crate) fn extract(&self, record: &T) -> Option<Result<FieldValue, BoxError>> {
        self.value.as_ref().map(|f| f(record))
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            id: self.id,
            select: self.select,
            insert: self.insert.clone(),
            update: self.update.clone(),
            value: self.value.clone(),
            null_val: self.null_val.clone(),
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("select", &self.select)
            .field("insert", &self.insert)
            .field("update", &self.update)
            .field("value", &self.value.is_some())
            .field("null_val", &self.null_val)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        id: i64,
        email: String,
    }

    #[test]
    fn value_defaults_write_expressions() {
        let field = Field::new("email").value(|a: &Account| a.email.clone());
        assert_eq!(field.insert_sql(), Some(VALUE));
        assert_eq!(field.update_sql(), Some(VALUE));
        assert!(field.has_value());
    }

    #[test]
    fn explicit_expressions_survive_value() {
        let field = Field::new("id")
            .id()
            .no_update()
            .insert_expr("COALESCE($#, nextval('account_id_seq'))")
            .value(|a: &Account| a.id);
        assert_eq!(
            field.insert_sql(),
            Some("COALESCE($#, nextval('account_id_seq'))")
        );
        assert_eq!(field.update_sql(), None);
        assert!(field.is_id());
    }

    #[test]
    fn literal_field_has_no_value() {
        let field = Field::<Account>::new("created_at").insert_expr("now()");
        assert!(!field.has_value());
        assert_eq!(field.insert_sql(), Some("now()"));
        assert_eq!(field.update_sql(), None);
        assert!(field.extract(&Account { id: 1, email: String::new() }).is_none());
    }

    #[test]
    fn try_value_reports_errors() {
        let field = Field::new("email").try_value(|a: &Account| {
            if a.email.contains('@') {
                Ok(a.email.clone())
            } else {
                Err("missing @")
            }
        });
        let bad = Account {
            id: 1,
            email: "nobody".to_string(),
        };
        let err = field.extract(&bad).unwrap().err().unwrap();
        assert_eq!(err.to_string(), "missing @");
    }
}
