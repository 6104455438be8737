use super::statements::{self, Layout, Statements, Stored};
use super::{PostProcessFn, Table};
use crate::error::{BoxError, TableError, TableResult};
use crate::field::{Field, VALUE};
use crate::ident::Ident;
use std::collections::HashSet;
use std::sync::Arc;

/// Builder for [`Table`].
///
/// Statements that are not supplied explicitly are derived from the fields
/// when [`TableBuilder::build`] runs; see the crate docs for the rules.
pub struct TableBuilder<T> {
    schema: Option<String>,
    table: String,
    fields: Vec<Field<T>>,
    joins: Option<String>,
    post_process: Option<PostProcessFn<T>>,
    select_fields: Option<String>,
    select_additional_fields: Option<String>,
    overrides: Statements,
}

impl<T> TableBuilder<T> {
    pub(crate) fn new(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            fields: Vec::new(),
            joins: None,
            post_process: None,
            select_fields: None,
            select_additional_fields: None,
            overrides: Statements::default(),
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Append a field. Declaration order is argument order.
    pub fn field(mut self, field: Field<T>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field<T>>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Join clause appended after `FROM <table>` on reads, e.g.
    /// `"LEFT JOIN teams ON teams.id = users.team_id"`.
    pub fn joins(mut self, joins: impl Into<String>) -> Self {
        self.joins = Some(joins.into());
        self
    }

    /// Callback run on every hydrated record before it is returned.
    pub fn post_process<E, F>(mut self, f: F) -> Self
    where
        E: Into<BoxError>,
        F: Fn(&mut T) -> Result<(), E> + Send + Sync + 'static,
    {
        let post_process: PostProcessFn<T> =
            Arc::new(move |record: &mut T| f(record).map_err(Into::<BoxError>::into));
        self.post_process = Some(post_process);
        self
    }

    /// Replace the derived select list (comma separated, no `SELECT`).
    pub fn select_fields(mut self, select: impl Into<String>) -> Self {
        self.select_fields = Some(select.into());
        self
    }

    /// Extra comma-separated select expressions, usually columns of joined tables.
    pub fn select_additional_fields(mut self, select: impl Into<String>) -> Self {
        self.select_additional_fields = Some(select.into());
        self
    }

    pub fn get_by_id_query(mut self, sql: impl Into<String>) -> Self {
        self.overrides.set(Stored::GetById, sql.into());
        self
    }

    pub fn delete_by_id_query(mut self, sql: impl Into<String>) -> Self {
        self.overrides.set(Stored::DeleteById, sql.into());
        self
    }

    pub fn insert_query(mut self, sql: impl Into<String>) -> Self {
        self.overrides.set(Stored::Insert, sql.into());
        self
    }

    pub fn update_query(mut self, sql: impl Into<String>) -> Self {
        self.overrides.set(Stored::Update, sql.into());
        self
    }

    pub fn upsert_query(mut self, sql: impl Into<String>) -> Self {
        self.overrides.set(Stored::Upsert, sql.into());
        self
    }

    /// Validate names and resolve every statement.
    pub fn build(self) -> TableResult<Table<T>> {
        let table = Ident::parse(&self.table)?;
        let qualified = match &self.schema {
            Some(schema) => {
                if !table.is_simple() {
                    return Err(TableError::validation(format!(
                        "table '{}' is already qualified; drop the schema '{}'",
                        self.table, schema
                    )));
                }
                Ident::parse(schema)?.join(&table)
            }
            None => table,
        };
        let name = qualified.last();
        validate_fields(&self.fields)?;

        let name_sql = name.to_sql();
        let qualified_sql = qualified.to_sql();
        let mut select_list = self
            .select_fields
            .clone()
            .unwrap_or_else(|| statements::select_list(&name_sql, &self.fields));
        if let Some(extra) = &self.select_additional_fields {
            if !select_list.is_empty() {
                select_list.push_str(", ");
            }
            select_list.push_str(extra);
        }

        let layout = Layout {
            qualified: &qualified_sql,
            name: &name_sql,
            fields: &self.fields,
            joins: self.joins.as_deref(),
            select_list: &select_list,
            reshape_returning: self.joins.is_some()
                || self.select_fields.is_some()
                || self.select_additional_fields.is_some(),
        };

        let mut resolved = Statements::default();
        for op in Stored::ALL {
            if let Some(sql) = self.overrides.get(op) {
                resolved.set(op, sql.to_string());
                continue;
            }
            match statements::derive(&layout, op) {
                Ok(sql) => resolved.set(op, sql),
                Err(reason) => tracing::debug!(
                    target: "pgtable::table",
                    table = %qualified_sql,
                    operation = op.operation().as_str(),
                    reason = %reason,
                    "statement not derived"
                ),
            }
        }

        Ok(Table {
            name,
            qualified: qualified_sql,
            fields: self.fields,
            joins: self.joins,
            select_list,
            post_process: self.post_process,
            statements: resolved,
        })
    }
}

fn validate_fields<T>(fields: &[Field<T>]) -> TableResult<()> {
    let mut seen = HashSet::new();
    for field in fields {
        let ident = Ident::parse(&field.name)?;
        if !ident.is_simple() {
            return Err(TableError::validation(format!(
                "field '{}' must be a plain column name",
                field.name
            )));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(TableError::validation(format!(
                "field '{}' is declared twice",
                field.name
            )));
        }
        if field.value.is_none() {
            let uses_value = [field.insert_sql(), field.update_sql()]
                .into_iter()
                .flatten()
                .any(|expr| expr.contains(VALUE));
            if uses_value {
                return Err(TableError::validation(format!(
                    "field '{}' uses {VALUE} but has no value function",
                    field.name
                )));
            }
        }
    }
    Ok(())
}
