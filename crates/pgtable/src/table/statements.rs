//! SQL derivation from field descriptors.
//!
//! Argument `$k` always belongs to the k-th field that has a value function,
//! whatever the statement. A statement is only derived when it references
//! every such argument; otherwise the caller has to supply it.

use super::Operation;
use crate::field::{Field, VALUE};
use crate::ident::{Ident, IdentPart};

/// The operations whose statement lives in the descriptor.
///
/// `get_by_query` takes its statement per call, so it has no slot here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stored {
    GetById,
    DeleteById,
    Insert,
    Update,
    Upsert,
}

impl Stored {
    pub(crate) const ALL: [Stored; 5] = [
        Stored::GetById,
        Stored::DeleteById,
        Stored::Insert,
        Stored::Update,
        Stored::Upsert,
    ];

    pub(crate) fn operation(self) -> Operation {
        match self {
            Stored::GetById => Operation::GetById,
            Stored::DeleteById => Operation::DeleteById,
            Stored::Insert => Operation::Insert,
            Stored::Update => Operation::Update,
            Stored::Upsert => Operation::Upsert,
        }
    }
}

/// Resolved statement text, one slot per [`Stored`] operation.
#[derive(Debug, Clone, Default)]
pub(crate) struct Statements {
    slots: [Option<String>; 5],
}

impl Statements {
    pub(crate) fn get(&self, op: Stored) -> Option<&str> {
        self.slots[op as usize].as_deref()
    }

    pub(crate) fn set(&mut self, op: Stored, sql: String) {
        self.slots[op as usize] = Some(sql);
    }
}

/// Everything derivation needs to know about a table.
pub(crate) struct Layout<'a, T> {
    pub(crate) qualified: &'a str,
    pub(crate) name: &'a str,
    pub(crate) fields: &'a [Field<T>],
    pub(crate) joins: Option<&'a str>,
    pub(crate) select_list: &'a str,
    /// Reads select more than the table's own columns (joins, extra or
    /// overridden select fields), so writes must return rows in the same shape.
    pub(crate) reshape_returning: bool,
}

/// Render a validated column name.
pub(crate) fn column_sql(name: &str) -> String {
    Ident::parse(name)
        .map(|ident| ident.to_sql())
        .unwrap_or_else(|_| name.to_string())
}

/// Render an output column alias, quoting it when it is not a plain identifier.
pub(crate) fn output_name(name: &str) -> String {
    match Ident::parse(name) {
        Ok(ident) if ident.is_simple() => ident.to_sql(),
        _ => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

/// Output alias for column `name` with `prefix` prepended to its bare name.
///
/// A quoted column keeps its quotes so the alias keeps its case
/// (`"UserId"` with `team_` gives `"team_UserId"`).
pub(crate) fn prefixed_output_name(prefix: &str, name: &str) -> String {
    match Ident::parse(name).map(|ident| ident.parts.last().cloned()) {
        Ok(Some(IdentPart::Quoted(raw))) => {
            IdentPart::Quoted(format!("{prefix}{raw}")).to_string()
        }
        Ok(Some(IdentPart::Unquoted(raw))) => output_name(&format!("{prefix}{raw}")),
        _ => output_name(&format!("{prefix}{name}")),
    }
}

/// `table.col, table.col, ...` for every selected field.
pub(crate) fn select_list<T>(name: &str, fields: &[Field<T>]) -> String {
    fields
        .iter()
        .filter(|f| f.select)
        .map(|f| format!("{name}.{}", column_sql(&f.name)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 1-based argument position of each field, `None` for fields without a value.
fn positions<T>(fields: &[Field<T>]) -> Vec<Option<usize>> {
    let mut next = 0;
    fields
        .iter()
        .map(|f| {
            f.value.as_ref().map(|_| {
                next += 1;
                next
            })
        })
        .collect()
}

fn bind(expr: &str, position: Option<usize>) -> String {
    match position {
        Some(k) => expr.replace(VALUE, &format!("${k}")),
        None => expr.to_string(),
    }
}

pub(crate) fn derive<T>(layout: &Layout<'_, T>, op: Stored) -> Result<String, String> {
    match op {
        Stored::GetById => get_by_id(layout),
        Stored::DeleteById => delete_by_id(layout),
        Stored::Insert => insert(layout).map(|sql| returning(layout, sql)),
        Stored::Update => update(layout).map(|sql| returning(layout, sql)),
        Stored::Upsert => upsert(layout).map(|sql| returning(layout, sql)),
    }
}

fn id_fields<'a, T>(layout: &Layout<'a, T>) -> Result<Vec<&'a Field<T>>, String> {
    let ids: Vec<_> = layout.fields.iter().filter(|f| f.id).collect();
    if ids.is_empty() {
        return Err("no id fields declared".into());
    }
    Ok(ids)
}

fn get_by_id<T>(layout: &Layout<'_, T>) -> Result<String, String> {
    if layout.select_list.is_empty() {
        return Err("no selected fields".into());
    }
    let conditions: Vec<_> = id_fields(layout)?
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{}.{} = ${}", layout.name, column_sql(&f.name), i + 1))
        .collect();

    let mut sql = format!("SELECT {} FROM {}", layout.select_list, layout.qualified);
    if let Some(joins) = layout.joins {
        sql.push(' ');
        sql.push_str(joins);
    }
    sql.push_str(" WHERE ");
    sql.push_str(&conditions.join(" AND "));
    Ok(sql)
}

fn delete_by_id<T>(layout: &Layout<'_, T>) -> Result<String, String> {
    let conditions: Vec<_> = id_fields(layout)?
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{} = ${}", column_sql(&f.name), i + 1))
        .collect();
    Ok(format!(
        "DELETE FROM {} WHERE {}",
        layout.qualified,
        conditions.join(" AND ")
    ))
}

fn insert<T>(layout: &Layout<'_, T>) -> Result<String, String> {
    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (field, position) in layout.fields.iter().zip(positions(layout.fields)) {
        match (field.insert_sql(), position) {
            (Some(expr), Some(_)) if !expr.contains(VALUE) => {
                return Err(format!(
                    "field {} has a value but its insert expression does not use {VALUE}",
                    field.name
                ));
            }
            (Some(expr), position) => {
                columns.push(column_sql(&field.name));
                values.push(bind(expr, position));
            }
            (None, Some(_)) => {
                return Err(format!(
                    "field {} has a value but is excluded from insert",
                    field.name
                ));
            }
            (None, None) => {}
        }
    }
    if columns.is_empty() {
        return Err("no insertable fields".into());
    }
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        layout.qualified,
        columns.join(", "),
        values.join(", ")
    ))
}

fn update<T>(layout: &Layout<'_, T>) -> Result<String, String> {
    id_fields(layout)?;
    let mut assignments = Vec::new();
    let mut conditions = Vec::new();
    for (field, position) in layout.fields.iter().zip(positions(layout.fields)) {
        let column = column_sql(&field.name);
        if field.id {
            match position {
                Some(k) => conditions.push(format!("{column} = ${k}")),
                None => return Err(format!("id field {} has no value", field.name)),
            }
            continue;
        }
        match (field.update_sql(), position) {
            (Some(expr), Some(_)) if !expr.contains(VALUE) => {
                return Err(format!(
                    "field {} has a value but its update expression does not use {VALUE}",
                    field.name
                ));
            }
            (Some(expr), position) => assignments.push(format!("{column} = {}", bind(expr, position))),
            (None, Some(_)) => {
                return Err(format!(
                    "field {} has a value but is excluded from update",
                    field.name
                ));
            }
            (None, None) => {}
        }
    }
    if assignments.is_empty() {
        return Err("no updatable fields".into());
    }
    Ok(format!(
        "UPDATE {} SET {} WHERE {}",
        layout.qualified,
        assignments.join(", "),
        conditions.join(" AND ")
    ))
}

fn upsert<T>(layout: &Layout<'_, T>) -> Result<String, String> {
    let insert = insert(layout)?;
    let target: Vec<_> = id_fields(layout)?
        .iter()
        .map(|f| column_sql(&f.name))
        .collect();
    let mut assignments: Vec<_> = layout
        .fields
        .iter()
        .zip(positions(layout.fields))
        .filter(|(f, _)| !f.id)
        .filter_map(|(f, position)| {
            f.update_sql()
                .map(|expr| format!("{} = {}", column_sql(&f.name), bind(expr, position)))
        })
        .collect();

    // DO NOTHING returns no row on conflict; a no-op assignment keeps RETURNING populated.
    if assignments.is_empty() {
        if let Some(first) = target.first() {
            assignments.push(format!("{first} = EXCLUDED.{first}"));
        }
    }
    Ok(format!(
        "{insert} ON CONFLICT ({}) DO UPDATE SET {}",
        target.join(", "),
        assignments.join(", ")
    ))
}

/// Make a write statement return the row the way reads see it.
fn returning<T>(layout: &Layout<'_, T>, write: String) -> String {
    if layout.reshape_returning {
        let mut sql = format!(
            "WITH {name} AS ({write} RETURNING *) SELECT {} FROM {name}",
            layout.select_list,
            name = layout.name
        );
        if let Some(joins) = layout.joins {
            sql.push(' ');
            sql.push_str(joins);
        }
        return sql;
    }

    let columns: Vec<_> = layout
        .fields
        .iter()
        .filter(|f| f.select)
        .map(|f| column_sql(&f.name))
        .collect();
    if columns.is_empty() {
        format!("{write} RETURNING *")
    } else {
        format!("{write} RETURNING {}", columns.join(", "))
    }
}
