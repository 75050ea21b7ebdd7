//! Statement assembly.
//!
//! Every statement is a fixed sequence of clause fragments. Empty fragments
//! are dropped, the rest are joined with single spaces and the result is
//! trimmed. Clause order:
//!
//! - find: SELECT, FROM, JOIN*, WHERE, GROUP BY, ORDER BY, LIMIT, OFFSET
//! - find-one: SELECT, FROM, JOIN*, WHERE (with the primary key condition)
//! - create-one: INSERT INTO, (columns) VALUES (values)
//! - update / update-one: UPDATE, SET, WHERE
//! - remove / remove-one: DELETE FROM, WHERE

use tracing::debug;

use crate::error::{CompileError, Result};
use crate::filter::{compile_filter, FilterTree};
use crate::ident::quote_identifier;
use crate::join::{collect_joins, render_joins};
use crate::path::normalize_columns;
use crate::request::{Item, QueryParams};
use crate::schema::Schema;
use crate::value::ToSqlValue;

/// Builds a SELECT statement.
///
/// # Errors
///
/// Returns a schema error when `table`, or a table reached through a
/// relation, is not declared, and [`CompileError::InvalidFilter`] for an
/// empty `IN` list.
pub fn find_raw(schema: &Schema, table: &str, params: &QueryParams) -> Result<String> {
    let sql = assemble(&[
        select(schema, table, params)?,
        from(schema, table)?,
        render_joins(&collect_joins(schema, table, params)?),
        where_clause(schema, table, &params.filter)?,
        group_by(schema, table, &params.group_by)?,
        order_by(schema, table, params)?,
        params.limit.map(|n| format!("LIMIT {n}")).unwrap_or_default(),
        params.offset.map(|n| format!("OFFSET {n}")).unwrap_or_default(),
    ]);
    debug!(table = %table, sql = %sql, "Compiled find statement");
    Ok(sql)
}

/// Builds a SELECT statement for the row whose primary key equals `key`.
///
/// Only `columns` and `filter` of `params` are used. The primary key
/// condition is merged into a copy of the filter.
///
/// # Errors
///
/// Same as [`find_raw`], plus [`CompileError::MissingPrimaryKey`] when
/// `table` declares no primary key.
pub fn find_one_raw<K: ToSqlValue>(
    schema: &Schema,
    table: &str,
    key: K,
    params: &QueryParams,
) -> Result<String> {
    let params = QueryParams {
        columns: params.columns.clone(),
        filter: primary_key_filter(schema, table, key, &params.filter)?,
        ..QueryParams::default()
    };
    let sql = assemble(&[
        select(schema, table, &params)?,
        from(schema, table)?,
        render_joins(&collect_joins(schema, table, &params)?),
        where_clause(schema, table, &params.filter)?,
    ]);
    debug!(table = %table, sql = %sql, "Compiled find-one statement");
    Ok(sql)
}

/// Builds an INSERT statement for one item.
///
/// # Errors
///
/// Returns a schema error when `table` is not declared.
pub fn create_one_raw(schema: &Schema, table: &str, item: &Item) -> Result<String> {
    schema.require_table(table)?;
    let columns: Vec<String> = item.columns().map(quote_identifier).collect();
    let values: Vec<String> = item.values().iter().map(|(_, v)| v.to_sql_inline()).collect();
    let sql = assemble(&[
        format!("INSERT INTO {}", quote_identifier(table)),
        format!("({}) VALUES ({})", columns.join(", "), values.join(", ")),
    ]);
    debug!(table = %table, sql = %sql, "Compiled create-one statement");
    Ok(sql)
}

/// Builds an UPDATE statement for every row matching `params.filter`.
///
/// # Errors
///
/// Same as [`find_raw`].
pub fn update_raw(schema: &Schema, table: &str, item: &Item, params: &QueryParams) -> Result<String> {
    let sql = assemble(&[
        update(schema, table)?,
        set(item),
        where_clause(schema, table, &params.filter)?,
    ]);
    debug!(table = %table, sql = %sql, "Compiled update statement");
    Ok(sql)
}

/// Builds an UPDATE statement for the row whose primary key equals `key`.
///
/// # Errors
///
/// Same as [`find_one_raw`].
pub fn update_one_raw<K: ToSqlValue>(
    schema: &Schema,
    table: &str,
    key: K,
    item: &Item,
    params: &QueryParams,
) -> Result<String> {
    let filter = primary_key_filter(schema, table, key, &params.filter)?;
    let sql = assemble(&[
        update(schema, table)?,
        set(item),
        where_clause(schema, table, &filter)?,
    ]);
    debug!(table = %table, sql = %sql, "Compiled update-one statement");
    Ok(sql)
}

/// Builds a DELETE statement for every row matching `params.filter`.
///
/// # Errors
///
/// Same as [`find_raw`].
pub fn remove_raw(schema: &Schema, table: &str, params: &QueryParams) -> Result<String> {
    let sql = assemble(&[
        remove(schema, table)?,
        where_clause(schema, table, &params.filter)?,
    ]);
    debug!(table = %table, sql = %sql, "Compiled remove statement");
    Ok(sql)
}

/// Builds a DELETE statement for the row whose primary key equals `key`.
///
/// # Errors
///
/// Same as [`find_one_raw`].
pub fn remove_one_raw<K: ToSqlValue>(
    schema: &Schema,
    table: &str,
    key: K,
    params: &QueryParams,
) -> Result<String> {
    let filter = primary_key_filter(schema, table, key, &params.filter)?;
    let sql = assemble(&[
        remove(schema, table)?,
        where_clause(schema, table, &filter)?,
    ]);
    debug!(table = %table, sql = %sql, "Compiled remove-one statement");
    Ok(sql)
}

fn assemble(fragments: &[String]) -> String {
    fragments
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn primary_key_filter<K: ToSqlValue>(
    schema: &Schema,
    table: &str,
    key: K,
    filter: &FilterTree,
) -> Result<FilterTree> {
    let primary_key = schema
        .primary_key_of(table)?
        .ok_or_else(|| CompileError::MissingPrimaryKey {
            table: table.to_string(),
        })?;
    Ok(filter.with_equality(primary_key, key.to_sql_value()))
}

fn select(schema: &Schema, table: &str, params: &QueryParams) -> Result<String> {
    let columns = normalize_columns(schema, table, params.columns.as_deref())?;
    Ok(format!("SELECT {columns}"))
}

fn from(schema: &Schema, table: &str) -> Result<String> {
    schema.require_table(table)?;
    Ok(format!("FROM {}", quote_identifier(table)))
}

fn update(schema: &Schema, table: &str) -> Result<String> {
    schema.require_table(table)?;
    Ok(format!("UPDATE {}", quote_identifier(table)))
}

fn remove(schema: &Schema, table: &str) -> Result<String> {
    schema.require_table(table)?;
    Ok(format!("DELETE FROM {}", quote_identifier(table)))
}

fn set(item: &Item) -> String {
    let assignments: Vec<String> = item
        .values()
        .iter()
        .map(|(column, value)| format!("{} = {}", quote_identifier(column), value.to_sql_inline()))
        .collect();
    format!("SET {}", assignments.join(", "))
}

fn where_clause(schema: &Schema, table: &str, filter: &FilterTree) -> Result<String> {
    let body = compile_filter(schema, table, filter)?;
    if body.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("WHERE {body}"))
}

fn group_by(schema: &Schema, table: &str, paths: &[String]) -> Result<String> {
    if paths.is_empty() {
        return Ok(String::new());
    }
    let columns = normalize_columns(schema, table, Some(paths))?;
    Ok(format!("GROUP BY {columns}"))
}

fn order_by(schema: &Schema, table: &str, params: &QueryParams) -> Result<String> {
    if params.order_by.is_empty() {
        return Ok(String::new());
    }
    let parts = params
        .order_by
        .iter()
        .map(|o| o.to_sql(schema, table))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("ORDER BY {}", parts.join(", ")))
}
