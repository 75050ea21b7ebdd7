//! Strict request validation.
//!
//! The compiler resolves field paths leniently. These checks are the strict
//! counterpart for callers that want unknown relations and columns rejected
//! before any SQL is built.

use crate::error::{Result, SchemaError};
use crate::request::{Item, QueryParams};
use crate::schema::Schema;

/// Checks that one field path only walks declared relations and ends in a
/// declared column or `*`.
///
/// # Errors
///
/// Returns [`SchemaError::UnknownRelation`] for a hop that is not a
/// declared relation and [`SchemaError::UnknownColumn`] for a terminal
/// segment that is neither a column nor `*`.
pub fn validate_path(schema: &Schema, table: &str, path: &str) -> Result<()> {
    let mut current = schema.require_table(table)?;
    let segments: Vec<&str> = path.split('.').collect();
    let Some((terminal, hops)) = segments.split_last() else {
        return Ok(());
    };

    for segment in hops {
        let relation = current
            .get_relation(segment)
            .ok_or_else(|| SchemaError::UnknownRelation {
                table: current.name.clone(),
                relation: (*segment).to_string(),
            })?;
        current = schema.require_table(&relation.table)?;
    }

    if *terminal != "*" && current.get_column(terminal).is_none() {
        return Err(SchemaError::UnknownColumn {
            table: current.name.clone(),
            column: (*terminal).to_string(),
        }
        .into());
    }
    Ok(())
}

/// Checks every field path of a request: columns, filter fields, grouping
/// and ordering.
///
/// # Errors
///
/// Returns the first error of [`validate_path`] over the request's paths.
pub fn validate_params(schema: &Schema, table: &str, params: &QueryParams) -> Result<()> {
    schema.require_table(table)?;
    params
        .field_paths()
        .into_iter()
        .try_for_each(|path| validate_path(schema, table, path))
}

/// Checks that every column of an item is declared on `table`.
///
/// # Errors
///
/// Returns [`SchemaError::UnknownColumn`] for the first undeclared column.
pub fn validate_item(schema: &Schema, table: &str, item: &Item) -> Result<()> {
    let table_schema = schema.require_table(table)?;
    for column in item.columns() {
        if table_schema.get_column(column).is_none() {
            return Err(SchemaError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            }
            .into());
        }
    }
    Ok(())
}
