//! Relation path resolution.
//!
//! A field path such as `region.planet.name` walks relations from a root
//! table: every segment but the last names a relation on the table reached so
//! far, and the last segment names a column on the final table. Resolution is
//! lenient. The walk stops at the first segment that is not a declared
//! relation and the path degrades to the last segment as a column on the
//! last table that was reached.

use std::fmt;

use tracing::warn;

use crate::error::Result;
use crate::ident::{qualify, quote_identifier};
use crate::schema::Schema;

/// One relation hop, rendered as an `INNER JOIN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinClause {
    /// Table the hop starts from.
    pub from_table: String,
    /// Column on `from_table`.
    pub from_key: String,
    /// Table the hop leads to.
    pub to_table: String,
    /// Column on `to_table`.
    pub to_key: String,
}

impl fmt::Display for JoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INNER JOIN {} ON {} = {}",
            quote_identifier(&self.to_table),
            qualify(&self.to_table, &self.to_key),
            qualify(&self.from_table, &self.from_key),
        )
    }
}

/// Result of resolving a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Table the terminal column lives on.
    pub table: String,
    /// Unquoted terminal column name (`*` for the wildcard).
    pub column: String,
    /// Relation hops, in path order.
    pub joins: Vec<JoinClause>,
}

impl ResolvedPath {
    /// Returns the qualified, quoted column reference.
    #[must_use]
    pub fn qualified(&self) -> String {
        qualify(&self.table, &self.column)
    }
}

/// Resolves a dotted field path against `table`.
///
/// Fails only when a table reached by the walk is not declared.
///
/// # Errors
///
/// Returns a schema error when `table`, or a table reached through a
/// relation, is not declared. Unknown relation segments are not errors.
pub fn resolve_path(schema: &Schema, table: &str, path: &str) -> Result<ResolvedPath> {
    let mut current = schema.require_table(table)?;
    let segments: Vec<&str> = path.split('.').collect();
    let (terminal, hops) = segments
        .split_last()
        .map_or(("", &[][..]), |(last, rest)| (*last, rest));

    let mut joins = Vec::new();
    let mut column = terminal;
    for segment in hops {
        if *segment == "*" {
            column = "*";
            break;
        }
        let Some(relation) = current.get_relation(segment) else {
            warn!(
                table = %current.name,
                path = %path,
                segment = %segment,
                "Unknown relation in field path, using plain column"
            );
            break;
        };
        joins.push(JoinClause {
            from_table: current.name.clone(),
            from_key: relation.from_key.clone(),
            to_table: relation.table.clone(),
            to_key: relation.to_key.clone(),
        });
        current = schema.require_table(&relation.table)?;
    }

    Ok(ResolvedPath {
        table: current.name.clone(),
        column: column.to_string(),
        joins,
    })
}

/// Returns the qualified column reference for a field path.
///
/// # Errors
///
/// Same as [`resolve_path`].
pub fn normalize_column(schema: &Schema, table: &str, path: &str) -> Result<String> {
    Ok(resolve_path(schema, table, path)?.qualified())
}

/// Returns the comma-separated qualified columns, defaulting to
/// `` `table`.* `` when no columns are given.
///
/// # Errors
///
/// Same as [`resolve_path`], for each column.
pub fn normalize_columns(schema: &Schema, table: &str, columns: Option<&[String]>) -> Result<String> {
    match columns {
        Some(columns) if !columns.is_empty() => Ok(columns
            .iter()
            .map(|c| normalize_column(schema, table, c))
            .collect::<Result<Vec<_>>>()?
            .join(", ")),
        _ => {
            schema.require_table(table)?;
            Ok(qualify(table, "*"))
        }
    }
}
