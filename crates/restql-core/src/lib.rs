//! # restql-core
//!
//! A schema-aware SQL statement compiler.
//!
//! Given a declared schema of tables, columns and relations, this crate turns
//! structured requests into single SQL statements:
//! - dotted field paths (`region.planet.name`) become qualified columns plus
//!   the `INNER JOIN`s needed to reach them
//! - nested filter trees with `$and` / `$or` become a WHERE body
//! - find, find-one, create-one, update, update-one, remove and remove-one
//!   statements are assembled in a fixed clause order
//!
//! Compilation is pure and synchronous. Nothing here touches a database.
//!
//! ## Quick Start
//!
//! ```rust
//! use restql_core::{find_raw, ColumnDef, DataType, QueryParams, RelationDef, Schema, TableSchema};
//!
//! let schema = Schema::new()
//!     .table(
//!         TableSchema::new("countries")
//!             .column(ColumnDef::new("id", DataType::Uuid).primary_key())
//!             .column(ColumnDef::new("name", DataType::Text))
//!             .column(ColumnDef::new("region", DataType::Uuid))
//!             .relation(RelationDef::new("region", "regions", "region", "id")),
//!     )
//!     .table(
//!         TableSchema::new("regions")
//!             .column(ColumnDef::new("id", DataType::Uuid).primary_key())
//!             .column(ColumnDef::new("name", DataType::Text)),
//!     );
//!
//! let params = QueryParams::new().columns(&["name", "region.name"]).limit(5);
//! let sql = find_raw(&schema, "countries", &params).unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT `countries`.`name`, `regions`.`name` FROM `countries` \
//!      INNER JOIN `regions` ON `regions`.`id` = `countries`.`region` LIMIT 5"
//! );
//! ```
//!
//! ## Literals
//!
//! String literals are wrapped in single quotes and identifiers in backticks
//! without escaping embedded quote characters. Do not feed untrusted input
//! into identifiers or text values.

mod error;
mod filter;
mod ident;
mod join;
mod path;
mod request;
mod schema;
mod statement;
mod validate;
mod value;

pub use error::{CompileError, Result, SchemaError};
pub use filter::{compile_filter, Condition, FieldFilter, FilterNode, FilterTree};
pub use ident::{qualify, quote_identifier, IDENTIFIER_QUOTE};
pub use join::{collect_joins, render_joins};
pub use path::{normalize_column, normalize_columns, resolve_path, JoinClause, ResolvedPath};
pub use request::{Item, OrderBy, OrderDirection, QueryParams};
pub use schema::{ColumnDef, DataType, RelationDef, Schema, TableSchema};
pub use statement::{
    create_one_raw, find_one_raw, find_raw, remove_one_raw, remove_raw, update_one_raw, update_raw,
};
pub use validate::{validate_item, validate_params, validate_path};
pub use value::{format_literal, SqlValue, ToSqlValue};
