//! # restql
//!
//! Table-generic CRUD on top of [`restql_core`].
//!
//! This crate provides:
//! - `Driver` which binds a schema to a swappable executor
//! - `TableOps` with `find`, `find_one`, `create_one`, `update`,
//!   `update_one`, `remove` and `remove_one`, each with a `*_raw` twin that
//!   only compiles SQL
//! - the `Executor` trait and a SQLite implementation over `sqlx`
//!
//! ## Quick Start
//!
//! ```ignore
//! use restql::{Driver, Item, QueryParams, Schema, SqliteExecutor, SqliteOptions};
//!
//! async fn example(schema: Schema) -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = SqliteExecutor::connect(&SqliteOptions::default()).await?;
//!     let driver = Driver::new(schema, executor);
//!     let countries = driver.table("countries");
//!
//!     let sql = countries.find_raw(&QueryParams::new().columns(&["name", "region.name"]))?;
//!     println!("{sql}");
//!
//!     let rows = countries.find(&QueryParams::new().order_by("-name").limit(10)).await?;
//!     let one = countries.find_one("c-1", &QueryParams::new()).await?;
//!     Ok(())
//! }
//! ```

mod driver;
mod error;
mod executor;

pub use driver::{Driver, TableOps};
pub use error::{DriverError, Result};
pub use executor::{Executor, Row, SqliteExecutor, SqliteOptions};

// Re-export the request and schema types callers need alongside the driver
pub use restql_core::{
    CompileError, Condition, FilterTree, Item, QueryParams, Schema, SchemaError, SqlValue,
    ToSqlValue,
};
