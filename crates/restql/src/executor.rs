//! SQL executors.
//!
//! An [`Executor`] takes one complete SQL statement and returns the rows it
//! produced as JSON objects. The driver never inspects the statement after
//! handing it over.

use std::future::Future;

use serde::Deserialize;
use serde_json::{Map, Number, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use tracing::info;

/// A result row, keyed by column name in result order.
pub type Row = Map<String, Value>;

/// Runs raw SQL statements.
///
/// Executors are shared between tasks, so both the executor and the futures
/// it returns must be `Send`. Implementations may use `async fn`.
pub trait Executor: Send + Sync {
    /// Error raised by the underlying database.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Executes one statement and returns its rows.
    ///
    /// # Errors
    ///
    /// Returns the database's own error when the statement fails.
    fn sql(&self, sql: &str) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send;
}

/// Connection settings for [`SqliteExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SqliteOptions {
    /// Database URL, e.g. `sqlite://data.db` or `sqlite::memory:`.
    pub url: String,
    /// Maximum pool size.
    pub max_connections: u32,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
        }
    }
}

/// Executor backed by a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool with the given options.
    ///
    /// # Errors
    ///
    /// Returns the sqlx error when the pool cannot connect.
    pub async fn connect(options: &SqliteOptions) -> Result<Self, sqlx::Error> {
        info!(
            url = %options.url,
            max_connections = options.max_connections,
            "Connecting to SQLite"
        );
        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .connect(&options.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl Executor for SqliteExecutor {
    type Error = sqlx::Error;

    async fn sql(&self, sql: &str) -> Result<Vec<Row>, Self::Error> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_json).collect()
    }
}

fn row_to_json(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut map = Map::new();
    for column in row.columns() {
        let index = column.ordinal();
        map.insert(column.name().to_string(), column_to_json(row, index)?);
    }
    Ok(map)
}

/// Decodes one value by its storage class.
fn column_to_json(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_ascii_uppercase();
    Ok(match storage.as_str() {
        "INTEGER" | "BIGINT" | "INT8" => Value::from(row.try_get_unchecked::<i64, _>(index)?),
        "BOOLEAN" => Value::from(row.try_get_unchecked::<bool, _>(index)?),
        "REAL" | "FLOAT" | "DOUBLE" => {
            Number::from_f64(row.try_get_unchecked::<f64, _>(index)?).map_or(Value::Null, Value::Number)
        }
        "BLOB" => Value::from(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        _ => Value::from(row.try_get_unchecked::<String, _>(index)?),
    })
}
