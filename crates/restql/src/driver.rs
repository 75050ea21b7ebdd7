//! The driver binds a schema to an executor and hands out table operations.

use std::sync::{Arc, PoisonError, RwLock};

use restql_core::{
    create_one_raw, find_one_raw, find_raw, remove_one_raw, remove_raw, update_one_raw, update_raw,
    CompileError, Item, QueryParams, Schema, ToSqlValue,
};
use tracing::{debug, info};

use crate::error::{DriverError, Result};
use crate::executor::{Executor, Row};

type SharedDatabase<E> = Arc<RwLock<Arc<E>>>;

/// Binds a [`Schema`] to a swappable executor.
///
/// # Example
///
/// ```ignore
/// use restql::{Driver, SqliteExecutor, SqliteOptions};
/// use restql_core::{Item, QueryParams};
///
/// let executor = SqliteExecutor::connect(&SqliteOptions::default()).await?;
/// let driver = Driver::new(schema, executor);
///
/// let users = driver.table("users");
/// users.create_one(&Item::new().set("name", "Yassi")).await?;
/// let rows = users.find(&QueryParams::new().order_by("-id")).await?;
/// ```
///
/// Swapping the executor with [`Driver::set_database`] affects every
/// [`TableOps`] already handed out. A statement that is in flight keeps the
/// executor it started with. Callers that need swap and use to be ordered
/// must serialize them themselves.
pub struct Driver<E> {
    schema: Arc<Schema>,
    database: SharedDatabase<E>,
}

impl<E> Clone for Driver<E> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            database: Arc::clone(&self.database),
        }
    }
}

impl<E: Executor> Driver<E> {
    /// Creates a driver over an executor.
    #[must_use]
    pub fn new(schema: Schema, database: E) -> Self {
        Self {
            schema: Arc::new(schema),
            database: Arc::new(RwLock::new(Arc::new(database))),
        }
    }

    /// Creates a driver whose executor is built by `factory`.
    #[must_use]
    pub fn with_factory<F>(schema: Schema, factory: F) -> Self
    where
        F: FnOnce() -> E,
    {
        Self::new(schema, factory())
    }

    /// Replaces the executor.
    pub fn set_database(&self, database: E) {
        info!("Swapping driver database");
        *self
            .database
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(database);
    }

    /// Returns the current executor.
    #[must_use]
    pub fn database(&self) -> Arc<E> {
        current(&self.database)
    }

    /// Returns the bound schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the operations for one table.
    #[must_use]
    pub fn table(&self, name: &str) -> TableOps<E> {
        TableOps {
            table: name.to_string(),
            schema: Arc::clone(&self.schema),
            database: Arc::clone(&self.database),
        }
    }
}

fn current<E>(database: &SharedDatabase<E>) -> Arc<E> {
    Arc::clone(&database.read().unwrap_or_else(PoisonError::into_inner))
}

/// CRUD operations for one table.
///
/// Every `*_raw` method only compiles SQL. The other methods compile, then
/// pass the statement to the driver's current executor and return its rows
/// unchanged.
pub struct TableOps<E> {
    table: String,
    schema: Arc<Schema>,
    database: SharedDatabase<E>,
}

impl<E> Clone for TableOps<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            schema: Arc::clone(&self.schema),
            database: Arc::clone(&self.database),
        }
    }
}

impl<E: Executor> TableOps<E> {
    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.table
    }

    /// Compiles a find without running it.
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of the matching statement builder.
    pub fn find_raw(&self, params: &QueryParams) -> std::result::Result<String, CompileError> {
        find_raw(&self.schema, &self.table, params)
    }

    /// Compiles a find by primary key without running it.
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of the matching statement builder.
    pub fn find_one_raw<K: ToSqlValue>(
        &self,
        key: K,
        params: &QueryParams,
    ) -> std::result::Result<String, CompileError> {
        find_one_raw(&self.schema, &self.table, key, params)
    }

    /// Compiles an insert without running it.
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of the matching statement builder.
    pub fn create_one_raw(&self, item: &Item) -> std::result::Result<String, CompileError> {
        create_one_raw(&self.schema, &self.table, item)
    }

    /// Compiles an update without running it.
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of the matching statement builder.
    pub fn update_raw(
        &self,
        item: &Item,
        params: &QueryParams,
    ) -> std::result::Result<String, CompileError> {
        update_raw(&self.schema, &self.table, item, params)
    }

    /// Compiles an update by primary key without running it.
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of the matching statement builder.
    pub fn update_one_raw<K: ToSqlValue>(
        &self,
        key: K,
        item: &Item,
        params: &QueryParams,
    ) -> std::result::Result<String, CompileError> {
        update_one_raw(&self.schema, &self.table, key, item, params)
    }

    /// Compiles a delete without running it.
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of the matching statement builder.
    pub fn remove_raw(&self, params: &QueryParams) -> std::result::Result<String, CompileError> {
        remove_raw(&self.schema, &self.table, params)
    }

    /// Compiles a delete by primary key without running it.
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of the matching statement builder.
    pub fn remove_one_raw<K: ToSqlValue>(
        &self,
        key: K,
        params: &QueryParams,
    ) -> std::result::Result<String, CompileError> {
        remove_one_raw(&self.schema, &self.table, key, params)
    }

    /// Runs a find and returns every row.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Compile`] when the request does not compile and
    /// [`DriverError::Database`] when the executor fails.
    pub async fn find(&self, params: &QueryParams) -> Result<Vec<Row>, E::Error> {
        self.execute(self.find_raw(params)?).await
    }

    /// Runs a find by primary key and returns the first row, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Compile`] when the request does not compile and
    /// [`DriverError::Database`] when the executor fails.
    pub async fn find_one<K: ToSqlValue + Send>(
        &self,
        key: K,
        params: &QueryParams,
    ) -> Result<Option<Row>, E::Error> {
        first(self.execute(self.find_one_raw(key, params)?).await)
    }

    /// Inserts one item.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Compile`] when the request does not compile and
    /// [`DriverError::Database`] when the executor fails.
    pub async fn create_one(&self, item: &Item) -> Result<Vec<Row>, E::Error> {
        self.execute(self.create_one_raw(item)?).await
    }

    /// Updates every row matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Compile`] when the request does not compile and
    /// [`DriverError::Database`] when the executor fails.
    pub async fn update(&self, item: &Item, params: &QueryParams) -> Result<Vec<Row>, E::Error> {
        self.execute(self.update_raw(item, params)?).await
    }

    /// Updates the row with the given primary key.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Compile`] when the request does not compile and
    /// [`DriverError::Database`] when the executor fails.
    pub async fn update_one<K: ToSqlValue + Send>(
        &self,
        key: K,
        item: &Item,
        params: &QueryParams,
    ) -> Result<Option<Row>, E::Error> {
        first(self.execute(self.update_one_raw(key, item, params)?).await)
    }

    /// Deletes every row matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Compile`] when the request does not compile and
    /// [`DriverError::Database`] when the executor fails.
    pub async fn remove(&self, params: &QueryParams) -> Result<Vec<Row>, E::Error> {
        self.execute(self.remove_raw(params)?).await
    }

    /// Deletes the row with the given primary key.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Compile`] when the request does not compile and
    /// [`DriverError::Database`] when the executor fails.
    pub async fn remove_one<K: ToSqlValue + Send>(
        &self,
        key: K,
        params: &QueryParams,
    ) -> Result<Option<Row>, E::Error> {
        first(self.execute(self.remove_one_raw(key, params)?).await)
    }

    async fn execute(&self, sql: String) -> Result<Vec<Row>, E::Error> {
        let database = current(&self.database);
        debug!(table = %self.table, sql = %sql, "Executing SQL");
        database.sql(&sql).await.map_err(DriverError::Database)
    }
}

fn first<E>(rows: Result<Vec<Row>, E>) -> Result<Option<Row>, E> {
    rows.map(|rows| rows.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use restql_core::{ColumnDef, Condition, DataType, FilterTree, TableSchema};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("rejected: {0}")]
    struct Rejected(String);

    /// Records statements and answers with canned rows.
    #[derive(Default)]
    struct Recorder {
        label: &'static str,
        statements: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Recorder {
        fn labelled(label: &'static str) -> Self {
            Self {
                label,
                ..Self::default()
            }
        }

        fn statements(&self) -> Vec<String> {
            self.statements.lock().unwrap().clone()
        }
    }

    impl Executor for Recorder {
        type Error = Rejected;

        async fn sql(&self, sql: &str) -> std::result::Result<Vec<Row>, Self::Error> {
            self.statements.lock().unwrap().push(sql.to_string());
            if self.fail {
                return Err(Rejected(sql.to_string()));
            }
            let row = json!({ "db": self.label, "n": 1 });
            let second = json!({ "db": self.label, "n": 2 });
            Ok(vec![
                row.as_object().cloned().unwrap(),
                second.as_object().cloned().unwrap(),
            ])
        }
    }

    fn schema() -> Schema {
        Schema::new()
            .table(
                TableSchema::new("users")
                    .column(ColumnDef::new("id", DataType::Int8).primary_key())
                    .column(ColumnDef::new("name", DataType::Text)),
            )
            .table(TableSchema::new("logs").column(ColumnDef::new("line", DataType::Text)))
    }

    #[test]
    fn test_raw_variants_do_not_execute() {
        let driver = Driver::new(schema(), Recorder::default());
        let users = driver.table("users");
        assert_eq!(users.name(), "users");
        assert_eq!(
            users.find_raw(&QueryParams::new()).unwrap(),
            "SELECT `users`.* FROM `users`"
        );
        assert_eq!(
            users.remove_one_raw(3, &QueryParams::new()).unwrap(),
            "DELETE FROM `users` WHERE `users`.`id` = 3"
        );
        assert!(driver.database().statements().is_empty());
    }

    #[tokio::test]
    async fn test_execute_forwards_sql_and_rows() {
        let driver = Driver::new(schema(), Recorder::labelled("a"));
        let users = driver.table("users");
        let params =
            QueryParams::new().filter(FilterTree::new().field("name", Condition::eq("Yassi")));

        let rows = users.find(&params).await.unwrap();
        assert_eq!(rows.len(), 2);
        let one = users.find_one(1, &QueryParams::new()).await.unwrap();
        assert_eq!(one.unwrap()["n"], json!(1));
        users
            .create_one(&Item::new().set("name", "Yassi"))
            .await
            .unwrap();

        assert_eq!(
            driver.database().statements(),
            vec![
                "SELECT `users`.* FROM `users` WHERE `users`.`name` = 'Yassi'",
                "SELECT `users`.* FROM `users` WHERE `users`.`id` = 1",
                "INSERT INTO `users` (`name`) VALUES ('Yassi')",
            ]
        );
    }

    #[tokio::test]
    async fn test_swap_reaches_existing_table_ops() {
        let driver = Driver::new(schema(), Recorder::labelled("a"));
        let users = driver.table("users");
        let before = users.find(&QueryParams::new()).await.unwrap();
        assert_eq!(before[0]["db"], json!("a"));

        driver.set_database(Recorder::labelled("b"));
        let after = users.remove(&QueryParams::new()).await.unwrap();
        assert_eq!(after[0]["db"], json!("b"));
        assert_eq!(driver.database().statements(), vec!["DELETE FROM `users`"]);
    }

    #[tokio::test]
    async fn test_table_ops_run_on_spawned_tasks() {
        let driver = Driver::new(schema(), Recorder::labelled("a"));
        let users = driver.table("users");
        let find = tokio::spawn(async move {
            let params = QueryParams::new().order_by("-id");
            users.find(&params).await
        });
        let users = driver.table("users");
        let remove = tokio::spawn(async move { users.remove_one(4_u64, &QueryParams::new()).await });

        let rows = find.await.unwrap().unwrap();
        assert_eq!(rows[0]["db"], json!("a"));
        assert_eq!(remove.await.unwrap().unwrap().unwrap()["n"], json!(1));

        let mut statements = driver.database().statements();
        statements.sort();
        assert_eq!(
            statements,
            vec![
                "DELETE FROM `users` WHERE `users`.`id` = 4",
                "SELECT `users`.* FROM `users` ORDER BY `users`.`id` DESC",
            ]
        );
    }

    #[tokio::test]
    async fn test_database_errors_pass_through() {
        let driver = Driver::with_factory(schema(), || Recorder {
            fail: true,
            ..Recorder::default()
        });
        let err = driver
            .table("users")
            .update_one(5, &Item::new().set("name", "x"), &QueryParams::new())
            .await
            .unwrap_err();
        match err {
            DriverError::Database(Rejected(sql)) => {
                assert_eq!(sql, "UPDATE `users` SET `name` = 'x' WHERE `users`.`id` = 5");
            }
            DriverError::Compile(e) => panic!("unexpected compile error: {e}"),
        }
    }

    #[tokio::test]
    async fn test_compile_errors_skip_the_executor() {
        let driver = Driver::new(schema(), Recorder::default());
        let err = driver
            .table("logs")
            .remove_one(1, &QueryParams::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::Compile(CompileError::MissingPrimaryKey { .. })
        ));
        assert!(err.as_database().is_none());
        assert!(driver.database().statements().is_empty());
    }
}
