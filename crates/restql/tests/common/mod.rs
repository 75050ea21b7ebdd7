#![allow(dead_code)]

use restql::{Driver, Executor, Schema, SqliteExecutor};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;

pub fn world() -> Schema {
    Schema::from_json(json!({
        "countries": {
            "columns": {
                "id": { "type": "text", "primaryKey": true },
                "name": { "type": "text" },
                "region": { "type": "text" }
            },
            "relations": {
                "region": { "table": "regions", "fromKey": "region", "toKey": "id" },
                "cities": { "table": "cities", "fromKey": "id", "toKey": "country" }
            }
        },
        "regions": {
            "columns": {
                "id": { "type": "text", "primaryKey": true },
                "name": { "type": "text" }
            }
        },
        "cities": {
            "columns": {
                "id": { "type": "int8", "primaryKey": true },
                "name": { "type": "text" },
                "country": { "type": "text" }
            }
        },
        "users": {
            "columns": {
                "id": { "type": "int8", "primaryKey": true },
                "name": { "type": "varchar", "unique": true },
                "active": { "type": "boolean", "default": true }
            }
        }
    }))
    .unwrap_or_else(|e| panic!("fixture schema must decode: {e}"))
}

const SETUP: &[&str] = &[
    "CREATE TABLE `regions` (`id` TEXT PRIMARY KEY, `name` TEXT)",
    "CREATE TABLE `countries` (`id` TEXT PRIMARY KEY, `name` TEXT, `region` TEXT)",
    "CREATE TABLE `cities` (`id` INTEGER PRIMARY KEY, `name` TEXT, `country` TEXT)",
    "CREATE TABLE `users` (`id` INTEGER PRIMARY KEY AUTOINCREMENT, `name` TEXT UNIQUE, `active` INTEGER DEFAULT 1)",
    "INSERT INTO `regions` (`id`, `name`) VALUES ('r-asia', 'Asia'), ('r-europe', 'Europe')",
    "INSERT INTO `countries` (`id`, `name`, `region`) VALUES ('c-jp', 'Japan', 'r-asia'), ('c-no', 'Norway', 'r-europe'), ('c-in', 'India', 'r-asia')",
    "INSERT INTO `cities` (`id`, `name`, `country`) VALUES (1, 'Osaka', 'c-jp'), (2, 'Oslo', 'c-no'), (3, 'Tokyo', 'c-jp')",
];

pub async fn create_test_executor() -> SqliteExecutor {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    let executor = SqliteExecutor::new(pool);
    for sql in SETUP {
        executor
            .sql(sql)
            .await
            .unwrap_or_else(|e| panic!("setup failed for {sql}: {e}"));
    }
    executor
}

pub async fn create_test_driver() -> Driver<SqliteExecutor> {
    Driver::new(world(), create_test_executor().await)
}
