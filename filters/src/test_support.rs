//! Shared fixtures for database-backed tests

use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::store::bind_value;

const SCHEMA: &[&str] = &[
    "CREATE TABLE filterable_friends (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        friends_attr VARCHAR(255)
    )",
    "CREATE TABLE filterables (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filterable_friend_id INTEGER,
        other_friend_id INTEGER,
        filterable_string VARCHAR(255),
        filterable_integer INTEGER,
        filterable_datetime DATETIME,
        filterable_date DATE,
        first_name VARCHAR(255),
        last_name VARCHAR(255),
        payload BLOB
    )",
];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("has_filters=debug")
        .with_test_writer()
        .try_init();
}

/// In-memory database on a single connection so every query sees the schema
pub async fn setup_pool() -> SqlitePool {
    init_tracing();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool
}

/// Insert one row and return its id
pub async fn insert(pool: &SqlitePool, table: &str, values: &[(&str, Value)]) -> i64 {
    if values.is_empty() {
        let sql = format!("INSERT INTO {} DEFAULT VALUES", table);
        return sqlx::query(&sql)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
    }

    let columns: Vec<&str> = values.iter().map(|(column, _)| *column).collect();
    let placeholders = vec!["?"; values.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for (_, value) in values {
        query = bind_value(query, value.clone());
    }
    query.execute(pool).await.unwrap().last_insert_rowid()
}
