//! SQL abstraction layer for multi-database support
//!
//! This module provides abstractions for rendering compiled scopes as SQL
//! that works across different database backends (SQLite, PostgreSQL, DuckDB).

mod dialect;
mod duckdb_dialect;
mod postgres_dialect;
mod sqlite_dialect;

use std::str::FromStr;

use serde_json::Value;

pub use dialect::SqlDialect;
pub use duckdb_dialect::DuckdbDialect;
pub use postgres_dialect::PostgresDialect;
pub use sqlite_dialect::SqliteDialect;

/// Database backend identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
    Duckdb,
}

impl Backend {
    /// Get the SQL dialect for this backend
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Backend::Sqlite => &SqliteDialect,
            Backend::Postgres => &PostgresDialect,
            Backend::Duckdb => &DuckdbDialect,
        }
    }

    /// Get the backend name
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
            Backend::Duckdb => "duckdb",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "duckdb" => Ok(Backend::Duckdb),
            other => Err(format!("Unknown backend: {}", other)),
        }
    }
}

/// Collects SQL parameters during query building (maintains insertion order)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SqlParams {
    pub values: Vec<Value>,
}

/// Renders SQL fragments, binding every operand as a parameter
pub struct SqlWriter<'d> {
    dialect: &'d dyn SqlDialect,
    params: SqlParams,
}

impl<'d> SqlWriter<'d> {
    pub fn new(dialect: &'d dyn SqlDialect) -> Self {
        Self {
            dialect,
            params: SqlParams::default(),
        }
    }

    pub fn dialect(&self) -> &'d dyn SqlDialect {
        self.dialect
    }

    /// Push a value and return its placeholder
    pub fn bind(&mut self, value: Value) -> String {
        self.params.values.push(value);
        self.dialect.placeholder(self.params.values.len())
    }

    pub fn finish(self) -> SqlParams {
        self.params
    }
}
