//! Execution against a live database
//!
//! Scopes are backend-neutral descriptions; a store renders them with its
//! dialect, binds the parameters and returns the matched primary keys. The
//! SQLite store can also derive a [`TableSchema`](crate::schema::TableSchema)
//! from the live table so declared column types never drift from the schema.

mod sqlite;

use thiserror::Error;

use crate::error::FilterError;

pub use sqlite::SqliteStore;
#[cfg(test)]
pub(crate) use sqlite::bind_value;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Table {0} not found")]
    TableNotFound(String),
}
