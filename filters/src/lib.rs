//! Declarative filtering for relational models
//!
//! Callers send nested rule trees (`column` / `operator` / `param` leaves,
//! `rules` + `conjunction` groups, allow-listed named scopes); a registered
//! filter surface turns them into a narrowed [`Scope`] that renders to
//! parameterized SQL.
//!
//! - `schema` - Column types and table layout
//! - `scope` - Query descriptions and SQL rendering
//! - `sql` - Dialects for SQLite, PostgreSQL and DuckDB
//! - `operators` - Exact, containment, range, greater and lesser matching
//! - `rules` - Rule tree types and parsing
//! - `surface` - Per-model filter registration, composition and associations
//! - `catalog` - Registry of surfaces keyed by model
//! - `store` - Executing scopes against SQLite
//! - `core` - Configuration and constants
//! - `error` - Filter error type

pub mod catalog;
pub mod core;
pub mod error;
pub mod operators;
pub mod rules;
pub mod schema;
pub mod scope;
pub mod sql;
pub mod store;
pub mod surface;

#[cfg(test)]
mod test_support;

pub use catalog::Catalog;
pub use crate::core::FilterConfig;
pub use error::FilterError;
pub use rules::{Conjunction, FilterArgs, Rule};
pub use schema::{ColumnType, TableSchema};
pub use scope::Scope;
pub use store::{SqliteStore, StoreError};
pub use surface::{FilterSurface, FilterSurfaceBuilder};
