//! SQL dialect trait for multi-database support
//!
//! This trait defines the interface for generating database-specific SQL syntax.

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - Case-insensitive substring search
/// - Limit/offset clauses
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite/DuckDB: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Generate SQL testing whether `expr` contains the bound needle, ignoring case
    ///
    /// - SQLite: `instr(lower(expr), lower(?)) > 0`
    /// - PostgreSQL: `position(lower($1) IN lower(expr)) > 0`
    /// - DuckDB: `contains(lower(expr), lower(?))`
    fn contains_ci(&self, expr: &str, placeholder: &str) -> String;

    /// Generate LIMIT/OFFSET clause
    ///
    /// Returns `None` when neither is set.
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (Some(limit), Some(offset)) => Some(format!("LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => Some(format!("LIMIT {}", limit)),
            (None, Some(offset)) => Some(format!("OFFSET {}", offset)),
            (None, None) => None,
        }
    }
}
