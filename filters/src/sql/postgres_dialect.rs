//! PostgreSQL SQL dialect implementation

use super::SqlDialect;

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn contains_ci(&self, expr: &str, placeholder: &str) -> String {
        format!("position(lower({}) IN lower({})) > 0", placeholder, expr)
    }
}
