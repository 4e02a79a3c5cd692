//! SQLite SQL dialect implementation

use super::SqlDialect;

/// SQLite SQL dialect
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn contains_ci(&self, expr: &str, placeholder: &str) -> String {
        // SQLite has no position(); instr is 1-based and 0 when absent
        format!("instr(lower({}), lower({})) > 0", expr, placeholder)
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (Some(limit), Some(offset)) => Some(format!("LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => Some(format!("LIMIT {}", limit)),
            // SQLite requires LIMIT before OFFSET
            (None, Some(offset)) => Some(format!("LIMIT -1 OFFSET {}", offset)),
            (None, None) => None,
        }
    }
}
