//! DuckDB SQL dialect implementation

use super::SqlDialect;

/// DuckDB SQL dialect
pub struct DuckdbDialect;

impl SqlDialect for DuckdbDialect {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn contains_ci(&self, expr: &str, placeholder: &str) -> String {
        format!("contains(lower({}), lower({}))", expr, placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_ci() {
        let dialect = DuckdbDialect;
        assert_eq!(
            dialect.contains_ci("t.name", "?"),
            "contains(lower(t.name), lower(?))"
        );
    }
}
