use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Row, Sqlite, SqlitePool};

use crate::schema::{ColumnType, TableSchema, ensure_identifier};
use crate::scope::Scope;
use crate::sql::SqliteDialect;

use super::StoreError;

/// Runs scopes against a SQLite database
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Primary keys of every row the scope matches, ascending
    pub async fn fetch_ids(&self, scope: &Scope) -> Result<Vec<i64>, StoreError> {
        let (sql, params) = scope.to_sql(&SqliteDialect);
        tracing::trace!(model = scope.model(), sql = %sql, params = params.values.len(), "Executing scope");

        let mut query = sqlx::query(&sql);
        for value in params.values {
            query = bind_value(query, value);
        }

        let rows = query.fetch_all(&self.pool).await?;
        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>(0))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(model = scope.model(), matched = ids.len(), "Scope executed");
        Ok(ids)
    }

    pub async fn count(&self, scope: &Scope) -> Result<usize, StoreError> {
        Ok(self.fetch_ids(scope).await?.len())
    }

    /// Build a schema from the live table definition
    ///
    /// Columns whose declared type maps to no filterable type are skipped.
    pub async fn introspect(
        &self,
        model: &str,
        table: &str,
        primary_key: &str,
    ) -> Result<TableSchema, StoreError> {
        ensure_identifier("table", table)?;
        ensure_identifier("primary key", primary_key)?;

        let rows = sqlx::query(&format!("PRAGMA table_info({})", table))
            .fetch_all(&self.pool)
            .await?;
        if rows.is_empty() {
            return Err(StoreError::TableNotFound(table.to_string()));
        }

        let mut schema = TableSchema::with_primary_key(model, table, primary_key);
        for row in &rows {
            let name: String = row.try_get("name")?;
            let declared: String = row.try_get("type")?;
            match ColumnType::from_sql_decl(&declared) {
                Some(column_type) => schema = schema.column(name, column_type),
                None => {
                    tracing::warn!(table, column = %name, declared = %declared, "Skipping column with unknown type");
                }
            }
        }

        tracing::debug!(model, table, columns = rows.len(), "Introspected table");
        Ok(schema)
    }
}

pub(crate) fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s),
        other => query.bind(other.to_string()),
    }
}
