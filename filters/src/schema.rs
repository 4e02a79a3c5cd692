//! Table schema and column type lookup
//!
//! Operators check their operand against the declared type of the target
//! column. Types come from a [`ColumnTypeLookup`]; [`TableSchema`] is the
//! default implementation and can be built by hand or introspected from a
//! store.

use std::fmt;
use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Closed set of column types the operators know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Text,
    Integer,
    Float,
    Date,
    Datetime,
    Boolean,
}

impl ColumnType {
    pub const ALL: &'static [ColumnType] = &[
        ColumnType::String,
        ColumnType::Integer,
        ColumnType::Date,
        ColumnType::Datetime,
        ColumnType::Float,
        ColumnType::Boolean,
        ColumnType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Boolean => "boolean",
        }
    }

    /// Map a declared SQL type (as written in DDL) to a column type
    ///
    /// Follows SQLite affinity rules loosely. Returns `None` for declarations
    /// that do not map onto the closed set (blobs, JSON, untyped columns).
    pub fn from_sql_decl(decl: &str) -> Option<Self> {
        let decl = decl.trim().to_ascii_uppercase();
        if decl.is_empty() {
            return None;
        }
        if decl.contains("DATETIME") || decl.contains("TIMESTAMP") {
            return Some(Self::Datetime);
        }
        if decl.contains("DATE") {
            return Some(Self::Date);
        }
        if decl.contains("BOOL") {
            return Some(Self::Boolean);
        }
        if decl.contains("INT") {
            return Some(Self::Integer);
        }
        if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("STRING") {
            return Some(Self::String);
        }
        if decl.contains("TEXT") {
            return Some(Self::Text);
        }
        if decl.contains("REAL")
            || decl.contains("FLOA")
            || decl.contains("DOUB")
            || decl.contains("NUMERIC")
            || decl.contains("DECIMAL")
        {
            return Some(Self::Float);
        }
        None
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Text)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provides the declared type of a model attribute
pub trait ColumnTypeLookup: Send + Sync {
    fn column_type(&self, model: &str, attr: &str) -> Option<ColumnType>;
}

/// Check that a name is safe to splice into SQL as an identifier
pub fn is_identifier(name: &str) -> bool {
    static RE_IDENT: OnceLock<regex::Regex> = OnceLock::new();
    let re = RE_IDENT
        .get_or_init(|| regex::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex"));
    re.is_match(name)
}

pub(crate) fn ensure_identifier(kind: &str, name: &str) -> Result<(), FilterError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(FilterError::invalid_filter(format!(
            "Invalid {} name: {:?}",
            kind, name
        )))
    }
}

/// Physical layout of one model's table
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    model: String,
    table: String,
    primary_key: String,
    columns: FxHashMap<String, ColumnType>,
}

impl TableSchema {
    /// Create a schema with an integer primary key named `id`
    pub fn new(model: impl Into<String>, table: impl Into<String>) -> Self {
        Self::with_primary_key(model, table, "id")
    }

    pub fn with_primary_key(
        model: impl Into<String>,
        table: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        let primary_key = primary_key.into();
        let mut columns = FxHashMap::default();
        columns.insert(primary_key.clone(), ColumnType::Integer);
        Self {
            model: model.into(),
            table: table.into(),
            primary_key,
            columns,
        }
    }

    /// Declare a column (builder style)
    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.insert(name.into(), column_type);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<ColumnType> {
        self.columns.get(name).copied()
    }

    /// Validate table, primary key and column names as SQL identifiers
    pub fn validate(&self) -> Result<(), FilterError> {
        ensure_identifier("table", &self.table)?;
        ensure_identifier("primary key", &self.primary_key)?;
        for name in self.columns.keys() {
            ensure_identifier("column", name)?;
        }
        Ok(())
    }
}

impl ColumnTypeLookup for TableSchema {
    fn column_type(&self, model: &str, attr: &str) -> Option<ColumnType> {
        if model != self.model {
            return None;
        }
        self.get(attr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sql_decl() {
        assert_eq!(ColumnType::from_sql_decl("INTEGER"), Some(ColumnType::Integer));
        assert_eq!(ColumnType::from_sql_decl("bigint"), Some(ColumnType::Integer));
        assert_eq!(ColumnType::from_sql_decl("varchar(255)"), Some(ColumnType::String));
        assert_eq!(ColumnType::from_sql_decl("TEXT"), Some(ColumnType::Text));
        assert_eq!(ColumnType::from_sql_decl("datetime"), Some(ColumnType::Datetime));
        assert_eq!(ColumnType::from_sql_decl("TIMESTAMP"), Some(ColumnType::Datetime));
        assert_eq!(ColumnType::from_sql_decl("date"), Some(ColumnType::Date));
        assert_eq!(ColumnType::from_sql_decl("REAL"), Some(ColumnType::Float));
        assert_eq!(ColumnType::from_sql_decl("boolean"), Some(ColumnType::Boolean));
        assert_eq!(ColumnType::from_sql_decl("BLOB"), None);
        assert_eq!(ColumnType::from_sql_decl(""), None);
    }

    #[test]
    fn test_schema_lookup() {
        let schema = TableSchema::new("Filterable", "filterables")
            .column("filterable_string", ColumnType::String)
            .column("filterable_integer", ColumnType::Integer);

        assert_eq!(
            schema.column_type("Filterable", "filterable_string"),
            Some(ColumnType::String)
        );
        assert_eq!(schema.column_type("Filterable", "id"), Some(ColumnType::Integer));
        assert_eq!(schema.column_type("Filterable", "missing"), None);
        assert_eq!(schema.column_type("Other", "filterable_string"), None);
    }

    #[test]
    fn test_identifier_validation() {
        assert!(is_identifier("filterable_string"));
        assert!(is_identifier("_private"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("name; DROP TABLE x"));
        assert!(!is_identifier(""));

        let bad = TableSchema::new("Bad", "bad table");
        assert!(matches!(bad.validate(), Err(FilterError::InvalidFilter(_))));
    }
}
