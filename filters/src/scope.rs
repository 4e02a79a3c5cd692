//! Queryable scope
//!
//! A [`Scope`] is an in-memory description of a query against one model's
//! table: the joins it needs, the predicates that narrow it (AND-ed), and an
//! optional limit/offset. Filters never execute anything; they take a scope
//! and return a narrower one. Rendering to SQL happens at the very end via
//! [`Scope::to_sql`].

use serde_json::Value;

use crate::schema::TableSchema;
use crate::sql::{SqlDialect, SqlParams, SqlWriter};

/// Left-hand side of a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Physical column qualified by its table
    Column { table: String, column: String },
    /// Raw expression declared through an alias
    Raw(String),
}

impl Operand {
    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Column {
            table: table.into(),
            column: column.into(),
        }
    }

    fn requalify(&mut self, renames: &[(String, String)]) {
        if let Self::Column { table, .. } = self {
            rename(table, renames);
        }
    }

    fn to_sql(&self) -> String {
        match self {
            Self::Column { table, column } => format!("{}.{}", table, column),
            Self::Raw(expression) => format!("({})", expression),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gte,
    Lte,
}

impl CompareOp {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }
}

/// One condition narrowing a scope
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        lhs: Operand,
        op: CompareOp,
        value: Value,
    },
    IsNull(Operand),
    /// Case-insensitive substring match
    Contains { lhs: Operand, needle: Value },
    /// Matches nothing
    Never,
    /// Primary-key membership in the rows of another scope
    InScope {
        lhs: Operand,
        scope: Box<Scope>,
        negated: bool,
    },
    /// Disjunction; an empty list matches nothing
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(lhs: Operand, op: CompareOp, value: Value) -> Self {
        Self::Compare { lhs, op, value }
    }

    // Subqueries select from their own tables and keep their qualifiers
    fn requalify(&mut self, renames: &[(String, String)]) {
        match self {
            Self::Compare { lhs, .. }
            | Self::IsNull(lhs)
            | Self::Contains { lhs, .. }
            | Self::InScope { lhs, .. } => lhs.requalify(renames),
            Self::Never => {}
            Self::Any(predicates) => {
                for predicate in predicates {
                    predicate.requalify(renames);
                }
            }
        }
    }

    fn to_sql(&self, writer: &mut SqlWriter<'_>) -> String {
        match self {
            Self::Compare { lhs, op, value } => {
                let placeholder = writer.bind(value.clone());
                format!("{} {} {}", lhs.to_sql(), op.as_sql(), placeholder)
            }
            Self::IsNull(lhs) => format!("{} IS NULL", lhs.to_sql()),
            Self::Contains { lhs, needle } => {
                let placeholder = writer.bind(needle.clone());
                writer.dialect().contains_ci(&lhs.to_sql(), &placeholder)
            }
            Self::Never => "1=0".to_string(),
            Self::InScope {
                lhs,
                scope,
                negated,
            } => {
                let subquery = scope.select_ids(writer, false);
                let keyword = if *negated { "NOT IN" } else { "IN" };
                format!("{} {} ({})", lhs.to_sql(), keyword, subquery)
            }
            Self::Any(predicates) => {
                if predicates.is_empty() {
                    return "1=0".to_string();
                }
                let parts: Vec<String> = predicates.iter().map(|p| p.to_sql(writer)).collect();
                format!("({})", parts.join(" OR "))
            }
        }
    }
}

/// LEFT join onto a related table under an alias
///
/// `left` and `right` are `(qualifier, column)` pairs; the joined side is
/// qualified by `alias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub table: String,
    pub alias: String,
    pub left: (String, String),
    pub right: (String, String),
}

impl Join {
    fn requalify(&mut self, renames: &[(String, String)]) {
        rename(&mut self.alias, renames);
        rename(&mut self.left.0, renames);
        rename(&mut self.right.0, renames);
    }

    fn to_sql(&self) -> String {
        let target = if self.alias == self.table {
            self.table.clone()
        } else {
            format!("{} AS {}", self.table, self.alias)
        };
        format!(
            "LEFT JOIN {} ON {}.{} = {}.{}",
            target, self.left.0, self.left.1, self.right.0, self.right.1
        )
    }
}

fn rename(qualifier: &mut String, renames: &[(String, String)]) {
    if let Some((_, to)) = renames.iter().find(|(from, _)| from == qualifier) {
        *qualifier = to.clone();
    }
}

/// Query description against one model's table
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    model: String,
    table: String,
    primary_key: String,
    joins: Vec<Join>,
    predicates: Vec<Predicate>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Scope {
    /// Unfiltered scope over every row of the schema's table
    pub fn new(schema: &TableSchema) -> Self {
        Self {
            model: schema.model().to_string(),
            table: schema.table().to_string(),
            primary_key: schema.primary_key().to_string(),
            joins: Vec::new(),
            predicates: Vec::new(),
            limit: None,
            offset: None,
        }
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

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// Whether the scope carries no condition, join or pagination
    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
            && self.joins.is_empty()
            && self.limit.is_none()
            && self.offset.is_none()
    }

    /// Fresh scope over the same table, dropping every condition
    pub fn unscoped(&self) -> Self {
        Self {
            model: self.model.clone(),
            table: self.table.clone(),
            primary_key: self.primary_key.clone(),
            joins: Vec::new(),
            predicates: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Qualified primary key of this scope's table
    pub fn identity(&self) -> Operand {
        Operand::column(self.table.clone(), self.primary_key.clone())
    }

    /// Keep rows whose primary key is among the rows of `other`
    pub fn where_in(self, other: Scope) -> Self {
        let lhs = self.identity();
        self.and_where(Predicate::InScope {
            lhs,
            scope: Box::new(other.except_limit_offset()),
            negated: false,
        })
    }

    /// Keep rows whose primary key is not among the rows of `other`
    pub fn where_not_in(self, other: Scope) -> Self {
        let lhs = self.identity();
        self.and_where(Predicate::InScope {
            lhs,
            scope: Box::new(other.except_limit_offset()),
            negated: true,
        })
    }

    pub fn except_limit_offset(mut self) -> Self {
        self.limit = None;
        self.offset = None;
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        if !self.joins.contains(&join) {
            self.joins.push(join);
        }
        self
    }

    /// Fold another scope's joins and conditions into this one
    ///
    /// A limit or offset set on `other` replaces this scope's.
    pub fn merge(mut self, other: Scope) -> Self {
        for join in other.joins {
            self = self.join(join);
        }
        self.predicates.extend(other.predicates);
        if other.limit.is_some() {
            self.limit = other.limit;
        }
        if other.offset.is_some() {
            self.offset = other.offset;
        }
        self
    }

    /// Join another table through `join` and fold in `related`'s conditions
    ///
    /// Columns of `related`'s own table are re-qualified by the join alias and
    /// its joins are nested under that alias as `{alias}_{join}`, so two joins
    /// onto the same table never collide. The limit and offset of `related`
    /// are ignored.
    pub fn merge_joined(self, join: Join, related: Scope) -> Self {
        let mut renames = vec![(related.table.clone(), join.alias.clone())];
        for nested in &related.joins {
            renames.push((nested.alias.clone(), format!("{}_{}", join.alias, nested.alias)));
        }

        let mut scope = self.join(join);
        for mut nested in related.joins {
            nested.requalify(&renames);
            scope = scope.join(nested);
        }
        for mut predicate in related.predicates {
            predicate.requalify(&renames);
            scope.predicates.push(predicate);
        }
        scope
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render `SELECT DISTINCT <pk> ...` with bound parameters
    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> (String, SqlParams) {
        let mut writer = SqlWriter::new(dialect);
        let sql = self.select_ids(&mut writer, true);
        (sql, writer.finish())
    }

    fn select_ids(&self, writer: &mut SqlWriter<'_>, outer: bool) -> String {
        let identity = self.identity().to_sql();
        let mut sql = if outer {
            format!("SELECT DISTINCT {} FROM {}", identity, self.table)
        } else {
            format!("SELECT {} FROM {}", identity, self.table)
        };

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }

        if !self.predicates.is_empty() {
            let conditions: Vec<String> =
                self.predicates.iter().map(|p| p.to_sql(writer)).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        if outer {
            sql.push_str(&format!(" ORDER BY {}", identity));
            if let Some(clause) = writer.dialect().limit_offset(self.limit, self.offset) {
                sql.push(' ');
                sql.push_str(&clause);
            }
        }

        sql
    }
}
