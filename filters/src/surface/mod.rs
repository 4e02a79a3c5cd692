//! Per-model filter surface
//!
//! A [`FilterSurface`] is the immutable, compiled registration of what one
//! model can be filtered by: physical columns, aliases (virtual columns),
//! association-derived filters and allow-listed named scopes. Every filter is
//! stored under its `by_{name}` key at registration, so resolving a rule is a
//! map lookup.
//!
//! ```
//! use has_filters::rules::Conjunction;
//! use has_filters::schema::{ColumnType, TableSchema};
//! use has_filters::sql::Backend;
//! use has_filters::surface::FilterSurface;
//! use serde_json::json;
//!
//! let schema = TableSchema::new("Order", "orders").column("amount", ColumnType::Integer);
//! let orders = FilterSurface::builder(schema).attr("amount").build().unwrap();
//!
//! let rules = json!([{"column": "amount", "operator": "more_than", "param": 5}]);
//! let scope = orders.filter(&orders.all(), &rules, Conjunction::Exclusive).unwrap();
//! let (sql, _params) = scope.to_sql(Backend::Sqlite.dialect());
//! assert!(sql.contains("orders.amount >= ?"));
//! ```

mod association;
mod builder;
mod compose;


use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::config::FilterConfig;
use crate::error::FilterError;
use crate::operators::{Attr, derive_query};
use crate::rules::{FilterArgs, ScopeArgs};
use crate::schema::{ColumnTypeLookup, TableSchema};
use crate::scope::Scope;

pub use association::{Association, AssociationKind};
pub use builder::FilterSurfaceBuilder;
pub use compose::Resolution;

/// Callable behind a named scope
pub type NamedScope = Arc<dyn Fn(Scope, &ScopeArgs) -> Result<Scope, FilterError> + Send + Sync>;

#[derive(Debug, Clone)]
enum FilterHandler {
    Column(String),
    Virtual(String),
    /// Delegates to the related surface; `None` matches the related primary key
    Association {
        index: usize,
        target: Option<String>,
    },
}

#[derive(Clone)]
enum ScopeHandler {
    Named(NamedScope),
    Association { index: usize, scope: String },
}

/// Compiled filter registration of one model
pub struct FilterSurface {
    schema: Arc<TableSchema>,
    types: Arc<dyn ColumnTypeLookup>,
    config: FilterConfig,
    filterable_attrs: Vec<String>,
    allowed_scopes: Vec<String>,
    aliases: Vec<(String, String)>,
    associations: Vec<Association>,
    filters: FxHashMap<String, FilterHandler>,
    scopes: FxHashMap<String, ScopeHandler>,
}

impl FilterSurface {
    pub fn builder(schema: TableSchema) -> FilterSurfaceBuilder {
        FilterSurfaceBuilder::new(schema)
    }

    pub fn model(&self) -> &str {
        self.schema.model()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Physical and virtual attribute names, in registration order
    pub fn filterable_attrs(&self) -> &[String] {
        &self.filterable_attrs
    }

    pub fn allowed_scopes(&self) -> &[String] {
        &self.allowed_scopes
    }

    /// Alias name to raw expression
    pub fn aliases(&self) -> &[(String, String)] {
        &self.aliases
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Raw expression registered for an alias
    pub fn alias_expression(&self, name: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(alias, _)| alias == name)
            .map(|(_, expression)| expression.as_str())
    }

    /// Every `by_{name}` filter, sorted
    pub fn filter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Every callable scope (named and association-derived), sorted
    pub fn scope_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scopes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Unfiltered scope over this model's table
    pub fn all(&self) -> Scope {
        Scope::new(&self.schema)
    }

    /// Apply the filter registered as `name` (e.g. `by_first_name`)
    pub fn apply_filter(
        &self,
        scope: Scope,
        name: &str,
        args: &FilterArgs,
    ) -> Result<Scope, FilterError> {
        let handler = self
            .filters
            .get(name)
            .ok_or_else(|| FilterError::unfilterable_attr(name))?;

        match handler {
            FilterHandler::Column(column) => derive_query(
                scope,
                Attr::Column(column.clone()),
                args,
                self.types.as_ref(),
            ),
            FilterHandler::Virtual(expression) => derive_query(
                scope,
                Attr::Virtual(expression.clone()),
                args,
                self.types.as_ref(),
            ),
            FilterHandler::Association { index, target } => {
                self.apply_association(scope, &self.associations[*index], target.as_deref(), args)
            }
        }
    }

    /// Shorthand for `apply_filter(all(), "by_{attr}", args)`
    pub fn by(&self, attr: &str, args: &FilterArgs) -> Result<Scope, FilterError> {
        self.apply_filter(self.all(), &format!("by_{}", attr), args)
    }

    /// Invoke a named or association-derived scope
    pub fn call_scope(
        &self,
        name: &str,
        scope: Scope,
        args: &ScopeArgs,
    ) -> Result<Scope, FilterError> {
        let handler = self
            .scopes
            .get(name)
            .ok_or_else(|| FilterError::unfilterable_attr(name))?;

        match handler {
            ScopeHandler::Named(callable) => callable(scope, args),
            ScopeHandler::Association { index, scope: related_scope } => {
                let association = &self.associations[*index];
                let related = association.related();
                let matched = related.call_scope(related_scope, related.all(), args)?;
                Ok(scope.merge_joined(association.join(&self.schema), matched))
            }
        }
    }
}

impl fmt::Debug for FilterSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSurface")
            .field("model", &self.schema.model())
            .field("filterable_attrs", &self.filterable_attrs)
            .field("allowed_scopes", &self.allowed_scopes)
            .field("aliases", &self.aliases)
            .field("filters", &self.filter_names())
            .field("scopes", &self.scope_names())
            .finish()
    }
}
