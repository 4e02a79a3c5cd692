use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::config::FilterConfig;
use crate::error::FilterError;
use crate::rules::ScopeArgs;
use crate::schema::{ColumnTypeLookup, TableSchema, ensure_identifier};
use crate::scope::Scope;

use super::association::{Association, AssociationKind};
use super::{FilterHandler, FilterSurface, NamedScope, ScopeHandler};

#[derive(Debug, Clone)]
struct AssociationDecl {
    name: String,
    kind: AssociationKind,
    foreign_key: String,
    related_model: String,
}

/// Declares what a model can be filtered by
///
/// Nothing is validated until [`build`](Self::build) (or catalog
/// registration), which compiles every `by_{name}` filter up front.
pub struct FilterSurfaceBuilder {
    schema: TableSchema,
    types: Option<Arc<dyn ColumnTypeLookup>>,
    config: Option<FilterConfig>,
    attrs: Vec<String>,
    aliases: Vec<(String, String)>,
    named_scopes: Vec<(String, NamedScope)>,
    allowed_scopes: Vec<String>,
    associations: Vec<AssociationDecl>,
}

impl FilterSurfaceBuilder {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            types: None,
            config: None,
            attrs: Vec::new(),
            aliases: Vec::new(),
            named_scopes: Vec::new(),
            allowed_scopes: Vec::new(),
            associations: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        self.schema.model()
    }

    /// Expose a physical column
    pub fn attr(mut self, name: impl Into<String>) -> Self {
        self.attrs.push(name.into());
        self
    }

    pub fn attrs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Expose a raw SQL expression as a virtual column
    pub fn alias(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.aliases.push((name.into(), expression.into()));
        self
    }

    /// Define a callable scope; it is only reachable from rules once allowed
    pub fn named_scope<F>(mut self, name: impl Into<String>, scope: F) -> Self
    where
        F: Fn(Scope, &ScopeArgs) -> Result<Scope, FilterError> + Send + Sync + 'static,
    {
        let scope: NamedScope = Arc::new(scope);
        self.named_scopes.push((name.into(), scope));
        self
    }

    pub fn allow_scope(mut self, name: impl Into<String>) -> Self {
        self.allowed_scopes.push(name.into());
        self
    }

    pub fn belongs_to(
        self,
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        related_model: impl Into<String>,
    ) -> Self {
        self.association(AssociationKind::BelongsTo, name, foreign_key, related_model)
    }

    pub fn has_many(
        self,
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        related_model: impl Into<String>,
    ) -> Self {
        self.association(AssociationKind::HasMany, name, foreign_key, related_model)
    }

    fn association(
        mut self,
        kind: AssociationKind,
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        related_model: impl Into<String>,
    ) -> Self {
        self.associations.push(AssociationDecl {
            name: name.into(),
            kind,
            foreign_key: foreign_key.into(),
            related_model: related_model.into(),
        });
        self
    }

    /// Override where operators look up declared column types
    pub fn column_types(mut self, types: Arc<dyn ColumnTypeLookup>) -> Self {
        self.types = Some(types);
        self
    }

    pub fn config(mut self, config: FilterConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Compile a surface with no associations
    pub fn build(self) -> Result<FilterSurface, FilterError> {
        self.build_with(|_| None, &FilterConfig::default())
    }

    /// Compile the surface, resolving related models through `resolve`
    ///
    /// An explicitly configured [`FilterConfig`] wins over `default_config`.
    pub fn build_with<R>(
        self,
        resolve: R,
        default_config: &FilterConfig,
    ) -> Result<FilterSurface, FilterError>
    where
        R: Fn(&str) -> Option<Arc<FilterSurface>>,
    {
        self.schema.validate()?;
        let schema = Arc::new(self.schema);
        let types: Arc<dyn ColumnTypeLookup> = match self.types {
            Some(types) => types,
            None => schema.clone() as Arc<dyn ColumnTypeLookup>,
        };
        let model = schema.model().to_string();

        let mut filterable_attrs: Vec<String> = Vec::new();
        let mut filters: FxHashMap<String, FilterHandler> = FxHashMap::default();

        for attr in self.attrs {
            ensure_identifier("attribute", &attr)?;
            if types.column_type(&model, &attr).is_none() {
                return Err(FilterError::invalid_filter(format!(
                    "{} has no column named {}",
                    model, attr
                )));
            }
            filters.insert(format!("by_{}", attr), FilterHandler::Column(attr.clone()));
            if !filterable_attrs.contains(&attr) {
                filterable_attrs.push(attr);
            }
        }

        for (alias, expression) in &self.aliases {
            ensure_identifier("alias", alias)?;
            if expression.trim().is_empty() {
                return Err(FilterError::invalid_filter(format!(
                    "Alias {} has an empty expression",
                    alias
                )));
            }
            filters.insert(
                format!("by_{}", alias),
                FilterHandler::Virtual(expression.clone()),
            );
            if !filterable_attrs.contains(alias) {
                filterable_attrs.push(alias.clone());
            }
        }

        let mut scopes: FxHashMap<String, ScopeHandler> = FxHashMap::default();
        for (name, callable) in self.named_scopes {
            ensure_identifier("scope", &name)?;
            scopes.insert(name, ScopeHandler::Named(callable));
        }

        let mut associations = Vec::with_capacity(self.associations.len());
        for decl in self.associations {
            ensure_identifier("association", &decl.name)?;
            ensure_identifier("foreign key", &decl.foreign_key)?;

            let related = resolve(&decl.related_model)
                .ok_or_else(|| FilterError::unfilterable_join(&model, &decl.related_model))?;

            let key_owner = match decl.kind {
                AssociationKind::BelongsTo => schema.as_ref(),
                AssociationKind::HasMany => related.schema(),
            };
            if !key_owner.has_column(&decl.foreign_key) {
                return Err(FilterError::invalid_filter(format!(
                    "{} has no column named {}",
                    key_owner.model(),
                    decl.foreign_key
                )));
            }

            let index = associations.len();
            let association = Association::new(decl.name, decl.kind, decl.foreign_key, related);
            let related = association.related();

            filters.insert(
                association.filter_name(None),
                FilterHandler::Association {
                    index,
                    target: None,
                },
            );
            for name in related.filter_names() {
                filters.insert(
                    association.filter_name(Some(name)),
                    FilterHandler::Association {
                        index,
                        target: Some(name.to_string()),
                    },
                );
            }
            for related_scope in related.allowed_scopes() {
                scopes.insert(
                    association.scope_name(related_scope),
                    ScopeHandler::Association {
                        index,
                        scope: related_scope.clone(),
                    },
                );
            }

            associations.push(association);
        }

        let mut allowed_scopes: Vec<String> = Vec::new();
        for name in self.allowed_scopes {
            ensure_identifier("scope", &name)?;
            if !allowed_scopes.contains(&name) {
                allowed_scopes.push(name);
            }
        }

        let surface = FilterSurface {
            schema,
            types,
            config: self.config.unwrap_or_else(|| default_config.clone()),
            filterable_attrs,
            allowed_scopes,
            aliases: self.aliases,
            associations,
            filters,
            scopes,
        };

        tracing::debug!(
            model = surface.model(),
            filters = surface.filters.len(),
            scopes = surface.scopes.len(),
            associations = surface.associations.len(),
            "Filter surface compiled"
        );

        Ok(surface)
    }
}
