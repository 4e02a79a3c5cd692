//! Association-derived filters
//!
//! Filtering by a related model joins the related table onto the owner and
//! merges the related surface's own filter scope. Inversion is pulled out
//! before delegating and re-applied as a complement on the owner, so owners
//! without any related row count as "not matching".

use std::fmt;
use std::sync::Arc;

use crate::error::FilterError;
use crate::operators::{Attr, derive_query};
use crate::rules::FilterArgs;
use crate::schema::TableSchema;
use crate::scope::{Join, Scope};

use super::FilterSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    /// Owner table holds the foreign key
    BelongsTo,
    /// Related table holds the foreign key
    HasMany,
}

/// A resolved association onto another registered surface
#[derive(Clone)]
pub struct Association {
    name: String,
    kind: AssociationKind,
    foreign_key: String,
    related: Arc<FilterSurface>,
}

impl Association {
    pub(crate) fn new(
        name: String,
        kind: AssociationKind,
        foreign_key: String,
        related: Arc<FilterSurface>,
    ) -> Self {
        Self {
            name,
            kind,
            foreign_key,
            related,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    pub fn related(&self) -> &FilterSurface {
        &self.related
    }

    /// LEFT join from the owner's table onto the related table, aliased by
    /// the association name
    pub fn join(&self, owner: &TableSchema) -> Join {
        let related = self.related.schema();
        let (related_key, owner_key) = match self.kind {
            AssociationKind::BelongsTo => (related.primary_key(), self.foreign_key.as_str()),
            AssociationKind::HasMany => (self.foreign_key.as_str(), owner.primary_key()),
        };
        Join {
            table: related.table().to_string(),
            alias: self.name.clone(),
            left: (self.name.clone(), related_key.to_string()),
            right: (owner.table().to_string(), owner_key.to_string()),
        }
    }

    /// Owner-side filter name for a related filter (`None` is the related id)
    pub fn filter_name(&self, related_filter: Option<&str>) -> String {
        match related_filter.map(|name| name.strip_prefix("by_").unwrap_or(name)) {
            None => format!("by_{}", self.name),
            Some(attr) => format!("by_{}_{}", self.name, attr),
        }
    }

    /// Owner-side name for a related allow-listed scope
    pub fn scope_name(&self, related_scope: &str) -> String {
        format!("{}_{}", self.name, related_scope)
    }
}

impl fmt::Debug for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Association")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("foreign_key", &self.foreign_key)
            .field("related", &self.related.model())
            .finish()
    }
}

impl FilterSurface {
    pub(super) fn apply_association(
        &self,
        scope: Scope,
        association: &Association,
        target: Option<&str>,
        args: &FilterArgs,
    ) -> Result<Scope, FilterError> {
        let mut delegated = args.clone();
        let inverted = std::mem::take(&mut delegated.invert);
        let related = association.related();

        let matched = match target {
            None => derive_query(
                related.all(),
                Attr::Column(related.schema().primary_key().to_string()),
                &delegated,
                related.types.as_ref(),
            )?,
            Some(name) => related.apply_filter(related.all(), name, &delegated)?,
        };

        tracing::trace!(
            model = self.model(),
            association = association.name(),
            related = related.model(),
            inverted,
            "Delegating association filter"
        );

        let join = association.join(&self.schema);
        if inverted {
            let query = scope.unscoped().merge_joined(join, matched);
            Ok(scope.where_not_in(query))
        } else {
            Ok(scope.merge_joined(join, matched))
        }
    }
}
