//! Shared operator state and the column type guard

use serde_json::Value;

use crate::error::FilterError;
use crate::schema::{ColumnType, ColumnTypeLookup};
use crate::scope::{Operand, Scope};

use super::Attr;

/// State every operator is built from
///
/// Construction performs the type check, so an operator that exists is one
/// whose target accepts it.
#[derive(Debug, Clone)]
pub struct Base {
    pub(super) scope: Scope,
    pub(super) attr: Attr,
    pub(super) value: Value,
    pub(super) column_type: Option<ColumnType>,
}

impl Base {
    pub(super) fn new(
        scope: Scope,
        attr: Attr,
        value: Value,
        types: &dyn ColumnTypeLookup,
        operator: &'static str,
        allowed: &[ColumnType],
    ) -> Result<Self, FilterError> {
        let column_type = match &attr {
            // Aliases have no declared type to check against
            Attr::Virtual(_) => None,
            Attr::Column(name) => {
                let column_type = types
                    .column_type(scope.model(), name)
                    .ok_or_else(|| FilterError::unfilterable_attr(format!("by_{}", name)))?;
                if !allowed.contains(&column_type) {
                    return Err(FilterError::type_mismatch(operator, column_type));
                }
                Some(column_type)
            }
        };

        Ok(Self {
            scope,
            attr,
            value,
            column_type,
        })
    }

    pub(super) fn is_virtual(&self) -> bool {
        matches!(self.attr, Attr::Virtual(_))
    }

    /// Table-qualified column, or the alias expression verbatim
    pub(super) fn operand(&self) -> Operand {
        match &self.attr {
            Attr::Column(name) => Operand::column(self.scope.table(), name.clone()),
            Attr::Virtual(expression) => Operand::Raw(expression.clone()),
        }
    }
}
