//! Unified error type for filter compilation
//!
//! Every failure that can come out of parsing, resolving or composing a rule
//! tree is one of these variants. They are all input-validation errors: none
//! of them is transient and none of them leaves a partially built scope.

use thiserror::Error;

use crate::schema::ColumnType;

/// Errors raised while compiling filters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Malformed rule input (bad shape, unknown operator, bad conjunction)
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Well-formed rule aimed at a name the model does not expose
    #[error("Could not compose filter named {0}")]
    UnfilterableAttr(String),

    /// Association whose related model has no compiled filter surface
    #[error("{model} is not filterable by {related}")]
    UnfilterableJoin { model: String, related: String },

    /// Operand that cannot be turned into the shape the operator needs
    #[error("Invalid filter param: {0}")]
    InvalidFilterParam(String),

    /// Operator applied to a column type outside its allowed set
    #[error("Cannot apply {operator} rule to {column_type}")]
    TypeMismatch {
        operator: &'static str,
        column_type: ColumnType,
    },
}

impl FilterError {
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter(message.into())
    }

    pub fn unfilterable_attr(name: impl Into<String>) -> Self {
        Self::UnfilterableAttr(name.into())
    }

    pub fn unfilterable_join(model: impl Into<String>, related: impl Into<String>) -> Self {
        Self::UnfilterableJoin {
            model: model.into(),
            related: related.into(),
        }
    }

    pub fn invalid_param(message: impl Into<String>) -> Self {
        Self::InvalidFilterParam(message.into())
    }

    pub fn type_mismatch(operator: &'static str, column_type: ColumnType) -> Self {
        Self::TypeMismatch {
            operator,
            column_type,
        }
    }

    /// Stable machine-readable code for caller-facing diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFilter(_) => "INVALID_FILTER",
            Self::UnfilterableAttr(_) => "UNFILTERABLE_ATTR",
            Self::UnfilterableJoin { .. } => "UNFILTERABLE_JOIN",
            Self::InvalidFilterParam(_) => "INVALID_FILTER_PARAM",
            Self::TypeMismatch { .. } => "FILTER_TYPE_MISMATCH",
        }
    }

    /// Whether the error was caused by caller input rather than by model registration
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::UnfilterableJoin { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfilterable_join_display() {
        let err = FilterError::unfilterable_join("Filterable", "FilterableFriend");
        assert_eq!(
            err.to_string(),
            "Filterable is not filterable by FilterableFriend"
        );
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = FilterError::type_mismatch("Containment", ColumnType::Integer);
        assert_eq!(err.to_string(), "Cannot apply Containment rule to integer");
    }

    #[test]
    fn test_codes() {
        assert_eq!(FilterError::invalid_filter("x").code(), "INVALID_FILTER");
        assert_eq!(
            FilterError::unfilterable_attr("by_name").code(),
            "UNFILTERABLE_ATTR"
        );
        assert_eq!(FilterError::invalid_param("x").code(), "INVALID_FILTER_PARAM");
    }

    #[test]
    fn test_is_input_error() {
        assert!(FilterError::invalid_filter("bad").is_input_error());
        assert!(FilterError::unfilterable_attr("by_name").is_input_error());
        assert!(!FilterError::unfilterable_join("A", "B").is_input_error());
    }
}
