//! Operator registry and operators
//!
//! Each operator validates its target's declared type when it is built and
//! produces a narrower [`Scope`] from [`Operator::query`]. The registry maps
//! the operator names accepted in rules onto [`OperatorKind`].
//!
//! | Names | Operator | Column types |
//! |---|---|---|
//! | `is` | [`Exact`] | any |
//! | `containing` | [`Containment`] | string, text |
//! | `within`, `between` | [`Range`] | datetime, date, integer, float |
//! | `more_than`, `after` | [`Greater`] | datetime, date, integer, float |
//! | `less_than`, `before` | [`Lesser`] | datetime, date, integer, float |

mod base;
mod containment;
mod exact;
mod greater;
mod lesser;
mod range;


use std::fmt;

use serde_json::Value;

use crate::error::FilterError;
use crate::rules::FilterArgs;
use crate::schema::{ColumnType, ColumnTypeLookup};
use crate::scope::Scope;

pub use containment::Containment;
pub use exact::{Exact, coerce};
pub use greater::Greater;
pub use lesser::Lesser;
pub use range::{Range, minmax};

/// Target of an operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attr {
    /// Physical column of the scope's table
    Column(String),
    /// Raw expression of an alias
    Virtual(String),
}

/// Predicate-producing strategy
pub trait Operator {
    fn query(&self) -> Scope;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Exact,
    Containment,
    Range,
    Greater,
    Lesser,
}

/// Operator names accepted in rules
pub const BY_NAME: &[(&str, OperatorKind)] = &[
    ("is", OperatorKind::Exact),
    ("containing", OperatorKind::Containment),
    ("within", OperatorKind::Range),
    ("between", OperatorKind::Range),
    ("more_than", OperatorKind::Greater),
    ("after", OperatorKind::Greater),
    ("less_than", OperatorKind::Lesser),
    ("before", OperatorKind::Lesser),
];

/// Look up an operator by rule name
pub fn resolve(name: &str) -> Option<OperatorKind> {
    BY_NAME
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, kind)| *kind)
}

impl OperatorKind {
    /// Canonical rule name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact => "is",
            Self::Containment => "containing",
            Self::Range => "within",
            Self::Greater => "more_than",
            Self::Lesser => "less_than",
        }
    }

    pub fn allowed_types(&self) -> &'static [ColumnType] {
        match self {
            Self::Exact => Exact::ALLOWED_TYPES,
            Self::Containment => Containment::ALLOWED_TYPES,
            Self::Range => Range::ALLOWED_TYPES,
            Self::Greater => Greater::ALLOWED_TYPES,
            Self::Lesser => Lesser::ALLOWED_TYPES,
        }
    }

    /// Construct the operator, running its type guard
    pub fn build(
        &self,
        scope: Scope,
        attr: Attr,
        value: Value,
        types: &dyn ColumnTypeLookup,
    ) -> Result<Box<dyn Operator>, FilterError> {
        Ok(match self {
            Self::Exact => Box::new(Exact::new(scope, attr, value, types)?),
            Self::Containment => Box::new(Containment::new(scope, attr, value, types)?),
            Self::Range => Box::new(Range::new(scope, attr, value, types)?),
            Self::Greater => Box::new(Greater::new(scope, attr, value, types)?),
            Self::Lesser => Box::new(Lesser::new(scope, attr, value, types)?),
        })
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Apply one operator to `scope`, honoring inversion
///
/// Inversion is a set complement over the scope's primary key rather than a
/// negated condition, so rows where the operand is NULL land on the inverted
/// side. The complemented set is matched on the unscoped table, keeping the
/// scope's own conditions out of the subquery.
pub fn derive_query(
    scope: Scope,
    attr: Attr,
    args: &FilterArgs,
    types: &dyn ColumnTypeLookup,
) -> Result<Scope, FilterError> {
    if args.invert {
        let matched = args
            .operator
            .build(scope.unscoped(), attr, args.param.clone(), types)?
            .query();
        Ok(scope.where_not_in(matched))
    } else {
        let operator = args.operator.build(scope, attr, args.param.clone(), types)?;
        Ok(operator.query())
    }
}
