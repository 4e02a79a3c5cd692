use serde_json::Value;

use crate::error::FilterError;
use crate::schema::{ColumnType, ColumnTypeLookup};
use crate::scope::{CompareOp, Predicate, Scope};

use super::base::Base;
use super::{Attr, Operator};

/// Inclusive upper bound: `column <= param`
#[derive(Debug, Clone)]
pub struct Lesser(Base);

impl Lesser {
    pub const ALLOWED_TYPES: &'static [ColumnType] = &[
        ColumnType::Datetime,
        ColumnType::Date,
        ColumnType::Integer,
        ColumnType::Float,
    ];

    pub fn new(
        scope: Scope,
        attr: Attr,
        value: Value,
        types: &dyn ColumnTypeLookup,
    ) -> Result<Self, FilterError> {
        Base::new(scope, attr, value, types, "Lesser", Self::ALLOWED_TYPES).map(Self)
    }
}

impl Operator for Lesser {
    fn query(&self) -> Scope {
        let base = &self.0;
        base.scope.clone().and_where(Predicate::compare(
            base.operand(),
            CompareOp::Lte,
            base.value.clone(),
        ))
    }
}
