use serde_json::Value;

use crate::error::FilterError;
use crate::schema::{ColumnType, ColumnTypeLookup};
use crate::scope::{Predicate, Scope};

use super::base::Base;
use super::{Attr, Operator};

/// Case-insensitive substring match
#[derive(Debug, Clone)]
pub struct Containment(Base);

impl Containment {
    pub const ALLOWED_TYPES: &'static [ColumnType] = &[ColumnType::String, ColumnType::Text];

    pub fn new(
        scope: Scope,
        attr: Attr,
        value: Value,
        types: &dyn ColumnTypeLookup,
    ) -> Result<Self, FilterError> {
        Base::new(scope, attr, value, types, "Containment", Self::ALLOWED_TYPES).map(Self)
    }
}

impl Operator for Containment {
    fn query(&self) -> Scope {
        let base = &self.0;
        base.scope.clone().and_where(Predicate::Contains {
            lhs: base.operand(),
            needle: base.value.clone(),
        })
    }
}
