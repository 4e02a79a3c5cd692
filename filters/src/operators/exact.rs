use serde_json::{Number, Value};

use crate::error::FilterError;
use crate::schema::{ColumnType, ColumnTypeLookup};
use crate::scope::{CompareOp, Predicate, Scope};

use super::base::Base;
use super::{Attr, Operator};

/// Equality, or `IS NULL` for a null param
#[derive(Debug, Clone)]
pub struct Exact(Base);

impl Exact {
    pub const ALLOWED_TYPES: &'static [ColumnType] = ColumnType::ALL;

    pub fn new(
        scope: Scope,
        attr: Attr,
        value: Value,
        types: &dyn ColumnTypeLookup,
    ) -> Result<Self, FilterError> {
        Base::new(scope, attr, value, types, "Exact", Self::ALLOWED_TYPES).map(Self)
    }
}

impl Operator for Exact {
    fn query(&self) -> Scope {
        let base = &self.0;
        let operand = base.operand();

        if base.value.is_null() {
            return base.scope.clone().and_where(Predicate::IsNull(operand));
        }

        let value = match base.column_type {
            Some(column_type) if !base.is_virtual() => coerce(&base.value, column_type),
            _ => Some(base.value.clone()),
        };

        let predicate = match value {
            Some(value) => Predicate::compare(operand, CompareOp::Eq, value),
            // A literal the column can never hold
            None => Predicate::Never,
        };
        base.scope.clone().and_where(predicate)
    }
}

/// Cast a string literal to the column's declared type
///
/// Non-string values pass through. Returns `None` when the literal cannot be
/// represented in the column's type.
pub fn coerce(value: &Value, column_type: ColumnType) -> Option<Value> {
    let Value::String(raw) = value else {
        return Some(value.clone());
    };
    let trimmed = raw.trim();

    match column_type {
        ColumnType::Integer => {
            if let Ok(n) = trimmed.parse::<i64>() {
                return Some(Value::from(n));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| Value::from(f.trunc() as i64))
        }
        ColumnType::Float => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        ColumnType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "t" | "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
            "f" | "false" | "0" | "no" | "off" => Some(Value::Bool(false)),
            _ => None,
        },
        ColumnType::String | ColumnType::Text | ColumnType::Date | ColumnType::Datetime => {
            Some(value.clone())
        }
    }
}
