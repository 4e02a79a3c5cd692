use std::cmp::Ordering;

use serde_json::Value;

use crate::error::FilterError;
use crate::schema::{ColumnType, ColumnTypeLookup};
use crate::scope::{CompareOp, Predicate, Scope};

use super::base::Base;
use super::{Attr, Operator};

/// Inclusive range built from the param's minimum and maximum
#[derive(Debug, Clone)]
pub struct Range {
    base: Base,
    min: Value,
    max: Value,
}

impl Range {
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
        let base = Base::new(scope, attr, value, types, "Range", Self::ALLOWED_TYPES)?;
        let (min, max) = minmax(&base.value)?;
        Ok(Self { base, min, max })
    }

    pub fn bounds(&self) -> (&Value, &Value) {
        (&self.min, &self.max)
    }
}

impl Operator for Range {
    fn query(&self) -> Scope {
        let operand = self.base.operand();
        self.base
            .scope
            .clone()
            .and_where(Predicate::compare(
                operand.clone(),
                CompareOp::Gte,
                self.min.clone(),
            ))
            .and_where(Predicate::compare(operand, CompareOp::Lte, self.max.clone()))
    }
}

fn invalid_range() -> FilterError {
    FilterError::invalid_param(
        "Range filter param must be a range object or a sequence of comparable values",
    )
}

/// Derive `(min, max)` from a range-like param
///
/// Accepts a non-empty array of numbers or of strings (in any order), or an
/// object with `min`/`max`, `from`/`to` or `begin`/`end` keys.
pub fn minmax(value: &Value) -> Result<(Value, Value), FilterError> {
    match value {
        Value::Array(items) => minmax_of(items),
        Value::Object(map) => {
            let pair = [("min", "max"), ("from", "to"), ("begin", "end")]
                .iter()
                .find_map(|(lo, hi)| Some((map.get(*lo)?, map.get(*hi)?)))
                .ok_or_else(invalid_range)?;
            minmax_of(&[pair.0.clone(), pair.1.clone()])
        }
        _ => Err(invalid_range()),
    }
}

fn minmax_of(items: &[Value]) -> Result<(Value, Value), FilterError> {
    let first = items.first().ok_or_else(invalid_range)?;
    let mut min = first;
    let mut max = first;

    for item in &items[1..] {
        if compare(item, min)? == Ordering::Less {
            min = item;
        }
        if compare(item, max)? == Ordering::Greater {
            max = item;
        }
    }
    // Single-element input still needs a comparable type
    compare(first, first)?;

    Ok((min.clone(), max.clone()))
}

fn compare(a: &Value, b: &Value) -> Result<Ordering, FilterError> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Ok(x.cmp(&y));
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return Ok(x.cmp(&y));
            }
            // Mixed signs past i64 or real floats
            match (x.as_i64(), y.as_u64()) {
                (Some(_), Some(_)) => return Ok(Ordering::Less),
                _ if x.as_u64().is_some() && y.as_i64().is_some() => {
                    return Ok(Ordering::Greater);
                }
                _ => {}
            }
            let (x, y) = (
                x.as_f64().ok_or_else(invalid_range)?,
                y.as_f64().ok_or_else(invalid_range)?,
            );
            x.partial_cmp(&y).ok_or_else(invalid_range)
        }
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => Err(invalid_range()),
    }
}
