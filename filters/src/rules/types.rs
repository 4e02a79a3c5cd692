//! Rule type definitions
//!
//! A decoded rule tree is parsed once into these types; everything after
//! parsing matches on the closed set of shapes instead of inspecting keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::FilterError;
use crate::operators::OperatorKind;

/// How sibling rules combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Conjunction {
    /// AND: each rule narrows the previous result
    #[default]
    Exclusive,
    /// OR: union of every rule's matches
    Inclusive,
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conjunction::Exclusive => write!(f, "exclusive"),
            Conjunction::Inclusive => write!(f, "inclusive"),
        }
    }
}

impl FromStr for Conjunction {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches(':').to_ascii_lowercase();
        match normalized.as_str() {
            "exclusive" => Ok(Conjunction::Exclusive),
            "inclusive" => Ok(Conjunction::Inclusive),
            _ => Err(FilterError::invalid_filter(format!(
                "Unknown conjunction: {}",
                s
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Conjunction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Arguments for a `by_{name}` filter
#[derive(Debug, Clone, PartialEq)]
pub struct FilterArgs {
    pub operator: OperatorKind,
    pub param: Value,
    pub invert: bool,
}

impl FilterArgs {
    pub fn new(operator: OperatorKind, param: Value) -> Self {
        Self {
            operator,
            param,
            invert: false,
        }
    }

    /// Equality against a bare value
    pub fn is(param: impl Into<Value>) -> Self {
        Self::new(OperatorKind::Exact, param.into())
    }

    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }
}

/// Arguments passed to a named scope
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeArgs {
    Positional(Vec<Value>),
    Keyword(Map<String, Value>),
}

impl ScopeArgs {
    /// Normalize a rule param: a mapping becomes keyword arguments, a
    /// sequence becomes positional arguments, a single value is wrapped, and
    /// null means no arguments.
    pub fn from_param(param: &Value) -> Self {
        match param {
            Value::Object(map) => Self::Keyword(map.clone()),
            Value::Array(items) => Self::Positional(items.clone()),
            Value::Null => Self::Positional(Vec::new()),
            other => Self::Positional(vec![other.clone()]),
        }
    }

    pub fn positional(&self) -> &[Value] {
        match self {
            Self::Positional(values) => values,
            Self::Keyword(_) => &[],
        }
    }

    pub fn keyword(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Keyword(map) => map.get(key),
            Self::Positional(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafRule {
    pub column: String,
    pub operator: OperatorKind,
    pub param: Value,
    pub invert: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeRule {
    pub column: String,
    pub param: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeRule {
    pub rules: Vec<Rule>,
    pub conjunction: Conjunction,
}

/// One node of a rule tree
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Matches everything
    Blank,
    Leaf(LeafRule),
    Scope(ScopeRule),
    Composite(CompositeRule),
}

impl Rule {
    pub fn leaf(column: impl Into<String>, operator: OperatorKind, param: impl Into<Value>) -> Self {
        Self::Leaf(LeafRule {
            column: column.into(),
            operator,
            param: param.into(),
            invert: false,
        })
    }

    pub fn inverted_leaf(
        column: impl Into<String>,
        operator: OperatorKind,
        param: impl Into<Value>,
    ) -> Self {
        Self::Leaf(LeafRule {
            column: column.into(),
            operator,
            param: param.into(),
            invert: true,
        })
    }

    pub fn scope(column: impl Into<String>, param: impl Into<Value>) -> Self {
        Self::Scope(ScopeRule {
            column: column.into(),
            param: param.into(),
        })
    }

    pub fn composite(rules: Vec<Rule>, conjunction: Conjunction) -> Self {
        Self::Composite(CompositeRule { rules, conjunction })
    }
}

/// Lenient boolean cast for the `invert` flag
///
/// Absent, null and empty string are false; `false`, `0`, `"0"`, `"f"`,
/// `"false"`, `"off"` (any case) are false; everything else is true.
pub fn parse_bool(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::String(s)) => {
            let s = s.trim().to_ascii_lowercase();
            !matches!(s.as_str(), "" | "0" | "f" | "false" | "off")
        }
        Some(_) => true,
    }
}
