//! Rule parsing
//!
//! Parses decoded rule trees (JSON values) into [`Rule`]s with validation.

use serde_json::{Map, Value};

use crate::core::config::FilterConfig;
use crate::error::FilterError;
use crate::operators;

use super::types::{CompositeRule, Conjunction, LeafRule, Rule, ScopeRule, parse_bool};

/// Parses rule trees against one model's allow-listed scopes
pub struct RuleParser<'a> {
    allowed_scopes: &'a [String],
    config: &'a FilterConfig,
    parsed: usize,
}

impl<'a> RuleParser<'a> {
    pub fn new(allowed_scopes: &'a [String], config: &'a FilterConfig) -> Self {
        Self {
            allowed_scopes,
            config,
            parsed: 0,
        }
    }

    /// Parse rules from JSON text
    ///
    /// Validates the text size before decoding.
    pub fn parse_json(&mut self, json_str: &str) -> Result<Vec<Rule>, FilterError> {
        if json_str.len() > self.config.max_json_bytes {
            return Err(FilterError::invalid_filter(format!(
                "Filter JSON exceeds maximum size of {} bytes",
                self.config.max_json_bytes
            )));
        }

        let value: Value = serde_json::from_str(json_str)
            .map_err(|e| FilterError::invalid_filter(format!("Invalid filter JSON: {}", e)))?;
        self.parse_list(&value)
    }

    /// Parse a top-level rule list
    ///
    /// Every element must be a mapping (or null, read as blank) before any
    /// element is interpreted.
    pub fn parse_list(&mut self, value: &Value) -> Result<Vec<Rule>, FilterError> {
        self.parse_list_at(value, 0)
    }

    fn parse_list_at(&mut self, value: &Value, depth: usize) -> Result<Vec<Rule>, FilterError> {
        let Value::Array(items) = value else {
            return Err(FilterError::invalid_filter("Invalid rules object"));
        };
        if !items.iter().all(|item| item.is_object() || item.is_null()) {
            return Err(FilterError::invalid_filter("Invalid rules object"));
        }

        items.iter().map(|item| self.parse_rule(item, depth)).collect()
    }

    fn parse_rule(&mut self, value: &Value, depth: usize) -> Result<Rule, FilterError> {
        self.parsed += 1;
        if self.parsed > self.config.max_rules {
            return Err(FilterError::invalid_filter(format!(
                "Maximum {} rules allowed",
                self.config.max_rules
            )));
        }

        let map = match value {
            Value::Null => return Ok(Rule::Blank),
            Value::Object(map) if map.is_empty() => return Ok(Rule::Blank),
            Value::Object(map) => map,
            other => {
                return Err(FilterError::invalid_filter(format!(
                    "Invalid rule object: {}",
                    other
                )));
            }
        };

        if let Some(column) = map.get("column").and_then(Value::as_str)
            && self.allowed_scopes.iter().any(|s| s == column)
        {
            return Ok(Rule::Scope(ScopeRule {
                column: column.to_string(),
                param: map.get("param").cloned().unwrap_or(Value::Null),
            }));
        }

        if let Some(rules) = map.get("rules") {
            return self.parse_composite(map, rules, depth);
        }

        self.parse_leaf(map)
    }

    fn parse_composite(
        &mut self,
        map: &Map<String, Value>,
        rules: &Value,
        depth: usize,
    ) -> Result<Rule, FilterError> {
        if depth + 1 > self.config.max_depth {
            return Err(FilterError::invalid_filter(format!(
                "Rules nested deeper than {} levels",
                self.config.max_depth
            )));
        }

        let conjunction = match map.get("conjunction") {
            None | Some(Value::Null) => Conjunction::default(),
            Some(Value::String(s)) => s.parse()?,
            Some(other) => {
                return Err(FilterError::invalid_filter(format!(
                    "Unknown conjunction: {}",
                    other
                )));
            }
        };

        let rules = self.parse_list_at(rules, depth + 1)?;
        Ok(Rule::Composite(CompositeRule { rules, conjunction }))
    }

    fn parse_leaf(&self, map: &Map<String, Value>) -> Result<Rule, FilterError> {
        let invalid = || {
            FilterError::invalid_filter(format!(
                "Invalid rule object: {}",
                Value::Object(map.clone())
            ))
        };

        let (Some(column), Some(operator), Some(param)) =
            (map.get("column"), map.get("operator"), map.get("param"))
        else {
            return Err(invalid());
        };

        let column = column.as_str().ok_or_else(invalid)?;
        let operator_name = operator.as_str().ok_or_else(invalid)?;
        let operator = operators::resolve(operator_name).ok_or_else(|| {
            FilterError::invalid_filter(format!("No rule identified by {}", operator_name))
        })?;

        Ok(Rule::Leaf(LeafRule {
            column: column.to_string(),
            operator,
            param: param.clone(),
            invert: parse_bool(map.get("invert")),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::OperatorKind;
    use serde_json::json;

    fn parse(value: Value) -> Result<Vec<Rule>, FilterError> {
        let scopes = vec!["with_custom_scope".to_string()];
        let config = FilterConfig::default();
        RuleParser::new(&scopes, &config).parse_list(&value)
    }

    #[test]
    fn parses_leaf_rule() {
        let rules = parse(json!([
            {"column": "name", "operator": "containing", "param": "es", "invert": "true"}
        ]))
        .unwrap();
        assert_eq!(
            rules,
            vec![Rule::inverted_leaf("name", OperatorKind::Containment, "es")]
        );
    }

    #[test]
    fn parses_blank_rules() {
        assert_eq!(parse(json!([{}, null])).unwrap(), vec![Rule::Blank, Rule::Blank]);
    }

    #[test]
    fn parses_scope_rule_before_leaf() {
        let rules = parse(json!([{"column": "with_custom_scope", "param": ["a", "b"]}])).unwrap();
        assert_eq!(rules, vec![Rule::scope("with_custom_scope", json!(["a", "b"]))]);
    }

    #[test]
    fn parses_nested_rules_with_conjunction() {
        let rules = parse(json!([
            {
                "rules": [
                    {"column": "name", "operator": "is", "param": "test"},
                    {"rules": []}
                ],
                "conjunction": "inclusive"
            }
        ]))
        .unwrap();
        assert_eq!(
            rules,
            vec![Rule::composite(
                vec![
                    Rule::leaf("name", OperatorKind::Exact, "test"),
                    Rule::composite(vec![], Conjunction::Exclusive),
                ],
                Conjunction::Inclusive
            )]
        );
    }

    #[test]
    fn rejects_non_array() {
        assert!(matches!(parse(json!("wrong")), Err(FilterError::InvalidFilter(_))));
        assert!(matches!(parse(json!({"column": "x"})), Err(FilterError::InvalidFilter(_))));
    }

    #[test]
    fn rejects_non_mapping_element() {
        assert!(matches!(parse(json!(["wrong"])), Err(FilterError::InvalidFilter(_))));
        // Validated before any element is interpreted
        assert!(matches!(
            parse(json!([{"column": "name", "operator": "bogus", "param": 1}, 5])),
            Err(FilterError::InvalidFilter(msg)) if msg == "Invalid rules object"
        ));
    }

    #[test]
    fn rejects_incomplete_leaf() {
        assert!(matches!(parse(json!([{"not": "real"}])), Err(FilterError::InvalidFilter(_))));
        assert!(matches!(
            parse(json!([{"column": "name", "param": 1}])),
            Err(FilterError::InvalidFilter(_))
        ));
    }

    #[test]
    fn rejects_unknown_operator() {
        let err = parse(json!([{"column": "x", "operator": "bogus", "param": 1}])).unwrap_err();
        assert_eq!(err, FilterError::invalid_filter("No rule identified by bogus"));
    }

    #[test]
    fn rejects_unknown_conjunction() {
        assert!(matches!(
            parse(json!([{"rules": [], "conjunction": "sometimes"}])),
            Err(FilterError::InvalidFilter(_))
        ));
        assert!(matches!(
            parse(json!([{"rules": [], "conjunction": 1}])),
            Err(FilterError::InvalidFilter(_))
        ));
    }

    #[test]
    fn enforces_rule_count() {
        let config = FilterConfig {
            max_rules: 2,
            ..FilterConfig::default()
        };
        let rules = json!([{}, {}, {}]);
        assert!(matches!(
            RuleParser::new(&[], &config).parse_list(&rules),
            Err(FilterError::InvalidFilter(_))
        ));
    }

    #[test]
    fn enforces_depth() {
        let config = FilterConfig {
            max_depth: 1,
            ..FilterConfig::default()
        };
        assert!(RuleParser::new(&[], &config)
            .parse_list(&json!([{"rules": [{}]}]))
            .is_ok());
        assert!(matches!(
            RuleParser::new(&[], &config).parse_list(&json!([{"rules": [{"rules": []}]}])),
            Err(FilterError::InvalidFilter(_))
        ));
    }

    #[test]
    fn parse_json_checks_size_and_syntax() {
        let config = FilterConfig {
            max_json_bytes: 8,
            ..FilterConfig::default()
        };
        assert!(matches!(
            RuleParser::new(&[], &config).parse_json("[{}, {}, {}]"),
            Err(FilterError::InvalidFilter(_))
        ));

        let config = FilterConfig::default();
        assert!(matches!(
            RuleParser::new(&[], &config).parse_json("not valid json"),
            Err(FilterError::InvalidFilter(_))
        ));
        assert_eq!(
            RuleParser::new(&[], &config).parse_json("[{}]").unwrap(),
            vec![Rule::Blank]
        );
    }
}
