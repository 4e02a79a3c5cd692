//! Rule trees
//!
//! Caller input arrives as a decoded tree of mappings. A single parsing step
//! turns it into [`Rule`] values: blank, leaf operator rule, scope reference,
//! or composite rule set with its own [`Conjunction`].
//!
//! ```
//! use has_filters::core::config::FilterConfig;
//! use has_filters::rules::{Rule, RuleParser};
//!
//! let json_str = r#"[{"column": "name", "operator": "is", "param": "test"}]"#;
//! let config = FilterConfig::default();
//! let rules = RuleParser::new(&[], &config).parse_json(json_str).unwrap();
//! assert!(matches!(rules[0], Rule::Leaf(_)));
//! ```

mod parser;
mod types;

pub use parser::RuleParser;
pub use types::{
    CompositeRule, Conjunction, FilterArgs, LeafRule, Rule, ScopeArgs, ScopeRule, parse_bool,
};
