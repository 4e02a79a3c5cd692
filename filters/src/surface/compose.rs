//! Rule resolution and composition
//!
//! Each parsed rule resolves to one of four outcomes: identity, a scope call,
//! a `by_{column}` filter, or a nested rule set. Exclusive composition threads
//! the accumulated scope through every rule; inclusive composition unions the
//! primary keys matched by each rule on its own.

use serde_json::Value;

use crate::error::FilterError;
use crate::rules::{Conjunction, FilterArgs, Rule, RuleParser, ScopeArgs};
use crate::scope::{Predicate, Scope};

use super::FilterSurface;

/// What a single rule contributes to a composition
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'r> {
    /// Leaves the scope unchanged
    Identity,
    ScopeCall { name: &'r str, args: ScopeArgs },
    Filter { name: String, args: FilterArgs },
    Nested {
        rules: &'r [Rule],
        conjunction: Conjunction,
    },
}

impl FilterSurface {
    /// Decide what `rule` does against this surface
    pub fn resolve<'r>(&self, rule: &'r Rule) -> Result<Resolution<'r>, FilterError> {
        match rule {
            Rule::Blank => Ok(Resolution::Identity),
            Rule::Scope(scope) => {
                if !self.allowed_scopes.iter().any(|s| *s == scope.column) {
                    return Err(FilterError::unfilterable_attr(&scope.column));
                }
                Ok(Resolution::ScopeCall {
                    name: &scope.column,
                    args: ScopeArgs::from_param(&scope.param),
                })
            }
            Rule::Leaf(leaf) => Ok(Resolution::Filter {
                name: format!("by_{}", leaf.column),
                args: FilterArgs {
                    operator: leaf.operator,
                    param: leaf.param.clone(),
                    invert: leaf.invert,
                },
            }),
            Rule::Composite(composite) => Ok(Resolution::Nested {
                rules: &composite.rules,
                conjunction: composite.conjunction,
            }),
        }
    }

    /// Filter `base` by an untrusted rule list
    ///
    /// An empty list returns `base` unchanged.
    pub fn filter(
        &self,
        base: &Scope,
        rules: &Value,
        conjunction: Conjunction,
    ) -> Result<Scope, FilterError> {
        let rules = RuleParser::new(&self.allowed_scopes, &self.config).parse_list(rules)?;
        self.filter_rules(base, &rules, conjunction)
    }

    /// Filter `base` by rules given as JSON text
    pub fn filter_json(
        &self,
        base: &Scope,
        json_str: &str,
        conjunction: Conjunction,
    ) -> Result<Scope, FilterError> {
        let rules = RuleParser::new(&self.allowed_scopes, &self.config).parse_json(json_str)?;
        self.filter_rules(base, &rules, conjunction)
    }

    /// Filter `base` by already-parsed rules
    pub fn filter_rules(
        &self,
        base: &Scope,
        rules: &[Rule],
        conjunction: Conjunction,
    ) -> Result<Scope, FilterError> {
        if rules.is_empty() {
            return Ok(base.clone());
        }

        tracing::debug!(
            model = self.model(),
            rules = rules.len(),
            %conjunction,
            "Composing filters"
        );

        let composed = self.compose(rules, conjunction)?;
        Ok(base.clone().merge(composed))
    }

    /// Combine `rules` into one scope over this model, starting unscoped
    pub fn compose(&self, rules: &[Rule], conjunction: Conjunction) -> Result<Scope, FilterError> {
        let unscoped = self.all();
        if rules.is_empty() {
            return Ok(unscoped);
        }

        match conjunction {
            Conjunction::Exclusive => rules
                .iter()
                .try_fold(unscoped, |scope, rule| self.apply_rule(scope, rule)),
            Conjunction::Inclusive => {
                let branches = rules
                    .iter()
                    .map(|rule| {
                        let matched = self.apply_rule(unscoped.clone(), rule)?;
                        Ok(Predicate::InScope {
                            lhs: unscoped.identity(),
                            scope: Box::new(matched.except_limit_offset()),
                            negated: false,
                        })
                    })
                    .collect::<Result<Vec<_>, FilterError>>()?;
                Ok(unscoped.and_where(Predicate::Any(branches)))
            }
        }
    }

    fn apply_rule(&self, scope: Scope, rule: &Rule) -> Result<Scope, FilterError> {
        match self.resolve(rule)? {
            Resolution::Identity => Ok(scope),
            Resolution::ScopeCall { name, args } => self.call_scope(name, scope, &args),
            Resolution::Filter { name, args } => self.apply_filter(scope, &name, &args),
            Resolution::Nested { rules, conjunction } => {
                let nested = self.compose(rules, conjunction)?;
                Ok(scope.merge(nested))
            }
        }
    }
}
