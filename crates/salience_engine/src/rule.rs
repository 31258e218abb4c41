//! Production rules and rule bases.
//!
//! A [`RuleDef`] is the declarative form of a rule: a name, a salience, a
//! list of condition elements, and a list of actions. Rules are compiled by
//! [`compiler::RuleCompiler`] into [`CompiledRule`]s whose left-hand side is
//! expanded into disjunctive normal form: one [`CompiledBranch`] per
//! combination of `or` alternatives.

pub mod compiler;

use std::fmt;
use std::sync::Arc;

use salience_foundation::FactId;
use salience_storage::{FactSpec, TemplateSchema};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::pattern::{Bindings, CompiledBranch, Condition};

// =============================================================================
// Rule Definitions
// =============================================================================

/// One element of a rule's left-hand side.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConditionElement {
    /// A single pattern that must match.
    Pattern(Condition),
    /// Alternatives; each is a conjunction of patterns.
    Or(Vec<Vec<Condition>>),
}

impl From<Condition> for ConditionElement {
    fn from(condition: Condition) -> Self {
        Self::Pattern(condition)
    }
}

/// A rule as written in a rule base.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleDef {
    /// Unique rule name.
    pub name: String,
    /// Priority; higher fires first.
    pub salience: i32,
    /// Left-hand side, all elements must hold.
    pub conditions: Vec<ConditionElement>,
    /// Right-hand side, executed in order.
    pub actions: Vec<Action>,
}

impl RuleDef {
    /// Creates a rule with salience 0, no conditions, and no actions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            salience: 0,
            conditions: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Sets the salience.
    #[must_use]
    pub fn salience(mut self, salience: i32) -> Self {
        self.salience = salience;
        self
    }

    /// Adds a condition element.
    #[must_use]
    pub fn when(mut self, element: impl Into<ConditionElement>) -> Self {
        self.conditions.push(element.into());
        self
    }

    /// Adds an `or` element over the given alternatives.
    #[must_use]
    pub fn when_any(mut self, alternatives: impl IntoIterator<Item = Vec<Condition>>) -> Self {
        self.conditions
            .push(ConditionElement::Or(alternatives.into_iter().collect()));
        self
    }

    /// Appends an action.
    #[must_use]
    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

/// Templates and rules loaded together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleBase {
    /// Templates, in definition order.
    pub templates: Vec<TemplateSchema>,
    /// Rules, in definition order.
    pub rules: Vec<RuleDef>,
}

impl RuleBase {
    /// Creates an empty rule base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a template.
    #[must_use]
    pub fn template(mut self, schema: TemplateSchema) -> Self {
        self.templates.push(schema);
        self
    }

    /// Adds a rule.
    #[must_use]
    pub fn rule(mut self, rule: RuleDef) -> Self {
        self.rules.push(rule);
        self
    }
}

/// A rule base together with the facts to assert before running.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scenario {
    /// Initial facts, asserted in order.
    pub facts: Vec<FactSpec>,
}

impl Scenario {
    /// Creates an empty scenario.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an initial fact.
    #[must_use]
    pub fn fact(mut self, spec: FactSpec) -> Self {
        self.facts.push(spec);
        self
    }
}

// =============================================================================
// Compiled Rules
// =============================================================================

/// A rule ready for matching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledRule {
    /// Rule name.
    pub name: Arc<str>,
    /// Position in the rule base.
    pub index: usize,
    /// Priority; higher fires first.
    pub salience: i32,
    /// DNF branches; a rule without `or` elements has exactly one.
    pub branches: Vec<CompiledBranch>,
    /// Actions, executed in order when the rule fires.
    pub actions: Vec<Action>,
}

impl CompiledRule {
    /// Returns true if a fact of this template could extend a match.
    #[must_use]
    pub fn watches(&self, template: &str) -> bool {
        self.branches.iter().any(|b| b.watches(template))
    }
}

// =============================================================================
// Activations
// =============================================================================

/// Identity of an activation for refraction and duplicate suppression.
///
/// Distinct `or` branches matching the same facts are distinct activations:
/// a rule with N alternatives behaves as N rules sharing a name, so it can
/// fire once per satisfied branch. Identity is deliberately (rule, branch,
/// facts) rather than (rule, facts).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActivationKey {
    /// Rule position in the rule base.
    pub rule: usize,
    /// Branch within the rule.
    pub branch: usize,
    /// Matched facts, one per condition, in condition order.
    pub facts: Vec<FactId>,
}

/// A rule instantiation: a rule branch paired with a matching fact tuple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activation {
    /// Rule name.
    pub rule: Arc<str>,
    /// Rule position in the rule base.
    pub rule_index: usize,
    /// Branch within the rule.
    pub branch: usize,
    /// Rule salience.
    pub salience: i32,
    /// Matched facts, in condition order.
    pub facts: Vec<FactId>,
    /// Variable bindings from the match.
    pub bindings: Bindings,
}

impl Activation {
    /// Creates an activation of a rule branch.
    #[must_use]
    pub fn new(rule: &CompiledRule, branch: usize, facts: Vec<FactId>, bindings: Bindings) -> Self {
        Self {
            rule: rule.name.clone(),
            rule_index: rule.index,
            branch,
            salience: rule.salience,
            facts,
            bindings,
        }
    }

    /// Returns the refraction key.
    #[must_use]
    pub fn key(&self) -> ActivationKey {
        ActivationKey {
            rule: self.rule_index,
            branch: self.branch,
            facts: self.facts.clone(),
        }
    }

    /// Returns the most recent fact in the tuple, or [`FactId::NONE`] for a
    /// rule with no conditions.
    #[must_use]
    pub fn recency(&self) -> FactId {
        self.facts.iter().copied().max().unwrap_or(FactId::NONE)
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rule)?;
        if self.branch > 0 {
            write!(f, "#{}", self.branch)?;
        }
        write!(f, ":")?;
        for id in &self.facts {
            write!(f, " {id}")?;
        }
        if self.facts.is_empty() {
            write!(f, " *")?;
        }
        Ok(())
    }
}
