//! Condition matching for the rule engine.
//!
//! Conditions are written against template and slot names and compiled (see
//! [`crate::rule::compiler`]) into slot-index tests. The matcher joins the
//! compiled conditions of one branch left to right, unifying shared
//! variables, and yields one [`Activation`] per consistent fact tuple.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use salience_foundation::{Error, ErrorContext, ErrorKind, FactId, Result, Value};
use salience_storage::{Fact, FactStore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::rule::{Activation, CompiledRule};

// =============================================================================
// Source Conditions
// =============================================================================

/// Constraint on one slot of a condition.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SlotConstraint {
    /// The slot must equal this value: `(status obstructed)`
    Literal(Value),
    /// Bind the slot to a variable: `(sbp ?sbp)`
    Bind(String),
    /// Bind, then require the test to hold: `(sbp ?sbp&:(< ?sbp 90))`
    Test {
        /// Variable receiving the slot value.
        var: String,
        /// Boolean test over the bindings.
        test: Expr,
    },
    /// The slot must equal one of these values: `(status patent|compromised)`
    OneOf(Vec<Value>),
}

/// A single pattern: a template plus slot constraints.
///
/// Slots not mentioned are unconstrained.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Condition {
    /// Template the fact must instantiate.
    pub template: String,
    /// Slot constraints, checked in order.
    pub slots: Vec<(String, SlotConstraint)>,
}

impl Condition {
    /// Creates an unconstrained condition on a template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            slots: Vec::new(),
        }
    }

    /// Adds a slot constraint.
    #[must_use]
    pub fn slot(mut self, slot: impl Into<String>, constraint: SlotConstraint) -> Self {
        self.slots.push((slot.into(), constraint));
        self
    }

    /// Requires a slot to equal a literal.
    #[must_use]
    pub fn eq(self, slot: impl Into<String>, value: impl Into<Value>) -> Self {
        self.slot(slot, SlotConstraint::Literal(value.into()))
    }

    /// Binds a slot to a variable.
    #[must_use]
    pub fn bind(self, slot: impl Into<String>, var: impl Into<String>) -> Self {
        self.slot(slot, SlotConstraint::Bind(var.into()))
    }

    /// Binds a slot to a variable and requires a test to hold.
    #[must_use]
    pub fn test(self, slot: impl Into<String>, var: impl Into<String>, test: Expr) -> Self {
        self.slot(
            slot,
            SlotConstraint::Test {
                var: var.into(),
                test,
            },
        )
    }

    /// Requires a slot to equal one of several values.
    #[must_use]
    pub fn one_of<V: Into<Value>>(
        self,
        slot: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.slot(
            slot,
            SlotConstraint::OneOf(values.into_iter().map(Into::into).collect()),
        )
    }
}

// =============================================================================
// Compiled Condition Types
// =============================================================================

/// What a compiled slot test checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotCheck {
    /// Value equality.
    Equals(Value),
    /// Membership in a set of values.
    OneOf(Vec<Value>),
    /// Bind (or unify with) a variable.
    Bind(String),
}

/// A slot test resolved to a slot position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledSlot {
    /// Position of the slot in the template.
    pub index: usize,
    /// Slot name, for diagnostics.
    pub name: Arc<str>,
    /// The check to perform.
    pub check: SlotCheck,
}

/// A condition compiled against its template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledCondition {
    /// Position of the source condition element in the rule.
    pub index: usize,
    /// Template name.
    pub template: Arc<str>,
    /// Slot checks in source order.
    pub slots: Vec<CompiledSlot>,
    /// Predicate tests whose variables are all bound by this condition.
    pub tests: Vec<Expr>,
}

impl CompiledCondition {
    /// Variables bound by this condition.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<&str> {
        self.slots
            .iter()
            .filter_map(|slot| match &slot.check {
                SlotCheck::Bind(var) => Some(var.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A predicate test that needs variables from more than one condition.
///
/// Evaluated once the whole branch has been joined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeferredTest {
    /// Condition element the test was written in.
    pub condition: usize,
    /// The test.
    pub expr: Expr,
}

/// One conjunctive alternative of a rule's left-hand side.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledBranch {
    /// Conditions, joined in order.
    pub conditions: Vec<CompiledCondition>,
    /// Cross-condition tests.
    pub deferred: Vec<DeferredTest>,
}

impl CompiledBranch {
    /// Variables bound anywhere in the branch.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<&str> {
        self.conditions
            .iter()
            .flat_map(CompiledCondition::variables)
            .collect()
    }

    /// Returns true if any condition of the branch is on this template.
    #[must_use]
    pub fn watches(&self, template: &str) -> bool {
        self.conditions.iter().any(|c| &*c.template == template)
    }
}

// =============================================================================
// Bindings
// =============================================================================

/// Variable bindings produced by a match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bindings {
    values: BTreeMap<String, Value>,
}

impl Bindings {
    /// Creates empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a variable, replacing any previous value.
    pub fn set(&mut self, var: impl Into<String>, value: Value) {
        self.values.insert(var.into(), value);
    }

    /// Gets a variable's value.
    #[must_use]
    pub fn get(&self, var: &str) -> Option<&Value> {
        self.values.get(var)
    }

    /// Returns true if the variable is bound.
    #[must_use]
    pub fn contains(&self, var: &str) -> bool {
        self.values.contains_key(var)
    }

    /// Iterates bindings in variable-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Binds a variable, or checks it against its existing binding.
    ///
    /// Returns `Ok(false)` when the existing value has the same type but
    /// differs: the candidate simply does not match.
    ///
    /// # Errors
    /// Returns `UnificationConflict` when the existing value has a different
    /// type. Such a rule can never match meaningfully.
    pub fn unify(&mut self, var: &str, value: &Value) -> Result<bool> {
        match self.values.get(var) {
            None => {
                self.values.insert(var.to_string(), value.clone());
                Ok(true)
            }
            Some(existing) if existing == value => Ok(true),
            Some(existing) if existing.value_type() == value.value_type() => Ok(false),
            Some(existing) => Err(Error::new(ErrorKind::UnificationConflict {
                var: var.to_string(),
                first: existing.clone(),
                second: value.clone(),
            })),
        }
    }

    /// Merges two binding sets, unifying shared variables.
    ///
    /// # Errors
    /// See [`Bindings::unify`].
    pub fn merge(&self, other: &Bindings) -> Result<Option<Bindings>> {
        let mut merged = self.clone();
        for (var, value) in &other.values {
            if !merged.unify(var, value)? {
                return Ok(None);
            }
        }
        Ok(Some(merged))
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (var, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "?{var}={value}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Pattern Matcher
// =============================================================================

/// Which facts a condition position may draw from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Window {
    All,
    Before(FactId),
    Exactly(FactId),
    UpTo(FactId),
}

impl Window {
    fn admits(self, id: FactId) -> bool {
        match self {
            Self::All => true,
            Self::Before(bound) => id < bound,
            Self::Exactly(bound) => id == bound,
            Self::UpTo(bound) => id <= bound,
        }
    }
}

type Partial = (Vec<FactId>, Bindings);

/// Matches compiled rules against a fact store.
///
/// Tuples are produced in lexicographic order of fact identifiers per
/// condition position, so results are deterministic for a given store.
pub struct PatternMatcher;

impl PatternMatcher {
    /// Finds every activation of a rule against the whole store.
    ///
    /// # Errors
    /// Returns predicate, unbound-variable, or unification errors, tagged
    /// with the condition being matched.
    pub fn match_rule(rule: &CompiledRule, store: &FactStore) -> Result<Vec<Activation>> {
        let mut out = Vec::new();
        for (branch_index, branch) in rule.branches.iter().enumerate() {
            let windows = vec![Window::All; branch.conditions.len()];
            Self::match_branch(rule, branch_index, branch, store, &windows, &mut out)?;
        }
        Ok(out)
    }

    /// Finds the activations of a rule that involve a newly asserted fact.
    ///
    /// Every returned tuple contains `fact`, and no tuple contains a fact
    /// newer than it. A tuple where `fact` occurs at several positions is
    /// produced once, from its first such position.
    ///
    /// # Errors
    /// See [`PatternMatcher::match_rule`].
    pub fn match_delta(
        rule: &CompiledRule,
        store: &FactStore,
        fact: FactId,
    ) -> Result<Vec<Activation>> {
        let mut out = Vec::new();
        let Some(new_fact) = store.get(fact) else {
            return Ok(out);
        };

        for (branch_index, branch) in rule.branches.iter().enumerate() {
            for (position, condition) in branch.conditions.iter().enumerate() {
                if *condition.template != *new_fact.template_name() {
                    continue;
                }
                let windows: Vec<_> = (0..branch.conditions.len())
                    .map(|j| match j.cmp(&position) {
                        std::cmp::Ordering::Less => Window::Before(fact),
                        std::cmp::Ordering::Equal => Window::Exactly(fact),
                        std::cmp::Ordering::Greater => Window::UpTo(fact),
                    })
                    .collect();
                Self::match_branch(rule, branch_index, branch, store, &windows, &mut out)?;
            }
        }
        Ok(out)
    }

    fn match_branch(
        rule: &CompiledRule,
        branch_index: usize,
        branch: &CompiledBranch,
        store: &FactStore,
        windows: &[Window],
        out: &mut Vec<Activation>,
    ) -> Result<()> {
        let mut partials: Vec<Partial> = vec![(Vec::new(), Bindings::new())];

        for (condition, window) in branch.conditions.iter().zip(windows) {
            let candidates = Self::candidates(condition, store, *window)
                .map_err(|e| e.with_context(ErrorContext::new().with_condition(condition.index)))?;
            if candidates.is_empty() {
                return Ok(());
            }

            let mut next = Vec::new();
            for (facts, bindings) in &partials {
                for (id, local) in &candidates {
                    let merged = bindings.merge(local).map_err(|e| {
                        e.with_context(ErrorContext::new().with_condition(condition.index))
                    })?;
                    if let Some(merged) = merged {
                        let mut facts = facts.clone();
                        facts.push(*id);
                        next.push((facts, merged));
                    }
                }
            }
            if next.is_empty() {
                return Ok(());
            }
            partials = next;
        }

        'tuples: for (facts, bindings) in partials {
            for test in &branch.deferred {
                let passed = test.expr.test(&bindings).map_err(|e| {
                    e.with_context(ErrorContext::new().with_condition(test.condition))
                })?;
                if !passed {
                    continue 'tuples;
                }
            }
            out.push(Activation::new(rule, branch_index, facts, bindings));
        }
        Ok(())
    }

    fn candidates(
        condition: &CompiledCondition,
        store: &FactStore,
        window: Window,
    ) -> Result<Vec<(FactId, Bindings)>> {
        let facts: Vec<&Fact> = match window {
            Window::Exactly(id) => store
                .get(id)
                .filter(|f| *f.template_name() == *condition.template)
                .into_iter()
                .collect(),
            _ => store
                .facts_of(&condition.template)
                .take_while(|f| window.admits(f.id()))
                .collect(),
        };

        let mut out = Vec::with_capacity(facts.len());
        for fact in facts {
            if let Some(bindings) = Self::filter_fact(condition, fact)? {
                out.push((fact.id(), bindings));
            }
        }
        Ok(out)
    }

    /// Tests a single fact against a condition.
    ///
    /// Returns the condition's local bindings if the fact satisfies every
    /// slot check and every local predicate test.
    ///
    /// # Errors
    /// Returns predicate or unification errors.
    pub fn filter_fact(condition: &CompiledCondition, fact: &Fact) -> Result<Option<Bindings>> {
        let mut bindings = Bindings::new();
        for slot in &condition.slots {
            let Some(value) = fact.value_at(slot.index) else {
                return Ok(None);
            };
            let matched = match &slot.check {
                SlotCheck::Equals(expected) => value == expected,
                SlotCheck::OneOf(options) => options.contains(value),
                SlotCheck::Bind(var) => bindings.unify(var, value)?,
            };
            if !matched {
                return Ok(None);
            }
        }
        for test in &condition.tests {
            if !test.test(&bindings)? {
                return Ok(None);
            }
        }
        Ok(Some(bindings))
    }
}
