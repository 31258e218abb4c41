//! Rule compiler - resolves rule definitions against the template registry.
//!
//! Compilation checks every condition at load time (template and slot names,
//! literal types and domains), expands `or` elements into DNF branches, and
//! sorts each predicate test into the condition that binds all of its
//! variables or, failing that, the branch's deferred tests.

use std::collections::{BTreeSet, HashSet};

use log::trace;
use salience_foundation::{Error, ErrorContext, ErrorKind, Result};
use salience_storage::TemplateRegistry;

use crate::expr::Expr;
use crate::pattern::{
    CompiledBranch, CompiledCondition, CompiledSlot, Condition, DeferredTest, SlotCheck,
    SlotConstraint,
};
use crate::rule::{CompiledRule, ConditionElement, RuleDef};

/// A compiled condition plus the tests it could not evaluate on its own.
type Piece = (CompiledCondition, Vec<Expr>);

enum CompiledElement {
    One(Piece),
    Any(Vec<Vec<Piece>>),
}

/// Compiles rule definitions into executable rules.
pub struct RuleCompiler;

impl RuleCompiler {
    /// Compiles every rule of a rule base, in order.
    ///
    /// # Errors
    /// Returns `DuplicateRule` if two rules share a name, or the first
    /// compilation error.
    pub fn compile_all(rules: &[RuleDef], registry: &TemplateRegistry) -> Result<Vec<CompiledRule>> {
        let mut names = HashSet::new();
        let mut compiled = Vec::with_capacity(rules.len());
        for (index, def) in rules.iter().enumerate() {
            if !names.insert(def.name.as_str()) {
                return Err(Error::new(ErrorKind::DuplicateRule(def.name.clone()))
                    .with_context(ErrorContext::rule(&def.name).at_load()));
            }
            compiled.push(Self::compile(def, index, registry)?);
        }
        Ok(compiled)
    }

    /// Compiles one rule.
    ///
    /// # Errors
    /// Returns `UnknownTemplate`, `UnknownSlot`, `SlotTypeMismatch`,
    /// `DisallowedValue`, or `UnboundVariable` (a test referencing a variable
    /// its branch never binds), tagged with the rule and condition.
    pub fn compile(def: &RuleDef, index: usize, registry: &TemplateRegistry) -> Result<CompiledRule> {
        let context = |condition: usize| {
            ErrorContext::rule(&def.name)
                .with_condition(condition)
                .at_load()
        };

        let mut elements = Vec::with_capacity(def.conditions.len());
        for (position, element) in def.conditions.iter().enumerate() {
            let compiled = match element {
                ConditionElement::Pattern(condition) => CompiledElement::One(
                    Self::compile_condition(condition, position, registry)
                        .map_err(|e| e.with_context(context(position)))?,
                ),
                ConditionElement::Or(alternatives) => {
                    let mut compiled = Vec::with_capacity(alternatives.len());
                    for alternative in alternatives {
                        let pieces = alternative
                            .iter()
                            .map(|c| Self::compile_condition(c, position, registry))
                            .collect::<Result<Vec<_>>>()
                            .map_err(|e| e.with_context(context(position)))?;
                        compiled.push(pieces);
                    }
                    CompiledElement::Any(compiled)
                }
            };
            elements.push(compiled);
        }

        let branches = Self::expand(&elements)
            .into_iter()
            .map(|pieces| {
                Self::build_branch(&pieces).map_err(|(condition, e)| e.with_context(context(condition)))
            })
            .collect::<Result<Vec<_>>>()?;

        trace!(
            "compiled rule {} (salience {}) into {} branch(es)",
            def.name,
            def.salience,
            branches.len()
        );

        Ok(CompiledRule {
            name: def.name.as_str().into(),
            index,
            salience: def.salience,
            branches,
            actions: def.actions.clone(),
        })
    }

    fn compile_condition(
        condition: &Condition,
        position: usize,
        registry: &TemplateRegistry,
    ) -> Result<Piece> {
        let schema = registry.require(&condition.template)?;

        let mut slots = Vec::with_capacity(condition.slots.len());
        let mut tests = Vec::new();
        for (slot, constraint) in &condition.slots {
            let index = schema
                .slot_index(slot)
                .ok_or_else(|| Error::unknown_slot(&*schema.name, slot))?;
            let check = match constraint {
                SlotConstraint::Literal(value) => {
                    schema.check_value(slot, value)?;
                    SlotCheck::Equals(value.clone())
                }
                SlotConstraint::OneOf(values) => {
                    for value in values {
                        schema.check_value(slot, value)?;
                    }
                    SlotCheck::OneOf(values.clone())
                }
                SlotConstraint::Bind(var) => SlotCheck::Bind(var.clone()),
                SlotConstraint::Test { var, test } => {
                    tests.push(test.clone());
                    SlotCheck::Bind(var.clone())
                }
            };
            slots.push(CompiledSlot {
                index,
                name: schema.slots[index].name.clone(),
                check,
            });
        }

        let mut compiled = CompiledCondition {
            index: position,
            template: schema.name.clone(),
            slots,
            tests: Vec::new(),
        };
        let local: BTreeSet<String> = compiled.variables().into_iter().map(String::from).collect();
        let (local_tests, pending): (Vec<_>, Vec<_>) = tests
            .into_iter()
            .partition(|test| test.variables().iter().all(|v| local.contains(*v)));
        compiled.tests = local_tests;
        Ok((compiled, pending))
    }

    /// Cross product of `or` alternatives, in element then alternative order.
    fn expand(elements: &[CompiledElement]) -> Vec<Vec<&Piece>> {
        let mut branches: Vec<Vec<&Piece>> = vec![Vec::new()];
        for element in elements {
            match element {
                CompiledElement::One(piece) => {
                    for branch in &mut branches {
                        branch.push(piece);
                    }
                }
                CompiledElement::Any(alternatives) => {
                    branches = branches
                        .iter()
                        .flat_map(|branch| {
                            alternatives.iter().map(move |alternative| {
                                let mut extended = branch.clone();
                                extended.extend(alternative.iter());
                                extended
                            })
                        })
                        .collect();
                }
            }
        }
        branches
    }

    fn build_branch(pieces: &[&Piece]) -> std::result::Result<CompiledBranch, (usize, Error)> {
        let mut branch = CompiledBranch {
            conditions: pieces.iter().map(|(c, _)| c.clone()).collect(),
            deferred: Vec::new(),
        };

        let bound: BTreeSet<String> = branch.variables().into_iter().map(String::from).collect();
        for (condition, pending) in pieces {
            for expr in pending {
                if let Some(missing) = expr.variables().into_iter().find(|v| !bound.contains(*v)) {
                    return Err((condition.index, Error::unbound_variable(missing)));
                }
                branch.deferred.push(DeferredTest {
                    condition: condition.index,
                    expr: expr.clone(),
                });
            }
        }
        Ok(branch)
    }
}
