//! Pattern matching, agenda, and fire cycle for Salience.
//!
//! This crate provides:
//! - [`RuleBase`] / [`RuleDef`] - Declarative templates and production rules
//! - [`RuleCompiler`] - Load-time validation and DNF expansion of rules
//! - [`PatternMatcher`] - Full and incremental (delta) matching
//! - [`Agenda`] - Salience/recency ordering with refraction
//! - [`ActionExecutor`] - `Emit` and `Assert` actions
//! - [`Engine`] - The forward-chaining fire cycle

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod action;
pub mod agenda;
pub mod config;
pub mod engine;
pub mod expr;
pub mod observer;
pub mod pattern;
pub mod rule;

pub use action::{Action, ActionEffect, ActionExecutor, SlotSource, TextPart};
pub use agenda::Agenda;
pub use config::{DEFAULT_MAX_FIRINGS, EngineConfig, MatchMode};
pub use engine::{Engine, EngineState, FiringRecord, RunOutcome, RunSummary};
pub use expr::{CmpOp, Expr};
pub use observer::{FireObserver, NoopObserver};
pub use pattern::{
    Bindings, CompiledBranch, CompiledCondition, CompiledSlot, Condition, DeferredTest,
    PatternMatcher, SlotCheck, SlotConstraint,
};
pub use rule::compiler::RuleCompiler;
pub use rule::{Activation, ActivationKey, CompiledRule, ConditionElement, RuleBase, RuleDef, Scenario};
