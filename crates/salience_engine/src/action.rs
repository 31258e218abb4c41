//! Rule actions and their execution.
//!
//! Actions are the right-hand side of a rule. They are executed in order
//! against the bindings of the activation being fired: `Emit` appends a line
//! to the output stream, `Assert` adds a fact to the store.

use std::fmt::Write as _;

use salience_foundation::{Error, FactId, Result, Value};
use salience_storage::FactStore;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pattern::Bindings;

/// A piece of an emitted line.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TextPart {
    /// Literal text.
    Text(String),
    /// The value of a bound variable.
    Var(String),
}

/// Where an asserted slot's value comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SlotSource {
    /// A constant.
    Literal(Value),
    /// A bound variable.
    Var(String),
}

impl SlotSource {
    /// Reads a bound variable.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    fn resolve(&self, bindings: &Bindings) -> Result<Value> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Var(name) => bindings
                .get(name)
                .cloned()
                .ok_or_else(|| Error::unbound_variable(name)),
        }
    }
}

impl From<Value> for SlotSource {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for SlotSource {
    fn from(symbol: &str) -> Self {
        Self::Literal(Value::symbol(symbol))
    }
}

impl From<i64> for SlotSource {
    fn from(n: i64) -> Self {
        Self::Literal(Value::Int(n))
    }
}

impl From<i32> for SlotSource {
    fn from(n: i32) -> Self {
        Self::Literal(Value::from(n))
    }
}

impl From<bool> for SlotSource {
    fn from(b: bool) -> Self {
        Self::Literal(Value::Bool(b))
    }
}

/// A rule action.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Action {
    /// Append one line to the output stream.
    Emit(Vec<TextPart>),
    /// Assert a new fact.
    Assert {
        /// Template name.
        template: String,
        /// Slot values; unlisted slots take their defaults.
        slots: Vec<(String, SlotSource)>,
    },
}

impl Action {
    /// Emits a fixed line.
    #[must_use]
    pub fn emit(text: impl Into<String>) -> Self {
        Self::Emit(vec![TextPart::Text(text.into())])
    }

    /// Emits a line assembled from text and variables.
    #[must_use]
    pub fn emit_parts(parts: impl IntoIterator<Item = TextPart>) -> Self {
        Self::Emit(parts.into_iter().collect())
    }

    /// Asserts a fact of the given template.
    #[must_use]
    pub fn assert<S: Into<SlotSource>>(
        template: impl Into<String>,
        slots: impl IntoIterator<Item = (&'static str, S)>,
    ) -> Self {
        Self::Assert {
            template: template.into(),
            slots: slots
                .into_iter()
                .map(|(slot, source)| (slot.to_string(), source.into()))
                .collect(),
        }
    }
}

/// What an executed action produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionEffect {
    /// A line was emitted.
    Emitted(String),
    /// A fact was asserted.
    Asserted(FactId),
}

/// Executes actions against the fact store and output stream.
pub struct ActionExecutor<'a> {
    store: &'a mut FactStore,
    output: &'a mut Vec<String>,
}

impl<'a> ActionExecutor<'a> {
    /// Creates an executor over a store and output stream.
    pub fn new(store: &'a mut FactStore, output: &'a mut Vec<String>) -> Self {
        Self { store, output }
    }

    /// Returns the fact store.
    #[must_use]
    pub fn store(&self) -> &FactStore {
        self.store
    }

    /// Executes one action.
    ///
    /// # Errors
    /// Returns `UnboundVariable` if the action reads a variable the match did
    /// not bind, or the store's error if an assertion is invalid. Nothing is
    /// emitted or asserted on error.
    pub fn execute(&mut self, action: &Action, bindings: &Bindings) -> Result<ActionEffect> {
        match action {
            Action::Emit(parts) => {
                let line = render(parts, bindings)?;
                self.output.push(line.clone());
                Ok(ActionEffect::Emitted(line))
            }
            Action::Assert { template, slots } => {
                let values = slots
                    .iter()
                    .map(|(slot, source)| Ok((slot.as_str(), source.resolve(bindings)?)))
                    .collect::<Result<Vec<_>>>()?;
                self.store
                    .assert_fact(template, &values)
                    .map(ActionEffect::Asserted)
            }
        }
    }
}

fn render(parts: &[TextPart], bindings: &Bindings) -> Result<String> {
    let mut line = String::new();
    for part in parts {
        match part {
            TextPart::Text(text) => line.push_str(text),
            TextPart::Var(name) => {
                let value = bindings
                    .get(name)
                    .ok_or_else(|| Error::unbound_variable(name))?;
                let _ = write!(line, "{value}");
            }
        }
    }
    Ok(line)
}
