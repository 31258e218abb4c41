//! Error types for the Salience system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Load-time errors (template and rule definition) abort before a run starts;
//! run-time errors halt the fire cycle and carry the implicated rule/action.

use std::fmt;

use thiserror::Error;

use crate::types::Type;
use crate::value::Value;

/// The main error type for Salience operations.
#[derive(Debug, Clone, Error)]
#[error("{kind}{}", .context.as_ref().map(|c| format!(" {c}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    ///
    /// Context already present is kept; only unset fields are filled in, so
    /// the innermost (most precise) location wins.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(match self.context.take() {
            Some(existing) => existing.merge(context),
            None => context,
        });
        self
    }

    /// Creates a duplicate template error.
    #[must_use]
    pub fn duplicate_template(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateTemplate(name.into()))
    }

    /// Creates an unknown template error.
    #[must_use]
    pub fn unknown_template(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownTemplate(name.into()))
    }

    /// Creates an unknown slot error.
    #[must_use]
    pub fn unknown_slot(template: impl Into<String>, slot: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownSlot {
            template: template.into(),
            slot: slot.into(),
        })
    }

    /// Creates a predicate evaluation error.
    #[must_use]
    pub fn predicate(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PredicateEvaluation(message.into()))
    }

    /// Creates an unbound variable error.
    #[must_use]
    pub fn unbound_variable(var: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnboundVariable(var.into()))
    }

    /// Creates a semantic limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: SemanticLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Returns true for errors raised while loading templates and rules.
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::DuplicateTemplate(_)
                | ErrorKind::DuplicateSlot { .. }
                | ErrorKind::DuplicateRule(_)
                | ErrorKind::InvalidDefault { .. }
        ) || self.context.as_ref().is_some_and(|c| c.load_time)
    }

    /// Returns the name of the rule implicated in this error, if any.
    #[must_use]
    pub fn rule(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.rule.as_deref())
    }

    /// Returns the index of the action implicated in this error, if any.
    #[must_use]
    pub fn action(&self) -> Option<usize> {
        self.context.as_ref().and_then(|c| c.action)
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    /// A template with this name is already registered.
    #[error("duplicate template: {0}")]
    DuplicateTemplate(String),

    /// A template declares the same slot twice.
    #[error("duplicate slot {slot} in template {template}")]
    DuplicateSlot {
        /// The template being defined.
        template: String,
        /// The repeated slot name.
        slot: String,
    },

    /// A slot default is not among its own allowed values.
    #[error("default {default} of slot {slot} in template {template} is not an allowed value")]
    InvalidDefault {
        /// The template being defined.
        template: String,
        /// The offending slot.
        slot: String,
        /// The rejected default.
        default: Value,
    },

    /// A rule with this name is already loaded.
    #[error("duplicate rule: {0}")]
    DuplicateRule(String),

    /// Reference to a template that was never defined.
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    /// Reference to a slot the template does not declare.
    #[error("unknown slot {slot} in template {template}")]
    UnknownSlot {
        /// The template that was referenced.
        template: String,
        /// The slot name that was not found.
        slot: String,
    },

    /// A value does not have the slot's declared type.
    #[error("slot {template}.{slot} expects {expected}, got {actual}")]
    SlotTypeMismatch {
        /// The template that was referenced.
        template: String,
        /// The slot receiving the value.
        slot: String,
        /// The slot's type.
        expected: Type,
        /// The type of the rejected value.
        actual: Type,
    },

    /// A value outside the slot's enumerated domain.
    #[error("value {value} is not allowed in slot {template}.{slot}")]
    DisallowedValue {
        /// The template that was referenced.
        template: String,
        /// The slot receiving the value.
        slot: String,
        /// The rejected value.
        value: Value,
    },

    /// A slot test could not be evaluated (e.g. numeric comparison on a symbol).
    #[error("predicate evaluation failed: {0}")]
    PredicateEvaluation(String),

    /// A variable was referenced but never bound.
    #[error("unbound variable: ?{0}")]
    UnboundVariable(String),

    /// A shared variable was bound to values of incompatible types.
    #[error("unification conflict on ?{var}: {first} ({}) vs {second} ({})", .first.value_type(), .second.value_type())]
    UnificationConflict {
        /// The shared variable.
        var: String,
        /// The first binding.
        first: Value,
        /// The conflicting binding.
        second: Value,
    },

    /// The engine already ran to completion and cannot be resumed.
    #[error("run already completed")]
    RunCompleted,

    /// Semantic limit exceeded (kill switch triggered).
    #[error("limit exceeded: {0}")]
    LimitExceeded(SemanticLimit),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// I/O failure while reading or writing snapshots.
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Semantic limits (kill switches) that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticLimit {
    /// Maximum rule firings per run exceeded.
    MaxFirings {
        /// The configured limit.
        limit: usize,
        /// The rule whose firing crossed the limit.
        rule: Option<String>,
    },
}

impl fmt::Display for SemanticLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxFirings { limit, rule } => {
                write!(f, "max firings ({limit}) exceeded")?;
                if let Some(rule) = rule {
                    write!(f, " by rule {rule}")?;
                }
                Ok(())
            }
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Rule being loaded, matched, or fired.
    pub rule: Option<String>,
    /// Index of the action within the rule's action list.
    pub action: Option<usize>,
    /// Index of the condition within the rule's condition list.
    pub condition: Option<usize>,
    /// True if the error arose while loading the rule base.
    pub load_time: bool,
    /// Additional frames, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context naming a rule.
    #[must_use]
    pub fn rule(name: impl Into<String>) -> Self {
        Self::new().with_rule(name)
    }

    /// Sets the rule name.
    #[must_use]
    pub fn with_rule(mut self, name: impl Into<String>) -> Self {
        self.rule = Some(name.into());
        self
    }

    /// Sets the action index.
    #[must_use]
    pub fn with_action(mut self, index: usize) -> Self {
        self.action = Some(index);
        self
    }

    /// Sets the condition index.
    #[must_use]
    pub fn with_condition(mut self, index: usize) -> Self {
        self.condition = Some(index);
        self
    }

    /// Marks the context as belonging to rule-base loading.
    #[must_use]
    pub fn at_load(mut self) -> Self {
        self.load_time = true;
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }

    fn merge(mut self, outer: ErrorContext) -> Self {
        self.rule = self.rule.or(outer.rule);
        self.action = self.action.or(outer.action);
        self.condition = self.condition.or(outer.condition);
        self.load_time |= outer.load_time;
        self.stack.extend(outer.stack);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "in rule {rule}")?;
            if let Some(action) = self.action {
                write!(f, " action #{action}")?;
            }
            if let Some(condition) = self.condition {
                write!(f, " condition #{condition}")?;
            }
        }
        for frame in &self.stack {
            write!(f, " (in {frame})")?;
        }
        Ok(())
    }
}
