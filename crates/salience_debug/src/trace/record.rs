//! Trace event and record types.
//!
//! This module defines the events recorded while the engine runs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use salience_engine::EngineState;
use salience_foundation::{FactId, Value};

// =============================================================================
// Trace Event
// =============================================================================

/// Events recorded during a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum TraceEvent {
    /// The engine changed state.
    StateChange {
        /// The new state.
        state: EngineState,
    },

    /// An activation was accepted onto the agenda.
    ActivationQueued {
        /// The activated rule.
        rule: Arc<str>,
        /// Branch of the rule that matched.
        branch: usize,
        /// Rule salience.
        salience: i32,
        /// Matched facts.
        facts: Vec<FactId>,
    },

    /// A rule is about to execute its actions.
    RuleFiring {
        /// Position of the firing in the run.
        sequence: usize,
        /// The firing rule.
        rule: Arc<str>,
        /// Branch of the rule that matched.
        branch: usize,
        /// Matched facts.
        facts: Vec<FactId>,
        /// Variable bindings from the match.
        bindings: Vec<(String, Value)>,
    },

    /// A rule asserted a fact.
    FactAsserted {
        /// The asserting rule.
        rule: Arc<str>,
        /// The new fact.
        fact: FactId,
        /// Rendered fact.
        text: String,
    },

    /// A rule emitted a line.
    LineEmitted {
        /// The emitting rule.
        rule: Arc<str>,
        /// The line.
        line: String,
    },

    /// The run ended.
    RunHalted {
        /// Total firings.
        firings: usize,
        /// Error message if the run failed.
        error: Option<String>,
    },
}

impl TraceEvent {
    /// Returns a short name for the event type.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StateChange { .. } => "state-change",
            Self::ActivationQueued { .. } => "activation-queued",
            Self::RuleFiring { .. } => "rule-firing",
            Self::FactAsserted { .. } => "fact-asserted",
            Self::LineEmitted { .. } => "line-emitted",
            Self::RunHalted { .. } => "run-halted",
        }
    }

    /// Returns the rule this event concerns, if any.
    #[must_use]
    pub fn rule(&self) -> Option<&str> {
        match self {
            Self::ActivationQueued { rule, .. }
            | Self::RuleFiring { rule, .. }
            | Self::FactAsserted { rule, .. }
            | Self::LineEmitted { rule, .. } => Some(rule),
            Self::StateChange { .. } | Self::RunHalted { .. } => None,
        }
    }

    /// Returns true if this event is produced by a rule's actions.
    #[must_use]
    pub fn is_effect(&self) -> bool {
        matches!(self, Self::FactAsserted { .. } | Self::LineEmitted { .. })
    }
}

// =============================================================================
// Trace Record
// =============================================================================

/// A timestamped trace record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Unique record ID within the session.
    pub id: u64,
    /// Firing sequence the event belongs to; 0 before the first firing.
    pub cycle: usize,
    /// Timestamp in nanoseconds since the tracer was created.
    pub timestamp_ns: u64,
    /// The trace event.
    #[serde(flatten)]
    pub event: TraceEvent,
}

impl TraceRecord {
    /// Creates a new trace record.
    #[must_use]
    pub fn new(id: u64, cycle: usize, timestamp_ns: u64, event: TraceEvent) -> Self {
        Self {
            id,
            cycle,
            timestamp_ns,
            event,
        }
    }

    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}
