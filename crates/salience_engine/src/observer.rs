//! Hooks into the fire cycle.
//!
//! An observer sees every state transition, queued activation, firing,
//! assertion, emitted line, and the final halt. All methods default to
//! no-ops, so an implementation only overrides what it records.

use salience_foundation::Error;
use salience_storage::Fact;

use crate::engine::EngineState;
use crate::rule::Activation;

/// Receives fire-cycle events.
pub trait FireObserver {
    /// The engine entered a new state.
    fn on_state(&mut self, _state: EngineState) {}

    /// An activation was accepted onto the agenda.
    fn on_activation(&mut self, _activation: &Activation) {}

    /// An activation was selected and is about to fire.
    fn on_fire(&mut self, _sequence: usize, _activation: &Activation) {}

    /// A rule asserted a fact.
    fn on_assert(&mut self, _rule: &str, _fact: &Fact) {}

    /// A rule emitted a line.
    fn on_emit(&mut self, _rule: &str, _line: &str) {}

    /// The run ended, normally (`None`) or on a fatal error.
    fn on_halt(&mut self, _firings: usize, _error: Option<&Error>) {}
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl FireObserver for NoopObserver {}

impl<T: FireObserver + ?Sized> FireObserver for &mut T {
    fn on_state(&mut self, state: EngineState) {
        (**self).on_state(state);
    }

    fn on_activation(&mut self, activation: &Activation) {
        (**self).on_activation(activation);
    }

    fn on_fire(&mut self, sequence: usize, activation: &Activation) {
        (**self).on_fire(sequence, activation);
    }

    fn on_assert(&mut self, rule: &str, fact: &Fact) {
        (**self).on_assert(rule, fact);
    }

    fn on_emit(&mut self, rule: &str, line: &str) {
        (**self).on_emit(rule, line);
    }

    fn on_halt(&mut self, firings: usize, error: Option<&Error>) {
        (**self).on_halt(firings, error);
    }
}
