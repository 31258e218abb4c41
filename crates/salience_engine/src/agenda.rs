//! The agenda: pending activations in firing order.
//!
//! Activations are ordered by salience (highest first), then recency (the
//! newest fact in the tuple, newest first), then insertion order. Each
//! activation key is accepted at most once per run, so a rule never fires
//! twice on the same facts (refraction).

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use salience_foundation::FactId;

use crate::rule::{Activation, ActivationKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Priority {
    salience: Reverse<i32>,
    recency: Reverse<FactId>,
    sequence: u64,
}

/// Pending activations plus the refraction memory.
#[derive(Clone, Debug, Default)]
pub struct Agenda {
    pending: BTreeMap<Priority, Activation>,
    /// Every key ever accepted, pending or fired.
    seen: HashSet<ActivationKey>,
    next_sequence: u64,
    fired: usize,
}

impl Agenda {
    /// Creates an empty agenda.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an activation.
    ///
    /// Returns false, leaving the agenda unchanged, if an activation with
    /// the same key is already pending or has already been selected.
    pub fn push(&mut self, activation: Activation) -> bool {
        if !self.seen.insert(activation.key()) {
            return false;
        }
        let priority = Priority {
            salience: Reverse(activation.salience),
            recency: Reverse(activation.recency()),
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.pending.insert(priority, activation);
        true
    }

    /// Removes and returns the highest-priority activation, or `None` when
    /// the agenda is empty.
    pub fn select_next(&mut self) -> Option<Activation> {
        let (_, activation) = self.pending.pop_first()?;
        self.fired += 1;
        Some(activation)
    }

    /// Returns the activation [`Agenda::select_next`] would return.
    #[must_use]
    pub fn peek(&self) -> Option<&Activation> {
        self.pending.values().next()
    }

    /// Iterates pending activations in firing order.
    pub fn activations(&self) -> impl Iterator<Item = &Activation> {
        self.pending.values()
    }

    /// Returns true if this key was ever accepted.
    #[must_use]
    pub fn has_seen(&self, key: &ActivationKey) -> bool {
        self.seen.contains(key)
    }

    /// Returns the number of activations selected so far.
    #[must_use]
    pub fn selected(&self) -> usize {
        self.fired
    }

    /// Returns the number of pending activations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
