//! Causal chains: which firings led to a fact.
//!
//! A fact asserted by a rule was caused by that firing; the firing in turn
//! was caused by the facts it matched. Following those links backwards from
//! a fact ends at the initial scenario facts.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use salience_engine::{Bindings, FiringRecord, RunOutcome};
use salience_foundation::FactId;

// =============================================================================
// Causal Link
// =============================================================================

/// A firing that contributed to a fact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CausalLink {
    /// Position of the firing in the run.
    pub sequence: usize,
    /// The rule that fired.
    pub rule: Arc<str>,
    /// Branch of the rule that matched.
    pub branch: usize,
    /// Facts the firing matched.
    pub matched: Vec<FactId>,
    /// Bindings the actions ran with.
    pub bindings: Bindings,
}

impl CausalLink {
    fn from_firing(firing: &FiringRecord) -> Self {
        Self {
            sequence: firing.sequence,
            rule: firing.rule.clone(),
            branch: firing.branch,
            matched: firing.facts.clone(),
            bindings: firing.bindings.clone(),
        }
    }
}

impl fmt::Display for CausalLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.sequence, self.rule)?;
        for id in &self.matched {
            write!(f, " {id}")?;
        }
        if !self.bindings.is_empty() {
            write!(f, " {{{}}}", self.bindings)?;
        }
        Ok(())
    }
}

// =============================================================================
// Causal Chain
// =============================================================================

/// Firings that led to a fact, immediate cause first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CausalChain {
    /// The fact being explained.
    pub fact: FactId,
    /// The links, breadth-first from the fact.
    pub links: Vec<CausalLink>,
    /// Initial facts the chain bottoms out in.
    pub roots: Vec<FactId>,
    /// True if the chain was cut short by the depth limit.
    pub truncated: bool,
}

impl CausalChain {
    /// Returns the number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns true if the fact was not produced by any firing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Returns the firing that asserted the fact.
    #[must_use]
    pub fn immediate_cause(&self) -> Option<&CausalLink> {
        self.links.first()
    }
}

// =============================================================================
// Why Query
// =============================================================================

/// Answers "why does this fact exist?" over a finished run.
pub struct WhyQuery<'a> {
    outcome: &'a RunOutcome,
    producers: HashMap<FactId, usize>,
}

impl<'a> WhyQuery<'a> {
    /// Indexes a run's firing log by asserted fact.
    #[must_use]
    pub fn new(outcome: &'a RunOutcome) -> Self {
        let producers = outcome
            .firings
            .iter()
            .enumerate()
            .flat_map(|(index, firing)| firing.asserted.iter().map(move |id| (*id, index)))
            .collect();
        Self { outcome, producers }
    }

    /// Returns the firing that asserted a fact.
    #[must_use]
    pub fn producer(&self, fact: FactId) -> Option<&'a FiringRecord> {
        self.producers
            .get(&fact)
            .and_then(|&index| self.outcome.firings.get(index))
    }

    /// Returns the immediate cause of a fact only.
    #[must_use]
    pub fn why(&self, fact: FactId) -> CausalChain {
        self.why_depth(fact, 1)
    }

    /// Follows causes back from a fact, up to `depth` firings.
    #[must_use]
    pub fn why_depth(&self, fact: FactId, depth: usize) -> CausalChain {
        let mut chain = CausalChain {
            fact,
            ..CausalChain::default()
        };
        let mut queue = VecDeque::from([fact]);
        let mut seen_facts = HashSet::from([fact]);
        let mut seen_firings = HashSet::new();

        while let Some(current) = queue.pop_front() {
            let Some(firing) = self.producer(current) else {
                if current != fact {
                    chain.roots.push(current);
                }
                continue;
            };
            if !seen_firings.insert(firing.sequence) {
                continue;
            }
            if chain.links.len() == depth {
                chain.truncated = true;
                break;
            }
            chain.links.push(CausalLink::from_firing(firing));
            for id in &firing.facts {
                if seen_facts.insert(*id) {
                    queue.push_back(*id);
                }
            }
        }

        chain.roots.sort();
        chain
    }
}
