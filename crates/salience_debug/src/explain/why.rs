//! The audit ("why") trail.
//!
//! Rule bases record their reasoning by asserting one explanatory fact per
//! firing, naming the rule and its justification. This module reads those
//! facts back in firing order and checks them against the firing log.

use std::collections::HashMap;
use std::fmt;

use salience_engine::{FiringRecord, RunOutcome};
use salience_foundation::{Error, FactId, Result, Value};
use salience_storage::{FactStore, TemplateRegistry};

// =============================================================================
// Audit Configuration
// =============================================================================

/// Which template and slots hold the explanations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditConfig {
    /// Template of the explanatory facts.
    pub template: String,
    /// Slot naming the rule that fired.
    pub rule_slot: String,
    /// Slot holding the justification.
    pub reason_slot: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            template: "why".to_string(),
            rule_slot: "rule".to_string(),
            reason_slot: "reason".to_string(),
        }
    }
}

impl AuditConfig {
    /// Creates the default configuration (`why`, `rule`, `reason`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the template.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Builder method to set the rule and reason slots.
    #[must_use]
    pub fn with_slots(mut self, rule: impl Into<String>, reason: impl Into<String>) -> Self {
        self.rule_slot = rule.into();
        self.reason_slot = reason.into();
        self
    }

    /// Checks the configuration against a rule base's templates.
    ///
    /// Returns false if the audit template is not defined, so there is
    /// nothing to audit.
    ///
    /// # Errors
    /// Returns `UnknownSlot` if the template exists but lacks the rule or
    /// reason slot.
    pub fn applies_to(&self, registry: &TemplateRegistry) -> Result<bool> {
        let Some(schema) = registry.get(&self.template) else {
            return Ok(false);
        };
        for slot in [&self.rule_slot, &self.reason_slot] {
            if schema.slot_index(slot).is_none() {
                return Err(Error::unknown_slot(&self.template, slot));
            }
        }
        Ok(true)
    }
}

// =============================================================================
// Why Trail
// =============================================================================

/// One explanatory fact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    /// The explanatory fact.
    pub fact: FactId,
    /// Rule named by the fact.
    pub rule: Value,
    /// Justification recorded by the fact.
    pub reason: Value,
    /// Firing that asserted the fact; `None` for initial facts.
    pub firing: Option<usize>,
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.firing {
            Some(sequence) => write!(f, "#{sequence} {}: {}", self.rule, self.reason),
            None => write!(f, "{} {}: {}", self.fact, self.rule, self.reason),
        }
    }
}

/// Explanatory facts in firing order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WhyTrail {
    entries: Vec<AuditEntry>,
}

impl WhyTrail {
    /// Reads the explanatory facts of a store, ordered by fact identifier.
    ///
    /// # Errors
    /// Returns `UnknownTemplate` or `UnknownSlot` if the configuration does
    /// not fit the store's templates.
    pub fn from_store(store: &FactStore, config: &AuditConfig) -> Result<Self> {
        let schema = store.registry().require(&config.template)?;
        let rule_slot = schema
            .slot_index(&config.rule_slot)
            .ok_or_else(|| Error::unknown_slot(&config.template, &config.rule_slot))?;
        let reason_slot = schema
            .slot_index(&config.reason_slot)
            .ok_or_else(|| Error::unknown_slot(&config.template, &config.reason_slot))?;

        let entries = store
            .facts_of(&config.template)
            .filter_map(|fact| {
                Some(AuditEntry {
                    fact: fact.id(),
                    rule: fact.value_at(rule_slot)?.clone(),
                    reason: fact.value_at(reason_slot)?.clone(),
                    firing: None,
                })
            })
            .collect();
        Ok(Self { entries })
    }

    /// Reads the explanatory facts of a run and links each to its firing.
    ///
    /// # Errors
    /// See [`WhyTrail::from_store`].
    pub fn from_outcome(outcome: &RunOutcome, config: &AuditConfig) -> Result<Self> {
        let mut trail = Self::from_store(&outcome.facts, config)?;
        let producers: HashMap<FactId, usize> = outcome
            .firings
            .iter()
            .flat_map(|firing| firing.asserted.iter().map(|id| (*id, firing.sequence)))
            .collect();
        for entry in &mut trail.entries {
            entry.firing = producers.get(&entry.fact).copied();
        }
        Ok(trail)
    }

    /// Returns the entries in firing order.
    #[must_use]
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the rule names, in order.
    #[must_use]
    pub fn rules(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.rule.to_string()).collect()
    }

    /// Returns the entries naming a rule.
    #[must_use]
    pub fn for_rule(&self, rule: &str) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.rule.as_symbol() == Some(rule))
            .collect()
    }

    /// Checks the trail against the firing log.
    #[must_use]
    pub fn check(&self, firings: &[FiringRecord]) -> AuditReport {
        let mut per_firing: HashMap<usize, Vec<&AuditEntry>> = HashMap::new();
        for entry in &self.entries {
            if let Some(sequence) = entry.firing {
                per_firing.entry(sequence).or_default().push(entry);
            }
        }

        let mut report = AuditReport {
            firings: firings.len(),
            explanations: self.entries.len(),
            ..AuditReport::default()
        };
        for firing in firings {
            let entries = per_firing.get(&firing.sequence).map_or(&[][..], Vec::as_slice);
            match entries {
                [] => report.unexplained.push(firing.sequence),
                [_] => {}
                _ => report.repeated.push(firing.sequence),
            }
            for entry in entries {
                if entry.rule.as_symbol() != Some(&*firing.rule) {
                    report.mislabelled.push((firing.sequence, entry.rule.to_string()));
                }
            }
        }
        report
    }
}

// =============================================================================
// Audit Report
// =============================================================================

/// Result of checking a why trail against a firing log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Firings in the log.
    pub firings: usize,
    /// Explanatory facts in the store.
    pub explanations: usize,
    /// Firings that asserted no explanation.
    pub unexplained: Vec<usize>,
    /// Firings that asserted more than one explanation.
    pub repeated: Vec<usize>,
    /// Explanations naming a rule other than the one that asserted them.
    pub mislabelled: Vec<(usize, String)>,
}

impl AuditReport {
    /// Returns true if every firing has exactly one correctly labelled
    /// explanation and there are no others.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.firings == self.explanations
            && self.unexplained.is_empty()
            && self.repeated.is_empty()
            && self.mislabelled.is_empty()
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} firing(s), {} explanation(s)",
            self.firings, self.explanations
        )?;
        if !self.unexplained.is_empty() {
            write!(f, "; unexplained {:?}", self.unexplained)?;
        }
        if !self.repeated.is_empty() {
            write!(f, "; repeated {:?}", self.repeated)?;
        }
        for (sequence, rule) in &self.mislabelled {
            write!(f, "; #{sequence} labelled {rule}")?;
        }
        Ok(())
    }
}
