//! Append-only fact store.
//!
//! The `FactStore` owns the template registry and the full assertion history.
//! It uses persistent data structures, so cloning a store to hand back a
//! snapshot is O(1) and shares structure with the live store.

use std::sync::Arc;

use salience_foundation::{FactId, Result, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::fact::{Fact, FactSpec};
use crate::registry::TemplateRegistry;
use crate::schema::TemplateSchema;

/// Ordered, append-only collection of asserted facts.
///
/// Facts are never modified or removed; identifiers are assigned in strictly
/// increasing order starting at `f-1`.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactStore {
    registry: TemplateRegistry,
    /// Facts in assertion order; `facts[i]` has id `i + 1`.
    facts: im::Vector<Fact>,
    /// Fact positions per template, ascending.
    by_template: im::OrdMap<Arc<str>, im::Vector<usize>>,
}

impl FactStore {
    /// Creates an empty store with no templates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store over an existing registry.
    #[must_use]
    pub fn with_registry(registry: TemplateRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Returns the template registry.
    #[must_use]
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Defines a template in the store's registry.
    ///
    /// # Errors
    /// Returns `DuplicateTemplate` if the name is already registered.
    pub fn define_template(&mut self, schema: TemplateSchema) -> Result<Arc<TemplateSchema>> {
        self.registry.define_template(schema)
    }

    /// Asserts a new fact.
    ///
    /// Slots not provided take the template's defaults. If a slot is named
    /// more than once, the last value wins.
    ///
    /// # Errors
    /// Returns `UnknownTemplate`, `UnknownSlot`, `SlotTypeMismatch`, or
    /// `DisallowedValue`. A failed assertion leaves the store unchanged.
    pub fn assert_fact(&mut self, template: &str, provided: &[(&str, Value)]) -> Result<FactId> {
        self.insert(
            template,
            provided.iter().map(|(slot, value)| (*slot, value.clone())),
        )
    }

    /// Asserts a fact described by a [`FactSpec`].
    ///
    /// # Errors
    /// See [`FactStore::assert_fact`].
    pub fn assert_spec(&mut self, spec: &FactSpec) -> Result<FactId> {
        self.insert(
            &spec.template,
            spec.slots.iter().map(|(slot, value)| (slot.as_str(), value.clone())),
        )
    }

    fn insert<'a>(
        &mut self,
        template: &str,
        provided: impl Iterator<Item = (&'a str, Value)>,
    ) -> Result<FactId> {
        let schema = self.registry.require(template)?.clone();

        let mut values = schema.defaults();
        for (slot, value) in provided {
            let index = schema.check_value(slot, &value)?;
            values[index] = value;
        }

        let id = self.last_id().next();
        let position = self.facts.len();
        self.facts.push_back(Fact::new(id, schema.clone(), values));
        self.by_template
            .entry(schema.name.clone())
            .or_insert_with(im::Vector::new)
            .push_back(position);
        Ok(id)
    }

    /// Returns a fact by identifier.
    #[must_use]
    pub fn get(&self, id: FactId) -> Option<&Fact> {
        let index = usize::try_from(id.index()).ok()?.checked_sub(1)?;
        self.facts.get(index)
    }

    /// Returns the identifier of the most recently asserted fact, or
    /// [`FactId::NONE`] for an empty store.
    #[must_use]
    pub fn last_id(&self) -> FactId {
        self.facts.back().map_or(FactId::NONE, Fact::id)
    }

    /// Returns a restartable iterator over the full history, ordered by id.
    #[must_use]
    pub fn all_facts(&self) -> FactIter<'_> {
        FactIter {
            store: self,
            next: 0,
            end: self.facts.len(),
        }
    }

    /// Iterates facts of one template, ordered by id.
    pub fn facts_of<'a>(&'a self, template: &str) -> impl Iterator<Item = &'a Fact> + 'a {
        self.by_template
            .get(template)
            .into_iter()
            .flat_map(|positions| positions.iter())
            .filter_map(|&position| self.facts.get(position))
    }

    /// Returns the number of facts asserted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Returns true if no facts have been asserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// Iterator over a store's facts in identifier order.
///
/// The iterator is lazy and finite: it yields the facts present when it was
/// created. Clone it (or call [`FactStore::all_facts`] again) to restart.
#[derive(Clone, Debug)]
pub struct FactIter<'a> {
    store: &'a FactStore,
    next: usize,
    end: usize,
}

impl<'a> Iterator for FactIter<'a> {
    type Item = &'a Fact;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let fact = self.store.facts.get(self.next);
        self.next += 1;
        fact
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FactIter<'_> {}
