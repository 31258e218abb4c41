//! Facts and fact specifications.

use std::fmt;
use std::sync::Arc;

use salience_foundation::{FactId, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::schema::TemplateSchema;

/// An immutable, identified instance of a template.
///
/// Holds one value per template slot, in the template's declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fact {
    id: FactId,
    template: Arc<TemplateSchema>,
    values: Arc<[Value]>,
}

impl Fact {
    pub(crate) fn new(id: FactId, template: Arc<TemplateSchema>, values: Vec<Value>) -> Self {
        Self {
            id,
            template,
            values: values.into(),
        }
    }

    /// Returns the fact's identifier.
    #[must_use]
    pub fn id(&self) -> FactId {
        self.id
    }

    /// Returns the fact's template schema.
    #[must_use]
    pub fn template(&self) -> &Arc<TemplateSchema> {
        &self.template
    }

    /// Returns the template name.
    #[must_use]
    pub fn template_name(&self) -> &str {
        &self.template.name
    }

    /// Returns a slot value by name.
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<&Value> {
        self.template
            .slot_index(slot)
            .and_then(|index| self.values.get(index))
    }

    /// Returns a slot value by declaration position.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Iterates (slot name, value) pairs in declaration order.
    pub fn slots(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.template
            .slots
            .iter()
            .map(|s| &*s.name)
            .zip(self.values.iter())
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {}", self.id, self.template.name)?;
        for (slot, value) in self.slots() {
            write!(f, " ({slot} {value})")?;
        }
        write!(f, ")")
    }
}

/// A fact to be asserted: a template name plus slot overrides.
///
/// Slots not named here take the template's defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactSpec {
    /// Template name.
    pub template: String,
    /// Slot overrides in the order given.
    pub slots: Vec<(String, Value)>,
}

impl FactSpec {
    /// Creates a spec with no overrides.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            slots: Vec::new(),
        }
    }

    /// Adds a slot override.
    #[must_use]
    pub fn with(mut self, slot: impl Into<String>, value: impl Into<Value>) -> Self {
        self.slots.push((slot.into(), value.into()));
        self
    }
}
