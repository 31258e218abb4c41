//! Schema definitions for fact templates.
//!
//! A template names a fact type and declares its slots. Each slot carries a
//! default value (which also fixes the slot's type) and an optional
//! enumerated domain of allowed values.

use std::collections::HashSet;
use std::sync::Arc;

use salience_foundation::{Error, ErrorKind, Result, Type, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Schema definition for a single slot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlotSchema {
    /// Slot name (e.g. `sbp`, `status`).
    pub name: Arc<str>,
    /// Value used when an assertion omits the slot.
    pub default: Value,
    /// Enumerated domain; `None` accepts any value of the slot's type.
    pub allowed: Option<Vec<Value>>,
}

impl SlotSchema {
    /// Creates a slot with the given default.
    #[must_use]
    pub fn new(name: impl AsRef<str>, default: impl Into<Value>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            default: default.into(),
            allowed: None,
        }
    }

    /// Creates a symbol slot restricted to `allowed`, defaulting to `default`.
    #[must_use]
    pub fn symbols(name: impl AsRef<str>, default: &str, allowed: &[&str]) -> Self {
        Self::new(name, default).with_allowed(allowed.iter().map(|s| Value::symbol(s)))
    }

    /// Restricts the slot to an enumerated set of values.
    #[must_use]
    pub fn with_allowed(mut self, allowed: impl IntoIterator<Item = Value>) -> Self {
        self.allowed = Some(allowed.into_iter().collect());
        self
    }

    /// Returns the slot's type (the type of its default).
    #[must_use]
    pub fn ty(&self) -> Type {
        self.default.value_type()
    }

    /// Returns true if `value` lies in the slot's enumerated domain.
    #[must_use]
    pub fn allows(&self, value: &Value) -> bool {
        self.allowed.as_ref().is_none_or(|set| set.contains(value))
    }
}

/// Schema definition for a fact template.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TemplateSchema {
    /// Template name (e.g. `circulation`).
    pub name: Arc<str>,
    /// Slots in declaration order.
    pub slots: Vec<SlotSchema>,
}

impl TemplateSchema {
    /// Creates a template with no slots.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            slots: Vec::new(),
        }
    }

    /// Adds a slot to the schema.
    #[must_use]
    pub fn with_slot(mut self, slot: SlotSchema) -> Self {
        self.slots.push(slot);
        self
    }

    /// Returns the slot schema by name.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<&SlotSchema> {
        self.slots.iter().find(|s| &*s.name == name)
    }

    /// Returns the declaration position of a slot.
    #[must_use]
    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| &*s.name == name)
    }

    /// Returns the slot defaults in declaration order.
    #[must_use]
    pub fn defaults(&self) -> Vec<Value> {
        self.slots.iter().map(|s| s.default.clone()).collect()
    }

    /// Checks the schema's internal invariants.
    ///
    /// # Errors
    /// Returns `DuplicateSlot` if two slots share a name, or `InvalidDefault`
    /// if a default lies outside its slot's allowed values.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for slot in &self.slots {
            if !seen.insert(&*slot.name) {
                return Err(Error::new(ErrorKind::DuplicateSlot {
                    template: self.name.to_string(),
                    slot: slot.name.to_string(),
                }));
            }
            if !slot.allows(&slot.default) {
                return Err(Error::new(ErrorKind::InvalidDefault {
                    template: self.name.to_string(),
                    slot: slot.name.to_string(),
                    default: slot.default.clone(),
                }));
            }
        }
        Ok(())
    }

    /// Checks a value against a slot's type and domain.
    ///
    /// # Errors
    /// Returns `UnknownSlot`, `SlotTypeMismatch`, or `DisallowedValue`.
    pub fn check_value(&self, slot: &str, value: &Value) -> Result<usize> {
        let index = self
            .slot_index(slot)
            .ok_or_else(|| Error::unknown_slot(&*self.name, slot))?;
        let schema = &self.slots[index];
        if schema.ty() != value.value_type() {
            return Err(Error::new(ErrorKind::SlotTypeMismatch {
                template: self.name.to_string(),
                slot: slot.to_string(),
                expected: schema.ty(),
                actual: value.value_type(),
            }));
        }
        if !schema.allows(value) {
            return Err(Error::new(ErrorKind::DisallowedValue {
                template: self.name.to_string(),
                slot: slot.to_string(),
                value: value.clone(),
            }));
        }
        Ok(index)
    }
}
