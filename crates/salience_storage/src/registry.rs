//! Registry of fact templates.

use std::sync::Arc;

use salience_foundation::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::schema::TemplateSchema;

/// Holds every template defined at load time.
///
/// Templates are immutable once defined; cloning the registry is O(1).
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TemplateRegistry {
    /// Templates keyed by name.
    templates: im::OrdMap<Arc<str>, Arc<TemplateSchema>>,
    /// Names in definition order.
    order: im::Vector<Arc<str>>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a template.
    ///
    /// # Errors
    /// Returns `DuplicateTemplate` if the name is already registered, or the
    /// schema's own validation error.
    pub fn define_template(&mut self, schema: TemplateSchema) -> Result<Arc<TemplateSchema>> {
        if self.templates.contains_key(&schema.name) {
            return Err(Error::duplicate_template(&*schema.name));
        }
        schema.validate()?;

        let name = schema.name.clone();
        let schema = Arc::new(schema);
        self.templates.insert(name.clone(), schema.clone());
        self.order.push_back(name);
        Ok(schema)
    }

    /// Returns a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<TemplateSchema>> {
        self.templates.get(name)
    }

    /// Returns a template by name or an `UnknownTemplate` error.
    ///
    /// # Errors
    /// Returns `UnknownTemplate` if the template is not defined.
    pub fn require(&self, name: &str) -> Result<&Arc<TemplateSchema>> {
        self.get(name).ok_or_else(|| Error::unknown_template(name))
    }

    /// Returns true if a template with this name is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Iterates templates in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TemplateSchema>> {
        self.order.iter().filter_map(|name| self.templates.get(name))
    }

    /// Returns the number of defined templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if no templates are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
