//! Template registry and append-only fact store for Salience.
//!
//! This crate provides:
//! - [`TemplateSchema`] / [`SlotSchema`] - Slot schemas with defaults
//! - [`TemplateRegistry`] - Named templates, defined once at load time
//! - [`Fact`] - Immutable, identified template instances
//! - [`FactStore`] - Ordered, append-only fact history with structural sharing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod fact;
pub mod registry;
pub mod schema;
pub mod store;

pub use fact::{Fact, FactSpec};
pub use registry::TemplateRegistry;
pub use schema::{SlotSchema, TemplateSchema};
pub use store::{FactIter, FactStore};
