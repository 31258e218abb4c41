//! Explanations of a finished run.
//!
//! - [`why`] reads the explanatory facts a rule base asserts and checks
//!   them against the firing log.
//! - [`chain`] follows a fact back through the firings that produced it.

pub mod chain;
pub mod why;

pub use chain::{CausalChain, CausalLink, WhyQuery};
pub use why::{AuditConfig, AuditEntry, AuditReport, WhyTrail};
