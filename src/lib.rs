//! Salience - Forward-chaining production-rule engine
//!
//! This crate re-exports all layers of the Salience system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: salience_runtime     — Sessions, MessagePack run snapshots
//! Layer 3: salience_debug       — Fire-cycle tracing, audit trail, causal chains
//! Layer 2: salience_engine      — Rule compiler, pattern matcher, agenda, fire cycle
//! Layer 1: salience_storage     — Template registry, append-only fact store
//! Layer 0: salience_foundation  — Core types (Value, FactId, Error)
//! ```

pub use salience_debug as debug;
pub use salience_engine as engine;
pub use salience_foundation as foundation;
pub use salience_runtime as runtime;
pub use salience_storage as storage;
