//! Tracing and explanation for Salience.
//!
//! This crate provides:
//! - [`Tracer`] - A [`FireObserver`](salience_engine::FireObserver) that
//!   records the fire cycle into a bounded buffer
//! - [`HumanFormatter`] / [`JsonFormatter`] - Rendering of trace records
//! - [`WhyTrail`] - The audit trail of explanatory facts
//! - [`WhyQuery`] - Causal chains from a fact back to the initial facts

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod explain;
pub mod trace;

pub use explain::{
    AuditConfig, AuditEntry, AuditReport, CausalChain, CausalLink, WhyQuery, WhyTrail,
};
pub use trace::{
    HumanFormatter, JsonFormatter, TraceBuffer, TraceBufferStats, TraceEvent, TraceFormatter,
    TraceOutput, TraceRecord, Tracer, TracerConfig,
};
