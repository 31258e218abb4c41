//! Integration tests for Layer 2: Engine
//!
//! Tests for rule compilation, pattern matching, conflict resolution,
//! and the fire cycle.

mod common;

mod cycle;
