//! Integration tests for Layer 1: Storage
//!
//! Tests for template schemas, the registry, and the fact store.
