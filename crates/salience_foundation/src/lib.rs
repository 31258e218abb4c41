//! Core values, fact identifiers, and errors for Salience.
//!
//! This crate provides:
//! - [`Value`] - The closed slot value type (integer, symbol, yes/no)
//! - [`Type`] - Type descriptors used to check slot values against templates
//! - [`FactId`] - Monotonic fact identifiers
//! - [`Error`] - Rich error types with rule/action context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod fact_id;
pub mod types;
pub mod value;

pub use error::{Error, ErrorContext, ErrorKind, SemanticLimit};
pub use fact_id::FactId;
pub use types::Type;
pub use value::Value;

/// Result type used throughout Salience.
pub type Result<T> = std::result::Result<T, Error>;
