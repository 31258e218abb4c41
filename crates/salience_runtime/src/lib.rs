//! Sessions and run snapshots for Salience.
//!
//! This crate provides:
//! - [`Session`] - Loads a rule base, runs a scenario, and collects the
//!   trace and audit alongside the outcome
//! - Run outcome serialization to and from `MessagePack`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod serialize;
pub mod session;

pub use serialize::{from_bytes, load_from_file, save_to_file, to_bytes};
pub use session::{Session, SessionReport};
