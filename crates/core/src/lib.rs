//! repofresh core - pure domain logic for the repository-operations engine
//!
//! This crate contains the tagged domain states, the event and command
//! vocabulary, the read projection owning the {Repository, Activity}
//! table, the output parsers, and the ports (interfaces) implemented by
//! the adapters in the application crate. It performs no I/O itself:
//! no subprocesses, no filesystem access.

pub mod app;
pub mod domain;
pub mod error;
pub mod parse;
pub mod ports;

// Re-exports for ergonomics
pub use domain::*;
pub use error::*;
