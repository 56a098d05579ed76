//! repofresh application library
//!
//! Adapters around the git binary and the filesystem, plus the engine
//! service that schedules per-repository operations. The binary in
//! `main.rs` is only the composition root.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod services;
