//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`build_index`] - Build and persist the region index cache
//! - [`config`] - Configuration management (init, path, show)
//! - [`resolve`] - One-off region lookup
//! - [`run`] - The live display loop

pub mod build_index;
pub mod config;
pub mod resolve;
pub mod run;
