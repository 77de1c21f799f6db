//! Shared types, errors and configuration for casemap.
//!
//! This crate contains the case-mapping record types, the error taxonomy,
//! the TOML configuration and the input loaders used across the workspace.

pub mod config;
pub mod entry;
pub mod error;
pub mod input;
pub mod unicode;

pub use config::CompressionConfig;
pub use entry::{Domain, Entry, PackedEntry};
pub use error::TableError;
pub use input::{DomainEntries, InputEntries, Record};
