//! core
//!
//! Data model and configuration for relnote.
//!
//! # Modules
//!
//! - [`types`] - Commits, users, issues, dependency updates, release records
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Records are plain serde data; behaviour lives in [`crate::changelog`]
//! - Schemas are strict (`deny_unknown_fields`)

pub mod config;
pub mod types;
