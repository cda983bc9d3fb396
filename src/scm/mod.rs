//! scm
//!
//! Abstraction for the hosting service behind the repository.
//!
//! # Architecture
//!
//! The changelog depends on three traits, never on a concrete client:
//! [`IssueTracker`], [`UserDirectory`] and [`ReleaseStore`]. Commands use the
//! [`create_client`] factory and fall back to [`offline::OfflineScm`] when no
//! client is available. Hosting failures never abort changelog generation.
//!
//! # Modules
//!
//! - `traits`: the traits and their request/response types
//! - [`github`]: GitHub implementation using the REST API
//! - [`mock`]: in-memory implementation for deterministic testing
//! - [`offline`]: network-free implementation
//! - `factory`: client selection

mod factory;
pub mod github;
pub mod mock;
pub mod offline;
mod traits;

pub use factory::{create_client, detect_provider, ScmProvider};
pub use traits::*;
