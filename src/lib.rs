//! relnote - changelogs and release records from git history
//!
//! relnote walks a revision range, finds the issues and pull requests the
//! commit messages reference, resolves who wrote what, and produces a
//! markdown changelog plus a structured release record. The record can be
//! written next to a Helm chart, published as a GitHub release, and
//! attached to a CI pipeline's activity.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, picks collaborators)
//! - [`changelog`] - The assembly pipeline and its sinks
//! - [`core`] - Data model and configuration
//! - [`git`] - Single interface for all Git operations
//! - [`scm`] - Issue tracker, user directory and release store clients
//! - [`ui`] - Output and logging
//!
//! # Failure policy
//!
//! Tracker and user lookup failures are logged and never abort a run.
//! Bad revisions, template errors and failing required outputs do.

pub mod changelog;
pub mod cli;
pub mod core;
pub mod git;
pub mod scm;
pub mod ui;
