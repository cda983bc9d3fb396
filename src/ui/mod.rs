//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//! - [`logging`] - Log subscriber setup
//!
//! # Design
//!
//! Diagnostics go to the log on stderr. Only results meant for the user,
//! such as the rendered changelog, go through this module, so that
//! `--quiet` silences them in one place.

pub mod logging;
pub mod output;
