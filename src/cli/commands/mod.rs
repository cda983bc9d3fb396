//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Async Commands
//!
//! `changelog` talks to the issue tracker and release store, so it is
//! async. The dispatch function stays synchronous; the handler builds a
//! tokio runtime and blocks on the async implementation.

mod changelog;
mod schema;

pub use changelog::changelog;
pub use schema::schema;

use crate::cli::args::Command;
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Changelog(args) => changelog(ctx, &args),
        Command::Schema => schema(),
    }
}
