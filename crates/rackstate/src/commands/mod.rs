//! Subcommand handlers.

pub mod resolve;
pub mod sync;
