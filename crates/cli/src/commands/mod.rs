//! Subcommand implementations.

pub mod cleanup;
pub mod users;
