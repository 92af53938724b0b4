//! Subcommand implementations.

pub mod inspect;
pub mod resolve;
pub mod transports;
