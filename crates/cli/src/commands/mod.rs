//! Subcommand implementations

pub mod serve;
pub mod staff;
pub mod sweep;
