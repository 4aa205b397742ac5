//! Subcommand implementations for the `ritual` binary.

pub mod check;
pub mod run_cmd;
