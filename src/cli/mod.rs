//! CLI command handlers

pub mod commands;

pub use commands::{export, ls, resolve_experiment};
