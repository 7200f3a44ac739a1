//! Library exports for confstack-cli.
//!
//! Exposes the CLI structure so documentation tooling can render it.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

pub use cli::Cli;
