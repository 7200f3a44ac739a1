//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    ChildrenCommand, CompletionsCommand, DumpCommand, ExportCommand, GetCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line tool for inspecting layered configuration.
#[derive(Parser)]
#[command(name = "confstack")]
#[command(
    version,
    about = "Inspect layered configuration",
    long_about = "Build a configuration tree from files, environment variables and literal \
                  values, then query, dump or export it. Sources given later override \
                  earlier ones."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Add a configuration source (repeatable, later sources win).
    ///
    /// KIND:PATH with KIND one of file, ini, json, yaml, config (append `?`
    /// to the kind for an optional file), `env`, `env:PREFIX` or
    /// `set:KEY=VALUE`.
    #[arg(short = 's', long = "source", value_name = "SPEC", global = true)]
    pub sources: Vec<String>,

    /// Directory relative file paths are resolved against
    #[arg(long, value_name = "PATH", global = true, env = "CONFSTACK_BASE_PATH")]
    pub base_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the value stored at a key
    Get(GetCommand),

    /// List the immediate children of a section
    Children(ChildrenCommand),

    /// Print a section and everything below it as an indented tree
    Dump(DumpCommand),

    /// Export the whole configuration as JSON, YAML or flat key=value lines
    Export(ExportCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sources_keep_order() {
        let cli = Cli::try_parse_from([
            "confstack",
            "-s",
            "ini:a.ini",
            "--source",
            "env",
            "get",
            "Key",
        ])
        .unwrap();
        assert_eq!(cli.sources, vec!["ini:a.ini", "env"]);
    }
}
