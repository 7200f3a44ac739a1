//! Build script for confstack-cli.
//!
//! Generates the man page at build time using clap_mangen and places it in
//! OUT_DIR.
//!
//! Build scripts cannot depend on the crate being built, so the command
//! structure is described again here.

use clap::{Arg, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// Keep this synchronized with src/cli.rs.
fn build_cli() -> Command {
    Command::new("confstack")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect layered configuration")
        .long_about(
            "Build a configuration tree from files, environment variables and literal values, \
             then query, dump or export it. Sources given later override earlier ones.",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .help("Add a configuration source (repeatable, later sources win)")
                .value_name("SPEC")
                .global(true)
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new("base-path")
                .long("base-path")
                .help("Directory relative file paths are resolved against")
                .value_name("PATH")
                .global(true)
                .env("CONFSTACK_BASE_PATH"),
        )
        .subcommands(vec![
            Command::new("get")
                .about("Print the value stored at a key")
                .long_about("Print the value stored at a key, optionally with its source"),
            Command::new("children")
                .about("List the immediate children of a section")
                .long_about("List the immediate children of a section in first-seen order"),
            Command::new("dump")
                .about("Print a section and everything below it as an indented tree")
                .long_about("Walk a section depth-first and print one line per section"),
            Command::new("export")
                .about("Export the whole configuration")
                .long_about("Export the merged configuration as JSON, YAML or flat key=value lines"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() -> std::io::Result<()> {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").map_err(std::io::Error::other)?);
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;
    fs::write(man_dir.join("confstack.1"), buffer)?;

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
    Ok(())
}
