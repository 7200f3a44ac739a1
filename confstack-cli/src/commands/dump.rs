//! Command to print a section tree.
//!
//! Every section is printed on its own line as `[key] value`, indented two
//! spaces per level. Sections without a value print only `[key]`.

use crate::error::CliError;
use crate::utils::{build_configuration, GlobalOptions};
use clap::Args;
use confstack::Section;
use std::io::{self, Write};

/// Print a section and everything below it as an indented tree.
#[derive(Args)]
pub struct DumpCommand {
    /// Section path (the root when omitted)
    #[arg(value_name = "PATH", default_value = "")]
    pub path: String,
}

impl DumpCommand {
    /// Execute the dump command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let tree = build_configuration(global)?;
        let section = tree.section(&self.path);

        if !self.path.is_empty() && !section.exists() {
            return Err(CliError::NotFound(format!(
                "Section '{}' not found",
                self.path
            )));
        }

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_tree(&mut handle, &section)?;
        Ok(())
    }
}

/// Write `section` (unless it is the root) and its descendants.
fn write_tree(out: &mut impl Write, section: &Section<'_>) -> io::Result<()> {
    let offset = if section.path().is_root() {
        0
    } else {
        write_line(out, 0, section)?;
        1
    };

    for (depth, child) in section.walk() {
        write_line(out, depth + offset, &child)?;
    }
    Ok(())
}

fn write_line(out: &mut impl Write, depth: usize, section: &Section<'_>) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    match section.value() {
        Some(value) => writeln!(out, "{indent}[{}] {value}", section.key()),
        None => writeln!(out, "{indent}[{}]", section.key()),
    }
}
