//! Command to list the immediate children of a section.

use crate::error::CliError;
use crate::utils::{build_configuration, GlobalOptions};
use clap::Args;
use std::io::Write;

/// List the immediate children of a section.
#[derive(Args)]
pub struct ChildrenCommand {
    /// Section path (the root when omitted)
    #[arg(value_name = "PATH", default_value = "")]
    pub path: String,
}

impl ChildrenCommand {
    /// Execute the children command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let tree = build_configuration(global)?;
        let section = tree.section(&self.path);

        if !self.path.is_empty() && !section.exists() {
            return Err(CliError::NotFound(format!(
                "Section '{}' not found",
                self.path
            )));
        }

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        for child in section.children() {
            match child.value() {
                Some(value) => writeln!(handle, "{}\t{value}", child.key())?,
                None => writeln!(handle, "{}", child.key())?,
            }
        }

        Ok(())
    }
}
