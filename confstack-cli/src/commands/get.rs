//! Command to print a single value.

use crate::error::CliError;
use crate::utils::{build_configuration, GlobalOptions};
use clap::Args;

/// Print the value stored at a key.
#[derive(Args)]
pub struct GetCommand {
    /// Key to look up (segments separated by `:`, case-insensitive)
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Value to print when the key is absent
    #[arg(long, value_name = "VALUE")]
    pub default: Option<String>,

    /// Also print which source supplied the value
    #[arg(long)]
    pub origin: bool,
}

impl GetCommand {
    /// Execute the get command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let tree = build_configuration(global)?;

        match (tree.get(&self.key), self.default) {
            (Some(value), _) => {
                if self.origin {
                    let origin = tree.origin(&self.key).unwrap_or("unknown source");
                    println!("{value}\t{origin}");
                } else {
                    println!("{value}");
                }
                Ok(())
            }
            (None, Some(default)) => {
                if self.origin {
                    println!("{default}\tdefault");
                } else {
                    println!("{default}");
                }
                Ok(())
            }
            (None, None) => Err(CliError::NotFound(format!(
                "Key '{}' not found",
                self.key
            ))),
        }
    }
}
