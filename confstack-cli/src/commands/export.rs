//! Command to export the merged configuration.
//!
//! JSON and YAML output nest sections into objects and turn sections whose
//! children are `0..n` into arrays. A section holding both a value and
//! children exports only its children in those formats; `flat` output is
//! lossless.

use crate::error::CliError;
use crate::utils::{build_configuration, GlobalOptions};
use clap::{Args, ValueEnum};
use confstack::ConfigurationTree;
use std::io::Write;

/// Export the whole configuration.
#[derive(Args)]
pub struct ExportCommand {
    /// Output format
    #[arg(long, value_enum, default_value = "json", ignore_case = true)]
    pub format: ExportFormat,
}

/// Output format for the export command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Nested JSON document
    Json,
    /// Nested YAML document
    Yaml,
    /// One `key=value` line per entry, in merge order
    Flat,
}

impl ExportCommand {
    /// Execute the export command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let tree = build_configuration(global)?;

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        match self.format {
            ExportFormat::Json => format_as_json(&mut handle, &tree)?,
            ExportFormat::Yaml => format_as_yaml(&mut handle, &tree)?,
            ExportFormat::Flat => format_as_flat(&mut handle, &tree)?,
        }

        Ok(())
    }
}

fn to_io_error(e: impl std::error::Error + Send + Sync + 'static) -> CliError {
    CliError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
}

fn nested_value(tree: &ConfigurationTree) -> Result<serde_json::Value, CliError> {
    if tree.is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    Ok(tree.root().bind()?)
}

fn format_as_json(out: &mut impl Write, tree: &ConfigurationTree) -> Result<(), CliError> {
    let value = nested_value(tree)?;
    serde_json::to_writer_pretty(&mut *out, &value).map_err(to_io_error)?;
    writeln!(out)?;
    Ok(())
}

fn format_as_yaml(out: &mut impl Write, tree: &ConfigurationTree) -> Result<(), CliError> {
    let value = nested_value(tree)?;
    serde_yaml::to_writer(&mut *out, &value).map_err(to_io_error)?;
    Ok(())
}

fn format_as_flat(out: &mut impl Write, tree: &ConfigurationTree) -> Result<(), CliError> {
    for entry in tree.entries() {
        writeln!(out, "{}={}", entry.key(), entry.value())?;
    }
    Ok(())
}
