//! Utility functions for CLI operations.
//!
//! This module turns the global `--source` specifications into registrations
//! on a [`ConfigurationBuilder`] and builds the tree every command queries.

use crate::error::CliError;
use confstack::{ConfigurationBuilder, ConfigurationTree, EnvironmentVariablesProvider};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
#[allow(dead_code)] // verbose is consumed by the logger in main.rs
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Source specifications, lowest priority first.
    pub sources: Vec<String>,

    /// Directory relative file paths are resolved against.
    pub base_path: Option<PathBuf>,
}

/// File format named in a source specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Chosen from the file extension.
    Auto,
    /// INI.
    Ini,
    /// JSON.
    Json,
    /// YAML.
    Yaml,
    /// `*.config` XML.
    Config,
}

impl FileKind {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "file" => Some(Self::Auto),
            "ini" => Some(Self::Ini),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "config" => Some(Self::Config),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Auto => "file",
            Self::Ini => "ini",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Config => "config",
        }
    }
}

/// One parsed `--source` specification.
///
/// Syntax:
/// - `file:PATH`, `ini:PATH`, `json:PATH`, `yaml:PATH`, `config:PATH`,
///   with `?` after the kind for an optional file (`ini?:PATH`)
/// - `env` or `env:PREFIX`
/// - `set:KEY=VALUE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// A file on disk.
    File {
        /// Format of the file.
        kind: FileKind,
        /// Path as given (resolved against the base path later).
        path: String,
        /// Whether a missing file is tolerated.
        optional: bool,
    },
    /// Environment variables, optionally filtered by prefix.
    Env(Option<String>),
    /// A single literal value.
    Set {
        /// Key to set.
        key: String,
        /// Value to store.
        value: String,
    },
}

impl FromStr for SourceSpec {
    type Err = CliError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CliError::InvalidArguments(format!("source '{spec}': {reason}"));

        let (kind, rest) = match spec.split_once(':') {
            Some((kind, rest)) => (kind, Some(rest)),
            None => (spec, None),
        };

        match (kind.to_ascii_lowercase().as_str(), rest) {
            ("env", None) => Ok(Self::Env(None)),
            ("env", Some(prefix)) => Ok(Self::Env((!prefix.is_empty()).then(|| prefix.to_string()))),
            ("set", Some(assignment)) => {
                let (key, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| invalid("expected set:KEY=VALUE"))?;
                if key.trim().is_empty() {
                    return Err(invalid("key must not be empty"));
                }
                Ok(Self::Set {
                    key: key.trim().to_string(),
                    value: value.to_string(),
                })
            }
            (_, Some(path)) => {
                let (name, optional) = match kind.strip_suffix('?') {
                    Some(name) => (name, true),
                    None => (kind, false),
                };
                let kind = FileKind::from_name(name).ok_or_else(|| {
                    invalid("unknown source kind (expected file, ini, json, yaml, config, env or set)")
                })?;
                if path.is_empty() {
                    return Err(invalid("path must not be empty"));
                }
                Ok(Self::File {
                    kind,
                    path: path.to_string(),
                    optional,
                })
            }
            (_, None) => Err(invalid("expected KIND:VALUE")),
        }
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File {
                kind,
                path,
                optional,
            } => {
                let marker = if *optional { "?" } else { "" };
                write!(f, "{}{marker}:{path}", kind.name())
            }
            Self::Env(None) => write!(f, "env"),
            Self::Env(Some(prefix)) => write!(f, "env:{prefix}"),
            Self::Set { key, value } => write!(f, "set:{key}={value}"),
        }
    }
}

impl SourceSpec {
    /// Register this source on `builder`.
    pub fn register(self, builder: ConfigurationBuilder) -> Result<ConfigurationBuilder, CliError> {
        let builder = match self {
            Self::File {
                kind,
                path,
                optional,
            } => match kind {
                FileKind::Auto => builder.add_file(&path, optional)?,
                FileKind::Ini => builder.add_ini_file(&path, optional)?,
                FileKind::Json => builder.add_json_file(&path, optional)?,
                FileKind::Yaml => builder.add_yaml_file(&path, optional)?,
                FileKind::Config => builder.add_config_file_with(&path, optional, Vec::new())?,
            },
            Self::Env(None) => builder.add_environment_variables(),
            Self::Env(Some(prefix)) => {
                builder.add(EnvironmentVariablesProvider::new().with_prefix(prefix))
            }
            Self::Set { key, value } => builder.add_in_memory(vec![(key, value)]),
        };
        Ok(builder)
    }
}

/// Parse every `--source` and build the configuration tree.
///
/// Sources are registered in the order given, so later sources override
/// earlier ones.
pub fn build_configuration(global: &GlobalOptions) -> Result<ConfigurationTree, CliError> {
    let specs = global
        .sources
        .iter()
        .map(|s| s.parse::<SourceSpec>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = ConfigurationBuilder::new();
    if let Some(base_path) = &global.base_path {
        builder = builder.with_base_path(base_path)?;
    }

    for spec in specs {
        log::debug!("Registering source {spec}");
        builder = spec.register(builder)?;
    }

    Ok(builder.build()?)
}
