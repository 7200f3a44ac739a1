//! File and literal-content sources.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::flat_map::FlatMap;
use crate::parser::ParserRegistry;

use super::ConfigurationProvider;

#[derive(Debug)]
enum Target {
    File { path: PathBuf, optional: bool },
    Content(String),
}

/// Provider for a configuration file or for literal content.
///
/// File existence is checked when the provider is loaded, not when it is
/// constructed: a required file that is missing at load time fails with
/// [`Error::FileNotFound`], an optional one contributes nothing.
///
/// # Examples
///
/// ```
/// use confstack::parser::{IniParser, ParserRegistry};
/// use confstack::{ConfigurationProvider, FileConfigurationProvider};
///
/// let parsers = ParserRegistry::new().with_parser(IniParser::new());
/// let provider = FileConfigurationProvider::new("[AdBlock]\nHouse=Contoso\n", false, false, parsers).unwrap();
/// assert_eq!(provider.load().unwrap().get("AdBlock:House"), Some("Contoso"));
/// ```
#[derive(Debug)]
pub struct FileConfigurationProvider {
    target: Target,
    parsers: ParserRegistry,
}

impl FileConfigurationProvider {
    /// Create a provider from a path (`is_file == true`) or from literal
    /// content (`is_file == false`, in which case `optional` is ignored).
    ///
    /// Paths are used as given; the builder's registration helpers resolve
    /// them against the base path first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path_or_content` is empty.
    pub fn new(
        path_or_content: &str,
        is_file: bool,
        optional: bool,
        parsers: ParserRegistry,
    ) -> Result<Self> {
        if is_file {
            Self::from_path(path_or_content, optional, parsers)
        } else {
            Self::from_content(path_or_content, parsers)
        }
    }

    /// Create a provider reading the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path` is empty.
    pub fn from_path(
        path: impl Into<PathBuf>,
        optional: bool,
        parsers: ParserRegistry,
    ) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument(
                "path",
                "path for configuration cannot be empty",
            ));
        }
        Ok(Self {
            target: Target::File { path, optional },
            parsers,
        })
    }

    /// Create a provider for literal content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `content` is empty.
    pub fn from_content(content: impl Into<String>, parsers: ParserRegistry) -> Result<Self> {
        let content = content.into();
        if content.is_empty() {
            return Err(Error::invalid_argument(
                "content",
                "contents for configuration cannot be empty",
            ));
        }
        Ok(Self {
            target: Target::Content(content),
            parsers,
        })
    }

    /// The file path, or `None` for content sources.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            Target::File { path, .. } => Some(path),
            Target::Content(_) => None,
        }
    }

    /// Whether a missing file is tolerated (always false for content).
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self.target, Target::File { optional: true, .. })
    }

    /// The parsers tried on the content.
    #[must_use]
    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }
}

impl ConfigurationProvider for FileConfigurationProvider {
    fn load(&self) -> Result<FlatMap> {
        let origin = self.describe();

        match &self.target {
            Target::Content(content) => self.parsers.parse(&origin, content),
            Target::File { path, optional } => match fs::read_to_string(path) {
                Ok(content) => self.parsers.parse(&origin, &content),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    if *optional {
                        log::debug!("Optional {origin} does not exist; skipping");
                        Ok(FlatMap::new())
                    } else {
                        Err(Error::FileNotFound { path: path.clone() })
                    }
                }
                Err(source) => Err(Error::SourceLoad { origin, source }),
            },
        }
    }

    fn describe(&self) -> String {
        match &self.target {
            Target::File { path, .. } => format!("file {}", path.display()),
            Target::Content(content) => format!("inline content ({} bytes)", content.len()),
        }
    }
}
