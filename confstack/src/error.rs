//! Error types for the confstack library.
//!
//! This module provides the error hierarchy for registering sources,
//! loading them and reading typed values from a built tree, using
//! `thiserror` for ergonomic error handling.

use std::path::PathBuf;

use thiserror::Error;

use crate::binder::BindError;
use crate::parser::ParseError;

/// Result type alias for operations that may fail with a confstack error.
///
/// # Examples
///
/// ```
/// use confstack::{Error, Result};
///
/// fn example_operation() -> Result<u16> {
///     Ok(8080)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the confstack library.
///
/// Registration errors (`InvalidArgument`) surface from the call that
/// registers a source. Everything else surfaces from
/// [`ConfigurationBuilder::build`](crate::ConfigurationBuilder::build) or
/// from typed lookups on a built tree.
#[derive(Debug, Error)]
pub enum Error {
    /// An invalid argument was passed while registering a source.
    #[error("invalid argument '{argument}': {reason}")]
    InvalidArgument {
        /// The name of the offending argument.
        argument: String,
        /// Why the argument was rejected.
        reason: String,
    },

    /// A required configuration file does not exist.
    #[error("could not find configuration file: {}", path.display())]
    FileNotFound {
        /// The resolved absolute path of the missing file.
        path: PathBuf,
    },

    /// The only parser registered for a source rejected its content.
    #[error("failed to parse {origin}: {source}")]
    Parse {
        /// Description of the source being parsed.
        origin: String,
        /// The parser failure.
        #[source]
        source: ParseError,
    },

    /// None of the parsers registered for a source accepted its content.
    #[error("no parser matched {origin} (tried {})", parser_names(.failures))]
    NoParserMatched {
        /// Description of the source being parsed.
        origin: String,
        /// Every parser failure, in the order the parsers were tried.
        failures: Vec<ParseError>,
    },

    /// Reading a source failed for a reason other than a missing file.
    #[error("failed to load {origin}: {source}")]
    SourceLoad {
        /// Description of the source being loaded.
        origin: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A value could not be converted to the requested type.
    #[error("cannot convert value '{value}' at '{key}': {message}")]
    Conversion {
        /// The key whose value failed to convert.
        key: String,
        /// The raw value.
        value: String,
        /// The conversion failure.
        message: String,
    },

    /// A section could not be bound to the requested type.
    #[error("cannot bind section '{path}': {source}")]
    Bind {
        /// Path of the section being bound.
        path: String,
        /// The binder failure.
        #[source]
        source: BindError,
    },
}

/// Render the names of the parsers that failed for a source.
fn parser_names(failures: &[ParseError]) -> String {
    if failures.is_empty() {
        return "nothing".to_string();
    }
    failures
        .iter()
        .map(|f| f.parser.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Build an [`Error::InvalidArgument`].
    pub(crate) fn invalid_argument(argument: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if error was raised while loading or parsing a source.
    ///
    /// # Examples
    ///
    /// ```
    /// use confstack::Error;
    /// use std::path::PathBuf;
    ///
    /// let err = Error::FileNotFound { path: PathBuf::from("/etc/app.ini") };
    /// assert!(err.is_load_error());
    /// ```
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. }
                | Self::Parse { .. }
                | Self::NoParserMatched { .. }
                | Self::SourceLoad { .. }
        )
    }

    /// Check if error indicates a required file does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use confstack::Error;
    /// use std::path::PathBuf;
    ///
    /// let err = Error::FileNotFound { path: PathBuf::from("/nonexistent") };
    /// assert!(err.is_not_found());
    /// ```
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }
}
