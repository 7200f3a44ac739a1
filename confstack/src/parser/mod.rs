//! Pluggable text-format parsers.
//!
//! A parser turns raw text into a [`FlatMap`] of full configuration paths
//! to string values. Parsers never see files or the environment; the
//! providers in [`crate::source`] read the text and hand it to a
//! [`ParserRegistry`], which tries each registered parser in order and keeps
//! the first successful result.
//!
//! # Shipped formats
//!
//! - [`IniParser`]: `[Section]` headers and `key=value` lines
//! - [`AppSettingsParser`]: `*.config` files with `<appSettings>` and
//!   `<connectionStrings>` `<add .../>` elements
//! - [`JsonParser`]: JSON objects, flattened to `A:B` / `A:0` paths
//! - [`YamlParser`]: YAML mappings, flattened the same way
//!
//! # Examples
//!
//! ```
//! use confstack::parser::{IniParser, ParserRegistry};
//!
//! let registry = ParserRegistry::new().with_parser(IniParser::new());
//! let map = registry.parse("inline", "[AdBlock]\nHouse=Contoso\n").unwrap();
//! assert_eq!(map.get("AdBlock:House"), Some("Contoso"));
//! ```

mod app_settings;
mod ini;
mod json;
mod yaml;

use std::fmt;

use thiserror::Error;

use crate::error::{Error, Result};
use crate::flat_map::FlatMap;
use crate::key::ConfigKey;

pub use app_settings::AppSettingsParser;
pub use ini::IniParser;
pub use json::JsonParser;
pub(crate) use json::flatten_json;
pub use yaml::YamlParser;

/// A failure reported by a single parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{parser} parser{}: {message}", line_suffix(*.line))]
pub struct ParseError {
    /// Name of the parser that failed.
    pub parser: String,
    /// 1-based line of the offending input, when known.
    pub line: Option<usize>,
    /// What was wrong with the input.
    pub message: String,
}

fn line_suffix(line: Option<usize>) -> String {
    line.map(|l| format!(" (line {l})")).unwrap_or_default()
}

impl ParseError {
    /// Create an error without position information.
    pub fn new(parser: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            parser: parser.into(),
            line: None,
            message: message.into(),
        }
    }

    /// Create an error pointing at a 1-based line.
    pub fn at_line(parser: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self {
            parser: parser.into(),
            line: Some(line),
            message: message.into(),
        }
    }
}

/// How a parser treats a key that appears twice in one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeys {
    /// The last occurrence wins.
    #[default]
    LastWins,
    /// A repeated key is a parse error.
    Reject,
}

impl DuplicateKeys {
    /// Insert `key` into `map` honouring this policy.
    pub(crate) fn insert(
        self,
        map: &mut FlatMap,
        parser: &str,
        line: usize,
        key: ConfigKey,
        value: String,
    ) -> std::result::Result<(), ParseError> {
        if self == Self::Reject && map.contains_key(key.as_str()) {
            return Err(ParseError::at_line(
                parser,
                line,
                format!("duplicate key '{key}'"),
            ));
        }
        map.insert(key, value);
        Ok(())
    }
}

/// A text-format decoder.
///
/// Implementations must be deterministic: the same input always yields the
/// same map or the same error.
pub trait ConfigParser: Send + Sync + fmt::Debug {
    /// Short name used in diagnostics (e.g. `"ini"`).
    fn name(&self) -> &str;

    /// Parse raw content into a flat key/value map.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the content violates the format's grammar.
    fn parse(&self, content: &str) -> std::result::Result<FlatMap, ParseError>;
}

type ParseFn = dyn Fn(&str) -> std::result::Result<FlatMap, ParseError> + Send + Sync;

/// A parser backed by a plain function or closure.
///
/// # Examples
///
/// ```
/// use confstack::parser::{ConfigParser, FnParser, ParseError};
/// use confstack::FlatMap;
///
/// let parser = FnParser::new("single", |content: &str| {
///     let (key, value) = content
///         .split_once('=')
///         .ok_or_else(|| ParseError::new("single", "expected key=value"))?;
///     let mut map = FlatMap::new();
///     map.insert(key.trim(), value.trim());
///     Ok(map)
/// });
///
/// assert_eq!(parser.parse("Name = svc").unwrap().get("name"), Some("svc"));
/// assert!(parser.parse("nothing").is_err());
/// ```
pub struct FnParser {
    name: String,
    func: Box<ParseFn>,
}

impl FnParser {
    /// Wrap `func` as a parser called `name`.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<FlatMap, ParseError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

/// Shorthand for [`FnParser::new`].
pub fn parser_fn<F>(name: impl Into<String>, func: F) -> FnParser
where
    F: Fn(&str) -> std::result::Result<FlatMap, ParseError> + Send + Sync + 'static,
{
    FnParser::new(name, func)
}

impl fmt::Debug for FnParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnParser").field("name", &self.name).finish()
    }
}

impl ConfigParser for FnParser {
    fn name(&self) -> &str {
        &self.name
    }

    fn parse(&self, content: &str) -> std::result::Result<FlatMap, ParseError> {
        (self.func)(content)
    }
}

/// Ordered list of parsers tried one after another.
#[derive(Debug, Default)]
pub struct ParserRegistry {
    parsers: Vec<Box<dyn ConfigParser>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from already boxed parsers.
    #[must_use]
    pub fn from_parsers(parsers: Vec<Box<dyn ConfigParser>>) -> Self {
        Self { parsers }
    }

    /// Append a parser (builder style).
    #[must_use]
    pub fn with_parser(mut self, parser: impl ConfigParser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }

    /// Append a boxed parser.
    pub fn push(&mut self, parser: Box<dyn ConfigParser>) {
        self.parsers.push(parser);
    }

    /// Append several boxed parsers, keeping their order.
    pub fn extend(&mut self, parsers: impl IntoIterator<Item = Box<dyn ConfigParser>>) {
        self.parsers.extend(parsers);
    }

    /// Default registry for a file extension (without the leading dot).
    ///
    /// Recognizes `ini`, `config`, `json`, `yaml` and `yml`
    /// (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use confstack::parser::ParserRegistry;
    ///
    /// assert_eq!(ParserRegistry::for_extension("YML").unwrap().names(), vec!["yaml"]);
    /// assert!(ParserRegistry::for_extension("toml").is_none());
    /// ```
    #[must_use]
    pub fn for_extension(extension: &str) -> Option<Self> {
        let registry = match extension.to_lowercase().as_str() {
            "ini" => Self::new().with_parser(IniParser::new()),
            "config" => Self::new().with_parser(AppSettingsParser::new()),
            "json" => Self::new().with_parser(JsonParser),
            "yaml" | "yml" => Self::new().with_parser(YamlParser),
            _ => return None,
        };
        Some(registry)
    }

    /// Names of the registered parsers, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }

    /// Number of registered parsers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    /// Whether no parser is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Parse `content` with the first parser that accepts it.
    ///
    /// `origin` describes the source and is attached to errors.
    ///
    /// # Errors
    ///
    /// - [`Error::Parse`] when the only registered parser fails
    /// - [`Error::NoParserMatched`] when no parser is registered or every
    ///   one of several parsers fails
    pub fn parse(&self, origin: &str, content: &str) -> Result<FlatMap> {
        let mut failures = Vec::new();

        for parser in &self.parsers {
            match parser.parse(content) {
                Ok(map) => {
                    log::trace!("{} parser accepted {origin}", parser.name());
                    return Ok(map);
                }
                Err(err) => {
                    log::trace!("{} parser rejected {origin}: {err}", parser.name());
                    failures.push(err);
                }
            }
        }

        if failures.len() == 1 {
            let source = failures.remove(0);
            return Err(Error::Parse {
                origin: origin.to_string(),
                source,
            });
        }

        Err(Error::NoParserMatched {
            origin: origin.to_string(),
            failures,
        })
    }
}
