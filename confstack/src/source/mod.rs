//! Configuration sources and the providers that load them.
//!
//! Every source kind implements [`ConfigurationProvider`]: a single
//! `load` operation producing a [`FlatMap`], regardless of where the data
//! comes from or which text format it uses.
//!
//! # Source kinds
//!
//! - [`FileConfigurationProvider`]: a file (required or optional) or literal
//!   content, decoded through a [`ParserRegistry`](crate::parser::ParserRegistry)
//! - [`EnvironmentVariablesProvider`]: the process environment, with `__`
//!   mapped to the key delimiter
//! - [`MemoryConfigurationProvider`]: key/value pairs or a serializable
//!   object graph

mod environment;
mod file;
mod memory;

use std::fmt;

use crate::error::Result;
use crate::flat_map::FlatMap;

pub use environment::EnvironmentVariablesProvider;
pub use file::FileConfigurationProvider;
pub use memory::MemoryConfigurationProvider;

/// Stable identity of a provider within one builder.
///
/// Ids are assigned from a counter owned by the builder, in registration
/// order starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(usize);

impl ProviderId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Registration index of the provider.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for ProviderId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A loadable origin of configuration values.
///
/// Implementations must not share mutable state with other providers; the
/// builder calls `load` once per build, strictly in registration order.
///
/// # Examples
///
/// ```
/// use confstack::{ConfigurationProvider, FlatMap, Result};
///
/// #[derive(Debug)]
/// struct Defaults;
///
/// impl ConfigurationProvider for Defaults {
///     fn load(&self) -> Result<FlatMap> {
///         Ok(vec![("Retry:Count", "3")].into_iter().collect())
///     }
///
///     fn describe(&self) -> String {
///         "defaults".to_string()
///     }
/// }
///
/// assert_eq!(Defaults.load().unwrap().get("retry:count"), Some("3"));
/// ```
pub trait ConfigurationProvider: Send + Sync + fmt::Debug {
    /// Load the source into a flat key/value map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`](crate::Error::FileNotFound),
    /// [`Error::Parse`](crate::Error::Parse),
    /// [`Error::NoParserMatched`](crate::Error::NoParserMatched) or
    /// [`Error::SourceLoad`](crate::Error::SourceLoad), annotated with the
    /// source's description.
    fn load(&self) -> Result<FlatMap>;

    /// Human-readable description used in logs and error messages.
    fn describe(&self) -> String;
}
