#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # confstack
//!
//! A library for layering configuration sources into one hierarchical,
//! case-insensitive tree of settings.
//!
//! Sources (files, literal content, environment variables, in-memory
//! values) are registered on a [`ConfigurationBuilder`] in priority order.
//! Building loads every source, merges the results so that later sources
//! override earlier ones key by key, and returns an immutable
//! [`ConfigurationTree`] addressed with `:`-delimited paths.
//!
//! ## Core Types
//!
//! - [`ConfigurationBuilder`]: source registration and build
//! - [`ConfigurationTree`], [`Section`] and [`Children`]: querying the result
//! - [`ConfigurationProvider`]: the trait every source implements
//! - [`parser::ConfigParser`] and [`parser::ParserRegistry`]: text formats
//! - [`ConfigKey`] and [`FlatMap`]: case-insensitive keys and maps
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use confstack::ConfigurationBuilder;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Retry {
//!     count: u32,
//! }
//!
//! let tree = ConfigurationBuilder::new()
//!     .add_in_memory(vec![("Retry:Count", "3"), ("Logging:Level", "info")])
//!     .add_in_memory(vec![("retry:count", "5")])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(tree.get("RETRY:COUNT"), Some("5"));
//! let retry: Retry = tree.bind("Retry").unwrap();
//! assert_eq!(retry.count, 5);
//! ```

pub mod binder;
pub mod builder;
pub mod error;
pub mod flat_map;
pub mod key;
pub mod logging;
pub mod merger;
pub mod parser;
pub mod path;
pub mod source;
pub mod tree;
pub mod walk;

#[cfg(test)]
mod proptests;

// Re-export key types at crate root for convenience
pub use binder::BindError;
pub use builder::ConfigurationBuilder;
pub use error::{Error, Result};
pub use flat_map::FlatMap;
pub use key::{ConfigKey, KEY_DELIMITER};
pub use logging::{init_logger, LogLevel, Logger};
pub use merger::ConfigEntry;
pub use parser::{ConfigParser, ParseError, ParserRegistry};
pub use source::{
    ConfigurationProvider, EnvironmentVariablesProvider, FileConfigurationProvider,
    MemoryConfigurationProvider, ProviderId,
};
pub use tree::{Children, ConfigurationTree, Section};
pub use walk::Walk;
