//! CLI command implementations.
//!
//! - `get`: Print the value stored at a key
//! - `children`: List the immediate children of a section
//! - `dump`: Print a section tree
//! - `export`: Export the merged configuration
//! - `completions`: Generate shell completion scripts

pub mod children;
pub mod completions;
pub mod dump;
pub mod export;
pub mod get;

pub use children::ChildrenCommand;
pub use completions::CompletionsCommand;
pub use dump::DumpCommand;
pub use export::{ExportCommand, ExportFormat};
pub use get::GetCommand;
