//! Registering sources and building configuration trees.
//!
//! Sources are registered on a [`ConfigurationBuilder`] in priority order:
//! when two sources define the same key, the one registered later wins.
//! Registration only validates arguments; nothing is read until
//! [`ConfigurationBuilder::build`] is called, and every build re-reads
//! every source.
//!
//! # Examples
//!
//! ```
//! use confstack::parser::IniParser;
//! use confstack::{ConfigurationBuilder, EnvironmentVariablesProvider};
//!
//! let tree = ConfigurationBuilder::new()
//!     .add_in_memory(vec![("Retry:Count", "42")])
//!     .add_content("[AdBlock]\nHouse=Contoso\n", vec![Box::new(IniParser::new())])?
//!     .add(EnvironmentVariablesProvider::from_snapshot(vec![("ADBLOCK__HOUSE", "Origin")]))
//!     .build()?;
//!
//! assert_eq!(tree.get("AdBlock:House"), Some("Origin"));
//! assert_eq!(tree.get("Retry:Count"), Some("42"));
//! # Ok::<(), confstack::Error>(())
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::key::ConfigKey;
use crate::merger::ConfigMerger;
use crate::parser::{
    AppSettingsParser, ConfigParser, IniParser, JsonParser, ParserRegistry, YamlParser,
};
use crate::path::{default_base_path, expand_tilde, resolve_components, resolve_source_path};
use crate::source::{
    ConfigurationProvider, EnvironmentVariablesProvider, FileConfigurationProvider,
    MemoryConfigurationProvider, ProviderId,
};
use crate::tree::ConfigurationTree;

/// Ordered list of configuration providers.
///
/// `add` and the registration helpers take the builder by value and return
/// it, so registrations chain. Helpers that validate input return
/// [`Result`] instead.
#[derive(Debug)]
pub struct ConfigurationBuilder {
    providers: Vec<(ProviderId, Box<dyn ConfigurationProvider>)>,
    base_path: PathBuf,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationBuilder {
    /// Create an empty builder whose base path is the current directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            base_path: default_base_path(),
        }
    }

    /// Resolve relative source paths against `path` instead of the current
    /// directory. A leading `~` is expanded; a relative base is itself
    /// resolved against the current base.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path` is empty or `~` cannot
    /// be expanded.
    pub fn with_base_path(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument("base_path", "base path cannot be empty"));
        }
        let expanded = expand_tilde(path)?;
        self.base_path = resolve_components(&self.base_path.join(expanded));
        Ok(self)
    }

    /// The directory relative source paths are resolved against.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Register a provider. Later providers override earlier ones.
    #[must_use]
    pub fn add(self, provider: impl ConfigurationProvider + 'static) -> Self {
        self.add_boxed(Box::new(provider))
    }

    /// Register an already boxed provider.
    #[must_use]
    pub fn add_boxed(mut self, provider: Box<dyn ConfigurationProvider>) -> Self {
        let id = ProviderId::new(self.providers.len());
        log::trace!("Registered provider {id}: {}", provider.describe());
        self.providers.push((id, provider));
        self
    }

    /// Registered providers in registration order.
    pub fn providers(&self) -> impl Iterator<Item = (ProviderId, &dyn ConfigurationProvider)> {
        self.providers
            .iter()
            .map(|(id, provider)| (*id, provider.as_ref()))
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Register literal content, parsed with the `*.config` parser first and
    /// then with `extra_parsers` in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `content` is empty.
    pub fn add_content(
        self,
        content: &str,
        extra_parsers: Vec<Box<dyn ConfigParser>>,
    ) -> Result<Self> {
        let provider = FileConfigurationProvider::from_content(content, with_extras(extra_parsers))?;
        Ok(self.add(provider))
    }

    /// Register a required `*.config` file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path` is empty.
    pub fn add_config_file(self, path: &str) -> Result<Self> {
        self.add_config_file_with(path, false, Vec::new())
    }

    /// Register a `*.config` file, trying `extra_parsers` after the
    /// `*.config` parser.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path` is empty.
    pub fn add_config_file_with(
        self,
        path: &str,
        optional: bool,
        extra_parsers: Vec<Box<dyn ConfigParser>>,
    ) -> Result<Self> {
        self.add_file_with_parsers(path, optional, with_extras(extra_parsers))
    }

    /// Register an INI file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path` is empty.
    pub fn add_ini_file(self, path: &str, optional: bool) -> Result<Self> {
        self.add_file_with_parsers(path, optional, ParserRegistry::new().with_parser(IniParser::new()))
    }

    /// Register a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path` is empty.
    pub fn add_json_file(self, path: &str, optional: bool) -> Result<Self> {
        self.add_file_with_parsers(path, optional, ParserRegistry::new().with_parser(JsonParser))
    }

    /// Register a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path` is empty.
    pub fn add_yaml_file(self, path: &str, optional: bool) -> Result<Self> {
        self.add_file_with_parsers(path, optional, ParserRegistry::new().with_parser(YamlParser))
    }

    /// Register a file whose format is chosen by its extension
    /// (`ini`, `config`, `json`, `yaml`/`yml`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path` is empty or its
    /// extension is not recognized.
    pub fn add_file(self, path: &str, optional: bool) -> Result<Self> {
        ensure_path(path)?;
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let parsers = ParserRegistry::for_extension(extension).ok_or_else(|| {
            Error::invalid_argument(
                "path",
                format!("cannot infer configuration format of '{path}' from its extension"),
            )
        })?;
        self.add_file_with_parsers(path, optional, parsers)
    }

    /// Register a file decoded by an explicit parser registry.
    ///
    /// Relative paths are resolved against [`base_path`](Self::base_path)
    /// now; the file itself is only read at build time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path` is empty or `~` cannot
    /// be expanded.
    pub fn add_file_with_parsers(
        self,
        path: &str,
        optional: bool,
        parsers: ParserRegistry,
    ) -> Result<Self> {
        ensure_path(path)?;
        let resolved = resolve_source_path(&self.base_path, path)?;
        let provider = FileConfigurationProvider::from_path(resolved, optional, parsers)?;
        Ok(self.add(provider))
    }

    /// Register the whole process environment.
    #[must_use]
    pub fn add_environment_variables(self) -> Self {
        self.add(EnvironmentVariablesProvider::new())
    }

    /// Register the environment variables starting with `prefix`, with the
    /// prefix stripped from their keys.
    #[must_use]
    pub fn add_environment_variables_with_prefix(self, prefix: &str) -> Self {
        self.add(EnvironmentVariablesProvider::new().with_prefix(prefix))
    }

    /// Register fixed key/value pairs.
    #[must_use]
    pub fn add_in_memory<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ConfigKey>,
        V: Into<String>,
    {
        self.add(MemoryConfigurationProvider::new(pairs))
    }

    /// Register a serializable object graph, flattened to keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `value` does not serialize to
    /// an object.
    pub fn add_object<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let provider = MemoryConfigurationProvider::from_serializable(value)?;
        Ok(self.add(provider))
    }

    /// Load every provider in registration order and merge the results.
    ///
    /// Fails on the first provider error; no partial tree is returned.
    ///
    /// # Errors
    ///
    /// Returns whichever error the failing provider reported, typically
    /// [`Error::FileNotFound`], [`Error::Parse`],
    /// [`Error::NoParserMatched`] or [`Error::SourceLoad`].
    pub fn build(&self) -> Result<ConfigurationTree> {
        let mut merger = ConfigMerger::new();
        let mut descriptions = Vec::with_capacity(self.providers.len());

        for (id, provider) in &self.providers {
            let origin = provider.describe();
            let layer = provider.load().map_err(|e| {
                log::debug!("Provider {id} ({origin}) failed: {e}");
                e
            })?;
            log::debug!("Loaded {} keys from {origin}", layer.len());
            merger.merge_layer(*id, layer);
            descriptions.push(origin);
        }

        let tree = ConfigurationTree::from_entries(merger.finish(), descriptions);
        log::info!(
            "Built configuration with {} keys from {} providers",
            tree.len(),
            self.providers.len()
        );
        Ok(tree)
    }
}

fn ensure_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::invalid_argument(
            "path",
            "path for configuration cannot be empty",
        ));
    }
    Ok(())
}

fn with_extras(extra_parsers: Vec<Box<dyn ConfigParser>>) -> ParserRegistry {
    let mut registry = ParserRegistry::new().with_parser(AppSettingsParser::new());
    registry.extend(extra_parsers);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat_map::FlatMap;
    use mockall::mock;
    use std::fs;
    use tempfile::TempDir;

    mock! {
        Provider {}

        impl ConfigurationProvider for Provider {
            fn load(&self) -> Result<FlatMap>;
            fn describe(&self) -> String;
        }
    }

    impl std::fmt::Debug for MockProvider {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockProvider").finish()
        }
    }

    fn mock_provider(pairs: &'static [(&'static str, &'static str)]) -> MockProvider {
        let mut provider = MockProvider::new();
        provider
            .expect_load()
            .returning(move || Ok(pairs.iter().copied().collect()));
        provider
            .expect_describe()
            .return_const("mock".to_string());
        provider
    }

    #[test]
    fn test_provider_ids_follow_registration_order() {
        let builder = ConfigurationBuilder::new()
            .add_in_memory(vec![("a", "1")])
            .add_in_memory(vec![("b", "2")]);
        let ids: Vec<usize> = builder.providers().map(|(id, _)| id.index()).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_last_registered_wins() {
        let tree = ConfigurationBuilder::new()
            .add(mock_provider(&[("Key", "first")]))
            .add(mock_provider(&[("KEY", "second")]))
            .build()
            .unwrap();
        assert_eq!(tree.get("key"), Some("second"));
        assert_eq!(tree.get_entry("key").unwrap().origin().index(), 1);
    }

    #[test]
    fn test_build_is_fail_fast() {
        let mut failing = MockProvider::new();
        failing.expect_describe().return_const("broken".to_string());
        failing.expect_load().times(1).returning(|| {
            Err(Error::FileNotFound {
                path: PathBuf::from("/missing.ini"),
            })
        });
        let mut never_loaded = MockProvider::new();
        never_loaded.expect_describe().return_const("later".to_string());
        never_loaded.expect_load().times(0);

        let result = ConfigurationBuilder::new()
            .add(failing)
            .add(never_loaded)
            .build();
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_each_build_reloads() {
        let mut provider = MockProvider::new();
        provider.expect_describe().return_const("counted".to_string());
        provider
            .expect_load()
            .times(2)
            .returning(|| Ok(FlatMap::new()));

        let builder = ConfigurationBuilder::new().add(provider);
        builder.build().unwrap();
        builder.build().unwrap();
    }

    #[test]
    fn test_empty_paths_rejected() {
        assert!(matches!(
            ConfigurationBuilder::new().add_ini_file("", false),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(ConfigurationBuilder::new().add_file("", true).is_err());
        assert!(ConfigurationBuilder::new().add_content("", Vec::new()).is_err());
        assert!(ConfigurationBuilder::new().with_base_path("").is_err());
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let result = ConfigurationBuilder::new().add_file("settings.toml", true);
        assert!(matches!(result, Err(Error::InvalidArgument { ref reason, .. }) if reason.contains("settings.toml")));
    }

    #[test]
    fn test_missing_file_detected_at_build() {
        let temp_dir = TempDir::new().unwrap();
        let builder = ConfigurationBuilder::new()
            .with_base_path(temp_dir.path())
            .unwrap()
            .add_json_file("appsettings.json", false)
            .unwrap();

        fs::write(temp_dir.path().join("appsettings.json"), r#"{"A": 1}"#).unwrap();
        assert_eq!(builder.build().unwrap().get("A"), Some("1"));

        fs::remove_file(temp_dir.path().join("appsettings.json")).unwrap();
        assert!(builder.build().unwrap_err().is_not_found());
    }

    #[test]
    fn test_relative_paths_use_base_path() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("conf")).unwrap();
        fs::write(temp_dir.path().join("conf").join("app.yaml"), "Name: svc\n").unwrap();

        let tree = ConfigurationBuilder::new()
            .with_base_path(temp_dir.path())
            .unwrap()
            .add_file("conf/app.yaml", false)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(tree.get("name"), Some("svc"));
    }

    #[test]
    fn test_add_content_prefers_config_parser() {
        let tree = ConfigurationBuilder::new()
            .add_content(
                r#"<configuration><appSettings><add key="Mode" value="xml"/></appSettings></configuration>"#,
                vec![Box::new(IniParser::new())],
            )
            .unwrap()
            .add_content("Other=ini\n", vec![Box::new(IniParser::new())])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(tree.get("Mode"), Some("xml"));
        assert_eq!(tree.get("Other"), Some("ini"));
    }

    #[test]
    fn test_add_content_without_extras_reports_parse_error() {
        let result = ConfigurationBuilder::new()
            .add_content("plain=text", Vec::new())
            .unwrap()
            .build();
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn test_add_object() {
        #[derive(Serialize)]
        struct Defaults {
            retry: u32,
        }

        let tree = ConfigurationBuilder::new()
            .add_object(&Defaults { retry: 3 })
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(tree.get("Retry"), Some("3"));
        assert!(ConfigurationBuilder::new().add_object(&5).is_err());
    }

    #[test]
    fn test_build_is_idempotent() {
        let builder = ConfigurationBuilder::new()
            .add_in_memory(vec![("A:B", "1"), ("A:C", "2")])
            .add_in_memory(vec![("a:b", "3")]);
        assert_eq!(builder.build().unwrap(), builder.build().unwrap());
    }

    #[test]
    fn test_tree_records_provider_descriptions() {
        let tree = ConfigurationBuilder::new()
            .add_in_memory(vec![("A", "1")])
            .add_environment_variables_with_prefix("CONFSTACK_TEST_UNUSED_PREFIX_")
            .build()
            .unwrap();
        assert_eq!(tree.providers().len(), 2);
        assert_eq!(tree.origin("a"), Some("in-memory values (1 keys)"));
    }
}
