//! In-memory source.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::flat_map::FlatMap;
use crate::key::{ConfigKey, KEY_DELIMITER};
use crate::parser::flatten_json;

use super::ConfigurationProvider;

/// Provider serving values held in memory.
///
/// Values are captured when the provider is created; every load returns the
/// same map.
///
/// # Examples
///
/// ```
/// use confstack::{ConfigurationProvider, MemoryConfigurationProvider};
/// use serde::Serialize;
///
/// let pairs = MemoryConfigurationProvider::new(vec![("Retry:Count", "42")]);
/// assert_eq!(pairs.load().unwrap().get("retry:count"), Some("42"));
///
/// #[derive(Serialize)]
/// struct Retry { count: u32, delays: Vec<u32> }
///
/// #[derive(Serialize)]
/// struct Settings { retry: Retry }
///
/// let object = MemoryConfigurationProvider::from_serializable(&Settings {
///     retry: Retry { count: 3, delays: vec![10, 20] },
/// })
/// .unwrap();
/// let map = object.load().unwrap();
/// assert_eq!(map.get("Retry:Count"), Some("3"));
/// assert_eq!(map.get("Retry:Delays:1"), Some("20"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigurationProvider {
    data: FlatMap,
}

impl MemoryConfigurationProvider {
    /// Create a provider from key/value pairs (later duplicates win).
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ConfigKey>,
        V: Into<String>,
    {
        Self {
            data: pairs.into_iter().collect(),
        }
    }

    /// Create a provider from a JSON object graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the root is not an object.
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::invalid_argument(
                "value",
                "in-memory object graph root must be an object",
            ));
        }
        let mut data = FlatMap::new();
        flatten_json(&ConfigKey::root(), value, &mut data);
        Ok(Self { data })
    }

    /// Create a provider from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the value cannot be serialized
    /// or does not serialize to an object.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::invalid_argument("value", format!("cannot serialize: {e}")))?;
        Self::from_value(&value)
    }

    /// Prefix every key with `section`.
    #[must_use]
    pub fn under(mut self, section: &str) -> Self {
        if section.is_empty() {
            return self;
        }
        self.data = self
            .data
            .into_iter()
            .map(|(key, value)| (format!("{section}{KEY_DELIMITER}{key}"), value))
            .collect();
        self
    }
}

impl ConfigurationProvider for MemoryConfigurationProvider {
    fn load(&self) -> Result<FlatMap> {
        Ok(self.data.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory values ({} keys)", self.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pairs() {
        let provider = MemoryConfigurationProvider::new(vec![("a", "1"), ("A", "2"), ("b", "3")]);
        let map = provider.load().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some("2"));
    }

    #[test]
    fn test_from_value_flattens() {
        let provider = MemoryConfigurationProvider::from_value(&json!({
            "AdBlock": { "House": "Contoso", "Slots": [1, 2] },
            "Enabled": false
        }))
        .unwrap();
        let map = provider.load().unwrap();
        assert_eq!(map.get("AdBlock:House"), Some("Contoso"));
        assert_eq!(map.get("AdBlock:Slots:0"), Some("1"));
        assert_eq!(map.get("Enabled"), Some("false"));
    }

    #[test]
    fn test_from_value_requires_object() {
        let result = MemoryConfigurationProvider::from_value(&json!("scalar"));
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_under_prefixes_keys() {
        let provider = MemoryConfigurationProvider::new(vec![("House", "Contoso")]).under("AdBlock");
        assert_eq!(provider.load().unwrap().get("AdBlock:House"), Some("Contoso"));
        let unchanged = MemoryConfigurationProvider::new(vec![("x", "1")]).under("");
        assert_eq!(unchanged.load().unwrap().get("x"), Some("1"));
    }

    #[test]
    fn test_load_is_repeatable() {
        let provider = MemoryConfigurationProvider::new(vec![("a", "1")]);
        assert_eq!(provider.load().unwrap(), provider.load().unwrap());
    }

    #[test]
    fn test_describe_counts_keys() {
        let provider = MemoryConfigurationProvider::new(vec![("a", "1"), ("b", "2")]);
        assert_eq!(provider.describe(), "in-memory values (2 keys)");
    }
}
