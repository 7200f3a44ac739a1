//! Ordered, case-insensitive key/value map.
//!
//! [`FlatMap`] is what every parser and provider produces: a mapping from
//! full configuration paths to string values that remembers the order in
//! which keys were first inserted.

use std::collections::HashMap;

use crate::key::ConfigKey;

/// Ordered mapping of [`ConfigKey`] to string value.
///
/// Re-inserting an existing key (in any casing) replaces its value but keeps
/// the position and spelling of the first insertion.
///
/// # Examples
///
/// ```
/// use confstack::FlatMap;
///
/// let mut map = FlatMap::new();
/// map.insert("Retry:Count", "1");
/// map.insert("Name", "svc");
/// map.insert("retry:count", "42");
///
/// assert_eq!(map.get("RETRY:COUNT"), Some("42"));
/// let keys: Vec<_> = map.iter().map(|(k, _)| k.as_str()).collect();
/// assert_eq!(keys, vec!["Retry:Count", "Name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatMap {
    entries: Vec<(ConfigKey, String)>,
    index: HashMap<String, usize>,
}

impl FlatMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<ConfigKey>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some(&position) = self.index.get(key.normalized()) {
            return Some(std::mem::replace(&mut self.entries[position].1, value));
        }
        self.index
            .insert(key.normalized().to_string(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    /// Remove a key, returning its value.
    ///
    /// Later entries keep their relative order.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let normalized = ConfigKey::parse(key).normalized().to_string();
        let position = self.index.remove(&normalized)?;
        let (_, value) = self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(value)
    }

    /// Look up a value by key (case-insensitive).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = ConfigKey::parse(key);
        self.index
            .get(key.normalized())
            .map(|&position| self.entries[position].1.as_str())
    }

    /// Whether the map contains the key (case-insensitive).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ConfigKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Keep only entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&ConfigKey, &str) -> bool) {
        self.entries.retain(|(k, v)| keep(k, v));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, (k, _))| (k.normalized().to_string(), position))
            .collect();
    }
}

impl IntoIterator for FlatMap {
    type Item = (ConfigKey, String);
    type IntoIter = std::vec::IntoIter<(ConfigKey, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K, V> FromIterator<(K, V)> for FlatMap
where
    K: Into<ConfigKey>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V> Extend<(K, V)> for FlatMap
where
    K: Into<ConfigKey>,
    V: Into<String>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}
