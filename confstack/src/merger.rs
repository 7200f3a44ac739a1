//! Last-wins merging of provider outputs.
//!
//! Layers are merged in registration order. A key first seen in an early
//! layer keeps its position (and its spelling) in the merged sequence even
//! when a later layer overrides its value; only the value and the origin
//! change.

use std::collections::HashMap;

use crate::flat_map::FlatMap;
use crate::key::ConfigKey;
use crate::source::ProviderId;

/// One merged key/value pair together with the provider that supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    key: ConfigKey,
    value: String,
    origin: ProviderId,
}

impl ConfigEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(key: ConfigKey, value: impl Into<String>, origin: ProviderId) -> Self {
        Self {
            key,
            value: value.into(),
            origin,
        }
    }

    /// The full key, spelled as it was first seen.
    #[must_use]
    pub fn key(&self) -> &ConfigKey {
        &self.key
    }

    /// The winning value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The provider whose value won.
    #[must_use]
    pub fn origin(&self) -> ProviderId {
        self.origin
    }
}

/// Accumulates provider layers into a single ordered entry list.
///
/// # Examples
///
/// ```
/// use confstack::merger::ConfigMerger;
/// use confstack::FlatMap;
///
/// let defaults: FlatMap = vec![("AdBlock:House", "Contoso"), ("Retry:Count", "3")]
///     .into_iter()
///     .collect();
/// let overrides: FlatMap = vec![("adblock:house", "Origin")].into_iter().collect();
///
/// let mut merger = ConfigMerger::new();
/// merger.merge_layer(0, defaults);
/// merger.merge_layer(1, overrides);
/// let entries = merger.finish();
///
/// assert_eq!(entries[0].key().as_str(), "AdBlock:House");
/// assert_eq!(entries[0].value(), "Origin");
/// assert_eq!(entries[0].origin().index(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ConfigMerger {
    entries: Vec<ConfigEntry>,
    index: HashMap<String, usize>,
}

impl ConfigMerger {
    /// Create an empty merger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one provider's output on top of everything merged so far.
    pub fn merge_layer(&mut self, origin: impl Into<ProviderId>, layer: FlatMap) {
        let origin = origin.into();
        for (key, value) in layer {
            if let Some(&idx) = self.index.get(key.normalized()) {
                let entry = &mut self.entries[idx];
                log::trace!(
                    "{} overridden by provider {origin} (was set by {})",
                    entry.key,
                    entry.origin
                );
                entry.value = value;
                entry.origin = origin;
            } else {
                self.index
                    .insert(key.normalized().to_string(), self.entries.len());
                self.entries.push(ConfigEntry::new(key, value, origin));
            }
        }
    }

    /// Number of distinct keys merged so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been merged yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the merger, returning entries in first-seen order.
    #[must_use]
    pub fn finish(self) -> Vec<ConfigEntry> {
        self.entries
    }

    /// Merge a sequence of layers in one go.
    pub fn merge<I>(layers: I) -> Vec<ConfigEntry>
    where
        I: IntoIterator<Item = (ProviderId, FlatMap)>,
    {
        let mut merger = Self::new();
        for (origin, layer) in layers {
            merger.merge_layer(origin, layer);
        }
        merger.finish()
    }
}
