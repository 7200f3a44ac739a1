//! The built configuration tree and its section views.
//!
//! A [`ConfigurationTree`] is produced by
//! [`ConfigurationBuilder::build`](crate::ConfigurationBuilder::build). It
//! keeps the merged entries twice: as a flat index for exact lookups, and
//! as a tree of nodes for navigation. Both are immutable once built.
//!
//! Navigation never fails. Asking for a section that does not exist yields
//! an empty [`Section`] whose `exists()` is `false`.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::binder;
use crate::error::{Error, Result};
use crate::key::{normalize_segment, ConfigKey};
use crate::merger::ConfigEntry;
use crate::walk::Walk;

/// One node of the section tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SectionNode {
    key: ConfigKey,
    value: Option<String>,
    children: Vec<SectionNode>,
    lookup: HashMap<String, usize>,
}

impl SectionNode {
    fn new(key: ConfigKey) -> Self {
        Self {
            key,
            value: None,
            children: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    fn child(&self, segment: &str) -> Option<&SectionNode> {
        self.lookup
            .get(&normalize_segment(segment))
            .map(|&idx| &self.children[idx])
    }

    fn child_or_insert(&mut self, segment: &str) -> &mut SectionNode {
        let normalized = normalize_segment(segment);
        let idx = match self.lookup.get(&normalized) {
            Some(&idx) => idx,
            None => {
                let idx = self.children.len();
                self.children.push(SectionNode::new(self.key.join(segment)));
                self.lookup.insert(normalized, idx);
                idx
            }
        };
        &mut self.children[idx]
    }

    fn find(&self, path: &ConfigKey) -> Option<&SectionNode> {
        path.segments()
            .try_fold(self, |node, segment| node.child(segment))
    }
}

/// The merged, hierarchical result of a build.
///
/// # Examples
///
/// ```
/// use confstack::ConfigurationBuilder;
///
/// let tree = ConfigurationBuilder::new()
///     .add_in_memory(vec![("AdBlock:House", "Contoso"), ("AdBlock:Slots:0", "top")])
///     .build()
///     .unwrap();
///
/// assert_eq!(tree.get("adblock:house"), Some("Contoso"));
/// let names: Vec<_> = tree.children("AdBlock").map(|s| s.key().to_string()).collect();
/// assert_eq!(names, vec!["House", "Slots"]);
/// assert!(!tree.section("Missing").exists());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationTree {
    root: SectionNode,
    entries: Vec<ConfigEntry>,
    index: HashMap<String, usize>,
    providers: Vec<String>,
}

impl ConfigurationTree {
    /// Assemble a tree from merged entries.
    ///
    /// `providers` holds the description of every provider, indexed by
    /// [`ProviderId`](crate::ProviderId).
    pub(crate) fn from_entries(entries: Vec<ConfigEntry>, providers: Vec<String>) -> Self {
        let mut root = SectionNode::new(ConfigKey::root());
        let mut index = HashMap::with_capacity(entries.len());

        for (idx, entry) in entries.iter().enumerate() {
            let node = entry
                .key()
                .segments()
                .fold(&mut root, |node, segment| node.child_or_insert(segment));
            node.value = Some(entry.value().to_string());
            index.insert(entry.key().normalized().to_string(), idx);
        }

        Self {
            root,
            entries,
            index,
            providers,
        }
    }

    /// Look up the value stored at `path` (case-insensitive).
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.get_entry(path).map(ConfigEntry::value)
    }

    /// Look up the merged entry stored at `path`.
    #[must_use]
    pub fn get_entry(&self, path: &str) -> Option<&ConfigEntry> {
        let key = ConfigKey::parse(path);
        self.index
            .get(key.normalized())
            .map(|&idx| &self.entries[idx])
    }

    /// Describe the provider whose value won at `path`.
    #[must_use]
    pub fn origin(&self, path: &str) -> Option<&str> {
        let entry = self.get_entry(path)?;
        self.providers
            .get(entry.origin().index())
            .map(String::as_str)
    }

    /// Parse the value at `path` into `T`.
    ///
    /// Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if the value does not parse.
    ///
    /// # Examples
    ///
    /// ```
    /// use confstack::ConfigurationBuilder;
    ///
    /// let tree = ConfigurationBuilder::new()
    ///     .add_in_memory(vec![("Retry:Count", "42")])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(tree.get_as::<u32>("retry:count").unwrap(), Some(42));
    /// assert_eq!(tree.get_as::<u32>("retry:delay").unwrap(), None);
    /// ```
    pub fn get_as<T>(&self, path: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get(path).map(|value| convert(path, value)).transpose()
    }

    /// Bind the section at `path` to a deserializable type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the section's shape or values do not fit
    /// `T`.
    pub fn bind<'a, T: Deserialize<'a>>(&'a self, path: &str) -> Result<T> {
        self.section(path).bind()
    }

    /// The root section (empty path).
    #[must_use]
    pub fn root(&self) -> Section<'_> {
        Section::borrowed(&self.root)
    }

    /// Navigate to the section at `path`.
    #[must_use]
    pub fn section(&self, path: &str) -> Section<'_> {
        self.root().section(path)
    }

    /// Immediate children of the section at `path`.
    #[must_use]
    pub fn children(&self, path: &str) -> Children<'_> {
        self.section(path).children()
    }

    /// Depth-first traversal of every section below the root.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        self.root().walk()
    }

    /// Merged entries in first-seen order.
    pub fn entries(&self) -> impl Iterator<Item = &ConfigEntry> + '_ {
        self.entries.iter()
    }

    /// Descriptions of the providers that produced this tree, in
    /// registration order.
    #[must_use]
    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    /// Number of keys holding a value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no provider contributed any key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn convert<T>(path: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| Error::Conversion {
        key: path.to_string(),
        value: value.to_string(),
        message: e.to_string(),
    })
}

/// Borrowed view of one section of a [`ConfigurationTree`].
///
/// A view can point at a path that does not exist in the tree; such a view
/// has no value and no children.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    path: Cow<'a, ConfigKey>,
    node: Option<&'a SectionNode>,
}

impl<'a> Section<'a> {
    fn borrowed(node: &'a SectionNode) -> Self {
        Self {
            path: Cow::Borrowed(&node.key),
            node: Some(node),
        }
    }

    fn absent(path: ConfigKey) -> Self {
        Self {
            path: Cow::Owned(path),
            node: None,
        }
    }

    /// Last segment of the path (empty for the root).
    #[must_use]
    pub fn key(&self) -> &str {
        self.path.last_segment().unwrap_or("")
    }

    /// Full path of the section.
    #[must_use]
    pub fn path(&self) -> &ConfigKey {
        &self.path
    }

    /// Value stored directly at this section.
    #[must_use]
    pub fn value(&self) -> Option<&'a str> {
        self.node.and_then(|node| node.value.as_deref())
    }

    /// Whether the section holds a value or has children.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.node
            .is_some_and(|node| node.value.is_some() || !node.children.is_empty())
    }

    /// Whether the section has at least one child.
    #[must_use]
    pub fn has_children(&self) -> bool {
        self.node.is_some_and(|node| !node.children.is_empty())
    }

    /// Value at a path relative to this section.
    #[must_use]
    pub fn get(&self, relative: &str) -> Option<&'a str> {
        self.section(relative).value()
    }

    /// Navigate to a path relative to this section.
    #[must_use]
    pub fn section(&self, relative: &str) -> Section<'a> {
        let relative = ConfigKey::parse(relative);
        match self.node.and_then(|node| node.find(&relative)) {
            Some(node) => Section::borrowed(node),
            None => Section::absent(self.path.join(relative.as_str())),
        }
    }

    /// Immediate children in first-insertion order.
    #[must_use]
    pub fn children(&self) -> Children<'a> {
        let nodes: &'a [SectionNode] = match self.node {
            Some(node) => &node.children,
            None => &[],
        };
        Children {
            inner: nodes.iter(),
        }
    }

    /// Depth-first traversal of every section below this one.
    #[must_use]
    pub fn walk(&self) -> Walk<'a> {
        Walk::new(self.children())
    }

    /// Parse the value at a relative path into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if the value does not parse.
    pub fn get_as<T>(&self, relative: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let section = self.section(relative);
        section
            .value()
            .map(|value| convert(section.path().as_str(), value))
            .transpose()
    }

    /// Bind this section to a deserializable type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the section's shape or values do not fit
    /// `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use confstack::ConfigurationBuilder;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Retry {
    ///     count: u32,
    ///     delays: Vec<u64>,
    /// }
    ///
    /// let tree = ConfigurationBuilder::new()
    ///     .add_in_memory(vec![
    ///         ("Retry:Count", "3"),
    ///         ("Retry:Delays:0", "100"),
    ///         ("Retry:Delays:1", "500"),
    ///     ])
    ///     .build()
    ///     .unwrap();
    ///
    /// let retry: Retry = tree.section("Retry").bind().unwrap();
    /// assert_eq!(retry.count, 3);
    /// assert_eq!(retry.delays, vec![100, 500]);
    /// ```
    pub fn bind<T: Deserialize<'a>>(&self) -> Result<T> {
        binder::bind(self.clone()).map_err(|source| Error::Bind {
            path: self.path.to_string(),
            source,
        })
    }
}

impl fmt::Display for Section<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{} = {value}", self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

/// Iterator over the immediate children of a [`Section`].
///
/// Cloning the iterator restarts nothing; it copies the current position.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    inner: std::slice::Iter<'a, SectionNode>,
}

impl<'a> Iterator for Children<'a> {
    type Item = Section<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Section::borrowed)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(Section::borrowed)
    }
}

impl ExactSizeIterator for Children<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ProviderId;

    fn tree(pairs: &[(&str, &str)]) -> ConfigurationTree {
        let entries = pairs
            .iter()
            .map(|(k, v)| ConfigEntry::new(ConfigKey::parse(k), *v, ProviderId::new(0)))
            .collect();
        ConfigurationTree::from_entries(entries, vec!["test values".to_string()])
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let tree = tree(&[("AdBlock:House", "Contoso")]);
        assert_eq!(tree.get("ADBLOCK:house"), Some("Contoso"));
        assert_eq!(tree.get("AdBlock"), None);
        assert_eq!(tree.get("Missing"), None);
    }

    #[test]
    fn test_section_with_value_and_children() {
        let tree = tree(&[("A:B", "outer"), ("A:B:C", "inner")]);
        let section = tree.section("a:b");
        assert_eq!(section.value(), Some("outer"));
        assert_eq!(section.get("c"), Some("inner"));
        assert_eq!(section.children().len(), 1);
    }

    #[test]
    fn test_children_in_first_insertion_order() {
        let tree = tree(&[("S:Zeta", "1"), ("S:Alpha", "2"), ("s:zeta:x", "3")]);
        let keys: Vec<_> = tree.children("S").map(|s| s.key().to_string()).collect();
        assert_eq!(keys, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_children_restartable() {
        let tree = tree(&[("S:A", "1"), ("S:B", "2")]);
        let children = tree.children("S");
        assert_eq!(children.clone().count(), 2);
        assert_eq!(children.count(), 2);
    }

    #[test]
    fn test_absent_section() {
        let tree = tree(&[("A", "1")]);
        let missing = tree.section("Nope:Deeper");
        assert!(!missing.exists());
        assert_eq!(missing.value(), None);
        assert_eq!(missing.children().count(), 0);
        assert_eq!(missing.path().as_str(), "Nope:Deeper");
        assert_eq!(missing.key(), "Deeper");
        assert!(!missing.section("x").exists());
    }

    #[test]
    fn test_section_path_uses_first_spelling() {
        let tree = tree(&[("Logging:Level", "info"), ("LOGGING:Format", "json")]);
        let section = tree.section("logging:format");
        assert_eq!(section.path().as_str(), "Logging:Format");
    }

    #[test]
    fn test_root_section() {
        let tree = tree(&[("A", "1"), ("B:C", "2")]);
        let root = tree.root();
        assert!(root.exists());
        assert_eq!(root.key(), "");
        assert_eq!(root.children().count(), 2);
        assert!(tree.section("").exists());
    }

    #[test]
    fn test_empty_tree() {
        let tree = tree(&[]);
        assert!(tree.is_empty());
        assert!(!tree.root().exists());
        assert_eq!(tree.walk().count(), 0);
    }

    #[test]
    fn test_origin() {
        let tree = tree(&[("A", "1")]);
        assert_eq!(tree.origin("a"), Some("test values"));
        assert_eq!(tree.origin("b"), None);
    }

    #[test]
    fn test_get_as() {
        let tree = tree(&[("Port", " 8080 "), ("Name", "svc")]);
        assert_eq!(tree.get_as::<u16>("port").unwrap(), Some(8080));
        assert!(matches!(
            tree.get_as::<u16>("name"),
            Err(Error::Conversion { ref key, .. }) if key == "name"
        ));
        assert_eq!(tree.section("").get_as::<String>("Name").unwrap().as_deref(), Some("svc"));
    }

    #[test]
    fn test_entries_in_merge_order() {
        let tree = tree(&[("b", "1"), ("a", "2")]);
        let keys: Vec<_> = tree.entries().map(|e| e.key().as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_section_display() {
        let tree = tree(&[("A:B", "1")]);
        assert_eq!(tree.section("A:B").to_string(), "A:B = 1");
        assert_eq!(tree.section("A").to_string(), "A");
    }

    #[test]
    fn test_tree_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConfigurationTree>();
    }
}
