//! Configuration key types.
//!
//! A [`ConfigKey`] is a path of segments joined by [`KEY_DELIMITER`].
//! Keys compare and hash case-insensitively while remembering the spelling
//! they were created with, so `"AdBlock:House"` and `"adblock:HOUSE"` name
//! the same setting but the first spelling is what gets displayed.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Delimiter between the segments of a configuration key.
pub const KEY_DELIMITER: char = ':';

/// A case-insensitive, delimiter-separated configuration path.
///
/// The empty string is the root key, which has no segments.
///
/// # Examples
///
/// ```
/// use confstack::ConfigKey;
///
/// let key = ConfigKey::parse("AdBlock:House");
/// assert_eq!(key, ConfigKey::parse("adblock:HOUSE"));
/// assert_eq!(key.segments().collect::<Vec<_>>(), vec!["AdBlock", "House"]);
/// assert_eq!(key.to_string(), "AdBlock:House");
/// ```
#[derive(Debug, Clone)]
pub struct ConfigKey {
    raw: String,
    normalized: String,
}

impl ConfigKey {
    /// Create a key from its delimited textual form.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            normalized: normalize(raw),
        }
    }

    /// The root key (no segments).
    #[must_use]
    pub fn root() -> Self {
        Self::parse("")
    }

    /// Build a key from individual segments.
    ///
    /// # Examples
    ///
    /// ```
    /// use confstack::ConfigKey;
    ///
    /// let key = ConfigKey::from_segments(["Logging", "Level"]);
    /// assert_eq!(key.as_str(), "Logging:Level");
    /// ```
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(&KEY_DELIMITER.to_string());
        Self::parse(&raw)
    }

    /// Returns the key as originally spelled.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the case-folded form used for comparisons and hashing.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Whether this is the root key.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.raw.is_empty()
    }

    /// Iterate over the segments of the key (none for the root).
    pub fn segments(&self) -> impl Iterator<Item = &str> + Clone {
        let skip_all = self.is_root();
        self.raw
            .split(KEY_DELIMITER)
            .filter(move |_| !skip_all)
    }

    /// Number of segments in the key.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments().count()
    }

    /// Whether the key has no segments (same as [`ConfigKey::is_root`]).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// The final segment, or `None` for the root.
    #[must_use]
    pub fn last_segment(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.raw.rsplit(KEY_DELIMITER).next()
    }

    /// The key without its final segment, or `None` for the root.
    ///
    /// # Examples
    ///
    /// ```
    /// use confstack::ConfigKey;
    ///
    /// let key = ConfigKey::parse("A:B:C");
    /// assert_eq!(key.parent().unwrap().as_str(), "A:B");
    /// assert!(ConfigKey::parse("A").parent().unwrap().is_root());
    /// assert!(ConfigKey::root().parent().is_none());
    /// ```
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.raw.rfind(KEY_DELIMITER) {
            Some(index) => Some(Self::parse(&self.raw[..index])),
            None => Some(Self::root()),
        }
    }

    /// Append a relative path to this key.
    ///
    /// Joining onto the root yields the relative path itself; joining the
    /// empty path yields this key unchanged.
    #[must_use]
    pub fn join(&self, relative: &str) -> Self {
        if self.is_root() {
            return Self::parse(relative);
        }
        if relative.is_empty() {
            return self.clone();
        }
        Self::parse(&format!("{}{KEY_DELIMITER}{relative}", self.raw))
    }
}

/// Case-fold a key for comparison, one segment at a time.
fn normalize(raw: &str) -> String {
    raw.split(KEY_DELIMITER)
        .map(normalize_segment)
        .collect::<Vec<_>>()
        .join(&KEY_DELIMITER.to_string())
}

/// Case-fold a single key segment.
pub(crate) fn normalize_segment(segment: &str) -> String {
    segment.to_lowercase()
}

impl PartialEq for ConfigKey {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for ConfigKey {}

impl Hash for ConfigKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for ConfigKey {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for ConfigKey {
    fn from(raw: String) -> Self {
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }
}

impl AsRef<str> for ConfigKey {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}
