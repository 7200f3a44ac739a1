//! Environment variable source.
//!
//! Variable names map to keys by replacing `__` with the key delimiter, so
//! `ADBLOCK__HOUSE` becomes `ADBLOCK:HOUSE` (which matches `AdBlock:House`
//! because keys are case-insensitive).
//!
//! Connection strings exported by hosting platforms are recognized by their
//! prefix and moved under `ConnectionStrings`:
//!
//! | Prefix             | Provider name written to `<name>_ProviderName` |
//! |--------------------|------------------------------------------------|
//! | `MYSQLCONNSTR_`    | `MySql.Data.MySqlClient`                       |
//! | `SQLAZURECONNSTR_` | `System.Data.SqlClient`                        |
//! | `SQLCONNSTR_`      | `System.Data.SqlClient`                        |
//! | `CUSTOMCONNSTR_`   | none                                           |

use std::env;

use crate::error::Result;
use crate::flat_map::FlatMap;
use crate::key::KEY_DELIMITER;

use super::ConfigurationProvider;

const CONNECTION_STRING_PREFIXES: [(&str, Option<&str>); 4] = [
    ("MYSQLCONNSTR_", Some("MySql.Data.MySqlClient")),
    ("SQLAZURECONNSTR_", Some("System.Data.SqlClient")),
    ("SQLCONNSTR_", Some("System.Data.SqlClient")),
    ("CUSTOMCONNSTR_", None),
];

/// Provider reading environment variables.
///
/// By default the live process environment is read at load time (sorted by
/// name so repeated builds see a stable order). A fixed snapshot can be
/// supplied instead.
///
/// # Examples
///
/// ```
/// use confstack::{ConfigurationProvider, EnvironmentVariablesProvider};
///
/// let provider = EnvironmentVariablesProvider::from_snapshot(vec![
///     ("APP_ADBLOCK__HOUSE", "Origin"),
///     ("PATH", "/usr/bin"),
/// ])
/// .with_prefix("APP_");
///
/// let map = provider.load().unwrap();
/// assert_eq!(map.get("AdBlock:House"), Some("Origin"));
/// assert_eq!(map.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnvironmentVariablesProvider {
    prefix: Option<String>,
    snapshot: Option<Vec<(String, String)>>,
}

impl EnvironmentVariablesProvider {
    /// Read the whole process environment at load time.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed set of variables instead of the process environment.
    pub fn from_snapshot<I, K, V>(variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: None,
            snapshot: Some(
                variables
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Keep only variables whose key starts with `prefix` (case-insensitive)
    /// and strip the prefix from the resulting keys.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// The prefix filter, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn variables(&self) -> Vec<(String, String)> {
        if let Some(snapshot) = &self.snapshot {
            return snapshot.clone();
        }

        let mut variables: Vec<(String, String)> = env::vars_os()
            .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (name, _) => {
                    log::debug!("Skipping non-UTF-8 environment variable {name:?}");
                    None
                }
            })
            .collect();
        variables.sort_by(|a, b| a.0.cmp(&b.0));
        variables
    }

    fn add_if_prefixed(&self, map: &mut FlatMap, key: &str, value: &str) {
        let key = match &self.prefix {
            Some(prefix) => {
                let prefix = normalize_name(prefix);
                match strip_prefix_ignore_case(key, &prefix) {
                    Some(stripped) => stripped,
                    None => return,
                }
            }
            None => key,
        };
        if !key.is_empty() {
            map.insert(key, value);
        }
    }
}

impl ConfigurationProvider for EnvironmentVariablesProvider {
    fn load(&self) -> Result<FlatMap> {
        let mut map = FlatMap::new();

        for (name, value) in self.variables() {
            let connection = CONNECTION_STRING_PREFIXES
                .iter()
                .find_map(|(prefix, provider)| {
                    strip_prefix_ignore_case(&name, prefix).map(|rest| (rest, *provider))
                });

            match connection {
                Some((rest, provider)) => {
                    let key = format!("ConnectionStrings{KEY_DELIMITER}{}", normalize_name(rest));
                    self.add_if_prefixed(&mut map, &key, &value);
                    if let Some(provider) = provider {
                        let key = format!("{key}_ProviderName");
                        self.add_if_prefixed(&mut map, &key, provider);
                    }
                }
                None => self.add_if_prefixed(&mut map, &normalize_name(&name), &value),
            }
        }

        Ok(map)
    }

    fn describe(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("environment variables with prefix {prefix}"),
            None => "environment variables".to_string(),
        }
    }
}

/// Map an environment variable name to a key (`__` becomes `:`).
fn normalize_name(name: &str) -> String {
    name.replace("__", &KEY_DELIMITER.to_string())
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}
