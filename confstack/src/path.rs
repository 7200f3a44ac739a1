//! Resolution of file source paths.
//!
//! File sources are resolved against the builder's base path:
//! - `~` and `~/path` expand to the home directory
//! - relative paths are joined onto the base path
//! - `.` and `..` components are resolved lexically (symlinks are not
//!   followed, so the file does not have to exist yet)

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Expand tilde (~) to the home directory.
///
/// Handles `~` and `~/path` but not `~user`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the home directory cannot be
/// determined or the path uses `~user` syntax.
///
/// # Examples
///
/// ```
/// use confstack::path::expand_tilde;
/// use std::path::Path;
///
/// let expanded = expand_tilde(Path::new("~/app.ini")).unwrap();
/// assert!(expanded.is_absolute());
/// assert!(expanded.ends_with("app.ini"));
///
/// assert_eq!(expand_tilde(Path::new("/etc/app.ini")).unwrap(), Path::new("/etc/app.ini"));
/// ```
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let Some(path_str) = path.to_str() else {
        return Ok(path.to_path_buf());
    };

    if !path_str.starts_with('~') {
        return Ok(path.to_path_buf());
    }

    let home = home::home_dir().ok_or_else(|| {
        Error::invalid_argument("path", format!("cannot expand {path_str}: no home directory"))
    })?;

    if path_str == "~" {
        Ok(home)
    } else if path_str.starts_with("~/") || path_str.starts_with("~\\") {
        Ok(home.join(&path_str[2..]))
    } else {
        Err(Error::invalid_argument(
            "path",
            format!("~user syntax is not supported: {path_str}"),
        ))
    }
}

/// Resolve `.` and `..` components lexically.
///
/// `..` at the root stays at the root.
///
/// # Examples
///
/// ```
/// use confstack::path::resolve_components;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(resolve_components(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
/// assert_eq!(resolve_components(Path::new("/a/../../c")), PathBuf::from("/c"));
/// ```
#[must_use]
pub fn resolve_components(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                result.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => result.push(component),
            },
        }
    }

    result
}

/// Resolve a file source path against a base path.
///
/// # Errors
///
/// Returns an error if tilde expansion fails.
///
/// # Examples
///
/// ```
/// use confstack::path::resolve_source_path;
/// use std::path::{Path, PathBuf};
///
/// let resolved = resolve_source_path(Path::new("/srv/app"), "conf/../app.ini").unwrap();
/// assert_eq!(resolved, PathBuf::from("/srv/app/app.ini"));
///
/// let absolute = resolve_source_path(Path::new("/srv/app"), "/etc/app.ini").unwrap();
/// assert_eq!(absolute, PathBuf::from("/etc/app.ini"));
/// ```
pub fn resolve_source_path(base: &Path, path: &str) -> Result<PathBuf> {
    let expanded = expand_tilde(Path::new(path))?;
    let joined = if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    };
    Ok(resolve_components(&joined))
}

/// The default base path: the current directory, or `.` if it cannot be
/// determined.
#[must_use]
pub fn default_base_path() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
