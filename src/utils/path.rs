//! Path normalization and title encoding helpers.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `clean_path` - lexical `.`/`..` resolution without touching the disk
//! - `is_within` - string-prefix containment used by cache invalidation
//! - `encode_title` - file-name-safe record titles

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::path::{Component, Path, PathBuf};

/// Characters escaped when a record title becomes a file name.
///
/// Leaves the unreserved set of `encodeURIComponent` intact.
const TITLE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Resolve `.` and `..` components lexically.
///
/// Bundler metafiles report paths relative to the working directory
/// (`../shared/util.ts`), and those files may not exist anymore by the
/// time the output is mapped, so `canonicalize` is not an option.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether `path` is `dir` itself or lies below it, compared as strings.
///
/// This is a plain prefix test: `/src/foo-bar` counts as inside `/src/foo`.
pub fn is_within(path: &Path, dir: &Path) -> bool {
    path.to_string_lossy().starts_with(dir.to_string_lossy().as_ref())
}

/// Percent-encode a record title for use as a file name.
pub fn encode_title(title: &str) -> String {
    utf8_percent_encode(title, TITLE_ENCODE_SET).to_string()
}

/// Expand `~` and join relative paths onto `root`.
pub fn resolve_config_path(root: &Path, path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(raw.as_ref()).into_owned());
    let full = if expanded.is_relative() {
        root.join(expanded)
    } else {
        expanded
    };
    normalize_path(&full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(
            clean_path(Path::new("/src/foo/../bar/./index.ts")),
            PathBuf::from("/src/bar/index.ts")
        );
        assert_eq!(
            clean_path(Path::new("../shared/util.ts")),
            PathBuf::from("../shared/util.ts")
        );
    }

    #[test]
    fn test_is_within_prefix() {
        let dir = Path::new("/proj/src/foo");
        assert!(is_within(Path::new("/proj/src/foo"), dir));
        assert!(is_within(Path::new("/proj/src/foo/lib"), dir));
        assert!(!is_within(Path::new("/proj/src/bar"), dir));
    }

    #[test]
    fn test_encode_title() {
        assert_eq!(
            encode_title("$:/plugins/me/foo"),
            "%24%3A%2Fplugins%2Fme%2Ffoo"
        );
        assert_eq!(encode_title("a-b_c.d"), "a-b_c.d");
    }

    #[test]
    fn test_resolve_config_path_relative() {
        let root = std::env::temp_dir();
        let resolved = resolve_config_path(&root, Path::new("src"));
        assert!(resolved.ends_with("src"));
        assert!(resolved.is_absolute());
    }
}
