//! Compile units: what happens to each compileable source file.
//!
//! | `NoCompile` | `IncludeSource` | bundler entry | source record |
//! |-------------|-----------------|---------------|---------------|
//! | no          | no              | yes           | dropped       |
//! | no          | yes             | yes           | kept, inert   |
//! | yes         | yes             | no            | kept as-is    |
//! | yes         | no              | no            | dropped       |

use std::path::{Path, PathBuf};

use super::meta::FileOptions;
use crate::record::{MODULE_TYPE, Record, TEXT, TITLE};

/// Extensions handed to the bundler as entry points.
pub const COMPILEABLE_EXTENSIONS: &[&str] = &["ts", "tsx", "cjs", "mjs", "jsx"];

/// Whether `path` has a compileable extension (case-insensitive).
pub fn is_compileable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            COMPILEABLE_EXTENSIONS
                .iter()
                .any(|c| ext.eq_ignore_ascii_case(c))
        })
}

/// One compileable file and its policy.
#[derive(Debug, Clone)]
pub struct CompileUnit {
    pub path: PathBuf,
    pub meta: Record,
    pub compile: bool,
    pub keep_source: bool,
}

impl CompileUnit {
    pub fn new(path: PathBuf, meta: Record) -> Self {
        let options = FileOptions::from_meta(&meta);
        Self {
            path,
            meta,
            compile: !options.no_compile,
            keep_source: options.include_source,
        }
    }

    /// The verbatim source record, if it is kept.
    ///
    /// When the file is also compiled, the source loses its `module-type`
    /// so the engine does not execute both versions.
    pub fn source_record(&self, text: String) -> Option<Record> {
        if !self.keep_source {
            return None;
        }
        let mut record = self.meta.clone().with(TEXT, text);
        if self.compile {
            record.remove(MODULE_TYPE);
        }
        Some(record)
    }

    /// Metadata the compiled output inherits, retitled.
    ///
    /// `None` when the unit is not compiled.
    pub fn compiled_meta(&self) -> Option<Record> {
        if !self.compile {
            return None;
        }
        let title = self.meta.title()?;
        let compiled = compiled_title(title, self.keep_source);
        Some(self.meta.clone().with(TITLE, compiled))
    }
}

/// Title of the compiled output for a source titled `title`.
///
/// The last extension of the final `/` segment becomes `js`. When the
/// source is kept, `js` is appended instead of replacing anything that is
/// not a compileable extension, so the two titles never collide.
pub fn compiled_title(title: &str, keep_source: bool) -> String {
    let (head, last) = match title.rfind('/') {
        Some(i) => (&title[..=i], &title[i + 1..]),
        None => ("", title),
    };

    let mut parts: Vec<&str> = last.split('.').collect();
    let ext = parts
        .last()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let replaceable = if keep_source {
        COMPILEABLE_EXTENSIONS.contains(&ext.as_str())
    } else {
        ext == "js" || COMPILEABLE_EXTENSIONS.contains(&ext.as_str())
    };

    if parts.len() < 2 || !replaceable {
        parts.push("js");
    } else if let Some(last) = parts.last_mut() {
        *last = "js";
    }
    format!("{head}{}", parts.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{INCLUDE_SOURCE, NO_COMPILE};

    #[test]
    fn test_is_compileable() {
        for name in ["a.ts", "a.TSX", "a.cjs", "a.mjs", "a.jsx"] {
            assert!(is_compileable(Path::new(name)), "{name}");
        }
        for name in ["a.js", "a.css", "a", "a.d"] {
            assert!(!is_compileable(Path::new(name)), "{name}");
        }
    }

    #[test]
    fn test_compiled_title_drop_source() {
        assert_eq!(compiled_title("$:/plugins/me/foo/index.ts", false), "$:/plugins/me/foo/index.js");
        assert_eq!(compiled_title("$:/plugins/me/foo/index.js", false), "$:/plugins/me/foo/index.js");
        assert_eq!(compiled_title("$:/plugins/me/foo/index", false), "$:/plugins/me/foo/index.js");
        assert_eq!(compiled_title("$:/plugins/me/foo/widget.v2", false), "$:/plugins/me/foo/widget.v2.js");
    }

    #[test]
    fn test_compiled_title_keep_source() {
        assert_eq!(compiled_title("$:/plugins/me/foo/index.ts", true), "$:/plugins/me/foo/index.js");
        assert_eq!(compiled_title("$:/plugins/me/foo/index.js", true), "$:/plugins/me/foo/index.js.js");
        assert_eq!(compiled_title("$:/plugins/me/foo/index", true), "$:/plugins/me/foo/index.js");
        assert_eq!(compiled_title("a.b/c.TSX", true), "a.b/c.js");
    }

    #[test]
    fn test_policy_matrix() {
        let meta = |no_compile: &str, include: &str| {
            Record::new("$:/plugins/me/foo/index.ts")
                .with(MODULE_TYPE, "startup")
                .with(NO_COMPILE, no_compile)
                .with(INCLUDE_SOURCE, include)
        };
        let unit = |no_compile, include| CompileUnit::new(PathBuf::from("/p/index.ts"), meta(no_compile, include));

        // compile + drop source
        let u = unit("false", "false");
        assert!(u.source_record("src".into()).is_none());
        assert_eq!(u.compiled_meta().unwrap().title(), Some("$:/plugins/me/foo/index.js"));

        // compile + keep source
        let u = unit("false", "true");
        let source = u.source_record("src".into()).unwrap();
        assert_eq!(source.title(), Some("$:/plugins/me/foo/index.ts"));
        assert_eq!(source.text(), Some("src"));
        assert!(!source.contains(MODULE_TYPE));
        assert_eq!(u.compiled_meta().unwrap().get(MODULE_TYPE), Some("startup"));

        // skip compile + keep source
        let u = unit("true", "true");
        assert_eq!(u.source_record("src".into()).unwrap().get(MODULE_TYPE), Some("startup"));
        assert!(u.compiled_meta().is_none());

        // skip compile + drop source
        let u = unit("true", "false");
        assert!(u.source_record("src".into()).is_none());
        assert!(u.compiled_meta().is_none());
    }
}
