//! Plugin directory listing and option parsing.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{
    BROWSERS_LIST, DEFAULT_BROWSERS_LIST, EXTERNAL_MODULES, INCLUDE_SOURCE, MINIFY, NO_COMPILE,
    NODE_MODULES_NOT_EXTERNAL, SOURCE_MAP,
};
use crate::engine::folder::{MANIFEST, META_EXT};
use crate::engine::{load_file_metadata, walk_files};
use crate::record::{Record, parse_string_list};

/// Options a plugin declares on its manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOptions {
    pub browsers_list: String,
    pub external_modules: Vec<String>,
    pub node_modules_not_external: Vec<String>,
    pub source_map: bool,
    pub minify: bool,
}

impl PluginOptions {
    pub fn from_manifest(manifest: &Record) -> Self {
        Self {
            browsers_list: manifest
                .get(BROWSERS_LIST)
                .filter(|q| !q.trim().is_empty())
                .unwrap_or(DEFAULT_BROWSERS_LIST)
                .to_string(),
            external_modules: manifest
                .get(EXTERNAL_MODULES)
                .map(parse_string_list)
                .unwrap_or_default(),
            node_modules_not_external: manifest
                .get(NODE_MODULES_NOT_EXTERNAL)
                .map(parse_string_list)
                .unwrap_or_default(),
            source_map: is_true(manifest.get(SOURCE_MAP)),
            minify: !is_false(manifest.get(MINIFY)),
        }
    }
}

/// Options a single file declares in its metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileOptions {
    pub no_compile: bool,
    pub include_source: bool,
}

impl FileOptions {
    pub fn from_meta(meta: &Record) -> Self {
        Self {
            no_compile: is_true(meta.get(NO_COMPILE)),
            include_source: is_true(meta.get(INCLUDE_SOURCE)),
        }
    }
}

/// Whether a record opted out of minification via its own field.
pub fn opts_out_of_minify(record: &Record) -> bool {
    is_false(record.get(MINIFY))
}

fn is_true(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn is_false(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("false"))
}

/// Sub-directories of `base` that carry a plugin manifest, sorted.
///
/// A missing `base` yields no directories.
pub fn plugin_dirs(base: &Path) -> Result<Vec<PathBuf>> {
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let entries =
        fs::read_dir(base).with_context(|| format!("failed to list {}", base.display()))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() && path.join(MANIFEST).is_file() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Every file under `dir` that has metadata, with that metadata.
pub fn source_files(dir: &Path) -> Result<Vec<(PathBuf, Record)>> {
    let mut files = Vec::new();
    for path in walk_files(dir) {
        let skip = path.file_name().is_some_and(|name| name == MANIFEST)
            || path.extension().is_some_and(|ext| ext == META_EXT);
        if skip {
            continue;
        }
        if let Some(meta) = load_file_metadata(&path)? {
            files.push((path, meta));
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plugin_options_defaults() {
        let options = PluginOptions::from_manifest(&Record::new("$:/plugins/me/foo"));
        assert_eq!(options.browsers_list, DEFAULT_BROWSERS_LIST);
        assert!(options.external_modules.is_empty());
        assert!(options.node_modules_not_external.is_empty());
        assert!(!options.source_map);
        assert!(options.minify);
    }

    #[test]
    fn test_plugin_options_declared() {
        let manifest = Record::new("$:/plugins/me/foo")
            .with(BROWSERS_LIST, "chrome 100")
            .with(EXTERNAL_MODULES, "lodash [[my lib]]")
            .with(NODE_MODULES_NOT_EXTERNAL, "path")
            .with(SOURCE_MAP, "TRUE")
            .with(MINIFY, "false");
        let options = PluginOptions::from_manifest(&manifest);
        assert_eq!(options.browsers_list, "chrome 100");
        assert_eq!(options.external_modules, vec!["lodash", "my lib"]);
        assert_eq!(options.node_modules_not_external, vec!["path"]);
        assert!(options.source_map);
        assert!(!options.minify);
    }

    #[test]
    fn test_file_options() {
        let meta = Record::new("x").with(NO_COMPILE, "true");
        assert_eq!(
            FileOptions::from_meta(&meta),
            FileOptions { no_compile: true, include_source: false }
        );
        assert!(opts_out_of_minify(&Record::new("x").with(MINIFY, "False")));
        assert!(!opts_out_of_minify(&Record::new("x").with(MINIFY, "yes")));
    }

    #[test]
    fn test_plugin_dirs_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        for name in ["zeta", "alpha", "nomanifest"] {
            fs::create_dir_all(base.join(name)).unwrap();
        }
        fs::write(base.join("zeta").join(MANIFEST), "{}").unwrap();
        fs::write(base.join("alpha").join(MANIFEST), "{}").unwrap();
        fs::write(base.join("stray.txt"), "").unwrap();

        let dirs = plugin_dirs(base).unwrap();
        assert_eq!(dirs, vec![base.join("alpha"), base.join("zeta")]);
        assert!(plugin_dirs(&base.join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_source_files_only_with_metadata() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::write(dir.join(MANIFEST), r#"{"title":"$:/plugins/me/foo"}"#).unwrap();
        fs::write(dir.join("index.ts"), "export {}").unwrap();
        fs::write(dir.join("index.ts.meta"), "title: $:/plugins/me/foo/index.ts").unwrap();
        fs::write(dir.join("helper.ts"), "export {}").unwrap();

        let files = source_files(dir).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, dir.join("index.ts"));
        assert_eq!(files[0].1.title(), Some("$:/plugins/me/foo/index.ts"));
    }
}
