//! Plugin folders and file metadata on disk.
//!
//! ```text
//! src/foo/
//! ├── plugin.info        # JSON manifest, must carry a `title`
//! ├── readme.tid         # header fields + body
//! ├── index.ts           # loaded verbatim ...
//! └── index.ts.meta      # ... with fields from its sidecar
//! ```
//!
//! Files without any metadata still load, titled by their absolute path.

use anyhow::{Context, Result, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use jwalk::WalkDir;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::types;
use crate::record::{self, Record, parse_fields, parse_tid};

/// Manifest file name marking a plugin directory.
pub const MANIFEST: &str = "plugin.info";

/// Sidecar extension for per-file metadata.
pub const META_EXT: &str = "meta";

const PLUGIN_TYPE: &str = "plugin-type";

/// A plugin directory as loaded by the engine.
#[derive(Debug, Clone)]
pub struct PluginFolder {
    /// Manifest fields (identity is `manifest.title()`).
    pub manifest: Record,
    /// Records found under the directory, keyed by title.
    pub records: BTreeMap<String, Record>,
}

/// Load a plugin directory.
///
/// Returns `Ok(None)` when the manifest is absent or carries no title.
pub fn load_plugin_folder(dir: &Path) -> Result<Option<PluginFolder>> {
    let manifest_path = dir.join(MANIFEST);
    if !manifest_path.is_file() {
        return Ok(None);
    }

    let raw = fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("malformed manifest {}", manifest_path.display()))?;
    let Some(fields) = value.as_object() else {
        bail!("manifest {} is not a JSON object", manifest_path.display());
    };

    let mut manifest = Record::from_json_map(fields);
    if manifest.title().is_none() {
        return Ok(None);
    }
    if !manifest.contains(PLUGIN_TYPE) {
        manifest.set(PLUGIN_TYPE, "plugin");
    }
    manifest.set(record::TYPE, types::JSON);

    let mut records = BTreeMap::new();
    for path in walk_files(dir) {
        if is_manifest_or_sidecar(&path) {
            continue;
        }
        let record = load_record_file(&path)?;
        if let Some(title) = record.title() {
            records.insert(title.to_string(), record);
        }
    }

    Ok(Some(PluginFolder { manifest, records }))
}

/// Load the sidecar metadata declared for `path` (`<path>.meta`), if any.
///
/// A sidecar without a `title` field gets the file's absolute path.
pub fn load_file_metadata(path: &Path) -> Result<Option<Record>> {
    let sidecar = sidecar_path(path);
    if !sidecar.is_file() {
        return Ok(None);
    }

    let raw = fs::read_to_string(&sidecar)
        .with_context(|| format!("failed to read {}", sidecar.display()))?;
    let mut meta = parse_fields(&raw);
    if meta.title().is_none() {
        meta.set(record::TITLE, path.to_string_lossy());
    }
    Ok(Some(meta))
}

/// Load every record under `<wiki>/tiddlers`.
///
/// A missing folder yields an empty set.
pub fn load_wiki_records(wiki: &Path) -> Result<Vec<Record>> {
    let dir = wiki.join("tiddlers");
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    for path in walk_files(&dir) {
        if is_manifest_or_sidecar(&path) {
            continue;
        }
        records.push(load_record_file(&path)?);
    }
    Ok(records)
}

/// All regular files under `dir`, in sorted walk order, hidden entries skipped.
pub fn walk_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort(true)
        .skip_hidden(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path())
        .collect()
}

/// Load one file as a record.
fn load_record_file(path: &Path) -> Result<Record> {
    let is_tid = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tid"));

    let mut record = if is_tid {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse_tid(&raw)
    } else {
        let mut record = load_file_metadata(path)?.unwrap_or_default();
        let mime = record
            .kind()
            .map(str::to_string)
            .or_else(|| types::from_path(path).map(|t| t.mime.to_string()));

        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let text = match mime.as_deref() {
            Some(mime) if types::is_binary(mime) => BASE64.encode(&bytes),
            _ => String::from_utf8_lossy(&bytes).into_owned(),
        };
        if let Some(mime) = mime {
            record.set(record::TYPE, mime);
        }
        record.set(record::TEXT, text);
        record
    };

    if record.title().is_none() {
        record.set(record::TITLE, path.to_string_lossy());
    }
    Ok(record)
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(META_EXT);
    PathBuf::from(name)
}

fn is_manifest_or_sidecar(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == MANIFEST)
        || path.extension().is_some_and(|ext| ext == META_EXT)
}

/// Whether `path` has a metadata sidecar next to it.
pub fn has_sidecar(path: &Path) -> bool {
    sidecar_path(path).is_file()
}
