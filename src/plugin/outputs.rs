//! Mapping bundler outputs back to records.

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{ORIGIN, STYLESHEET_TAG};
use crate::bundler::OutputFile;
use crate::engine::types::{self, CSS, JAVASCRIPT};
use crate::record::{Record, TEXT, TITLE, TYPE};

/// Maps the outputs of one plugin directory's bundle.
pub struct OutputMapper<'a> {
    /// Plugin source directory (the bundle's `out_base`).
    pub dir: &'a Path,
    pub plugin_title: &'a str,
    /// Metadata per source file; entries carry their compiled title.
    pub metas: &'a FxHashMap<PathBuf, Record>,
}

impl OutputMapper<'_> {
    /// Turn one output into a record, given the records mapped so far.
    ///
    /// Returns `None` for an entry output whose entry has no metadata.
    pub fn map(&self, file: OutputFile, records: &BTreeMap<String, Record>) -> Option<Record> {
        let mut record = match &file.entry_point {
            Some(entry) => self.entry_record(entry)?,
            None => self.asset_record(&file, records),
        };
        record.set(TEXT, file.text);
        Some(record)
    }

    fn entry_record(&self, entry: &Path) -> Option<Record> {
        let Some(meta) = self.metas.get(entry) else {
            crate::debug!("compile"; "no metadata for entry {}", entry.display());
            return None;
        };
        Some(
            meta.clone()
                .with(TYPE, JAVASCRIPT)
                .with(ORIGIN, relative(self.dir, entry)),
        )
    }

    fn asset_record(&self, file: &OutputFile, records: &BTreeMap<String, Record>) -> Record {
        let mime = types::from_path(&file.path).map(|t| t.mime);

        let mut record = Record::default();
        if mime == Some(CSS) {
            record.set_tags(&[STYLESHEET_TAG]);
        }
        if let Some(input) = file.inputs.first() {
            if let Some(meta) = self.metas.get(input) {
                record.merge(meta);
            }
            record.set(ORIGIN, relative(self.dir, input));
        }
        if let Some(mime) = mime {
            record.set(TYPE, mime);
        }

        if record.title().is_none() {
            let (base, ext) = self.derived_title(&file.path);
            let title = unique_title(&base, &ext, |t| records.contains_key(t));
            record.set(TITLE, title);
        }
        record
    }

    /// `<plugin title>/<relative dir>/<stem>` and `.<ext>` for an output path.
    fn derived_title(&self, output: &Path) -> (String, String) {
        let mut base = self.plugin_title.trim_end_matches('/').to_string();
        if let Some(parent) = output.parent() {
            for part in parent.components() {
                base.push('/');
                base.push_str(&part.as_os_str().to_string_lossy());
            }
        }
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        base.push('/');
        base.push_str(&stem);

        let ext = output
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (base, ext)
    }
}

/// The first of `{base}{ext}`, `{base}1{ext}`, `{base}2{ext}`, .. not taken.
pub fn unique_title(base: &str, ext: &str, taken: impl Fn(&str) -> bool) -> String {
    let candidate = format!("{base}{ext}");
    if !taken(&candidate) {
        return candidate;
    }
    (1u64..)
        .map(|id| format!("{base}{id}{ext}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or(candidate)
}

/// `path` relative to `dir`, `/`-separated.
fn relative(dir: &Path, path: &Path) -> String {
    match path.strip_prefix(dir) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TAGS;

    fn output(path: &str, entry: Option<&str>, inputs: &[&str]) -> OutputFile {
        OutputFile {
            path: PathBuf::from(path),
            text: format!("/* {path} */"),
            entry_point: entry.map(PathBuf::from),
            inputs: inputs.iter().map(PathBuf::from).collect(),
        }
    }

    #[test]
    fn test_unique_title_probes_from_one() {
        let taken = ["a/b.css", "a/b1.css", "a/b2.css"];
        assert_eq!(unique_title("a/b", ".css", |t| taken.contains(&t)), "a/b3.css");
        assert_eq!(unique_title("a/c", ".css", |t| taken.contains(&t)), "a/c.css");
        assert_eq!(unique_title("a/b1", ".css", |t| taken.contains(&t)), "a/b11.css");
    }

    #[test]
    fn test_entry_output_takes_entry_metadata() {
        let mut metas = FxHashMap::default();
        metas.insert(
            PathBuf::from("/p/foo/index.ts"),
            Record::new("$:/plugins/me/foo/index.js").with("module-type", "startup"),
        );
        let mapper = OutputMapper { dir: Path::new("/p/foo"), plugin_title: "$:/plugins/me/foo", metas: &metas };

        let record = mapper
            .map(output("index.js", Some("/p/foo/index.ts"), &["/p/foo/index.ts"]), &BTreeMap::new())
            .unwrap();
        assert_eq!(record.title(), Some("$:/plugins/me/foo/index.js"));
        assert_eq!(record.kind(), Some(JAVASCRIPT));
        assert_eq!(record.get(ORIGIN), Some("index.ts"));
        assert_eq!(record.get("module-type"), Some("startup"));
        assert_eq!(record.text(), Some("/* index.js */"));

        assert!(mapper.map(output("other.js", Some("/p/foo/other.ts"), &[]), &BTreeMap::new()).is_none());
    }

    #[test]
    fn test_stylesheet_without_metadata_gets_derived_title() {
        let metas = FxHashMap::default();
        let mapper = OutputMapper { dir: Path::new("/p/foo"), plugin_title: "$:/plugins/me/foo", metas: &metas };

        let mut records = BTreeMap::new();
        records.insert("$:/plugins/me/foo/ui/index.css".to_string(), Record::new("$:/plugins/me/foo/ui/index.css"));

        let record = mapper
            .map(output("ui/index.css", None, &["/p/foo/ui/style.css"]), &records)
            .unwrap();
        assert_eq!(record.title(), Some("$:/plugins/me/foo/ui/index1.css"));
        assert_eq!(record.kind(), Some(CSS));
        assert_eq!(record.get(TAGS), Some(STYLESHEET_TAG));
        assert_eq!(record.get(ORIGIN), Some("ui/style.css"));
    }

    #[test]
    fn test_asset_takes_first_input_metadata() {
        let mut metas = FxHashMap::default();
        metas.insert(
            PathBuf::from("/p/foo/style.css"),
            Record::new("$:/plugins/me/foo/theme.css").with(TAGS, "custom"),
        );
        let mapper = OutputMapper { dir: Path::new("/p/foo"), plugin_title: "$:/plugins/me/foo", metas: &metas };

        let record = mapper
            .map(output("index.css", None, &["/p/foo/style.css", "/p/foo/extra.css"]), &BTreeMap::new())
            .unwrap();
        assert_eq!(record.title(), Some("$:/plugins/me/foo/theme.css"));
        assert_eq!(record.get(TAGS), Some("custom"));
        assert_eq!(record.kind(), Some(CSS));
    }
}
