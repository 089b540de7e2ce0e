//! esbuild CLI driver.
//!
//! Runs one esbuild process per request with the plugin directory as the
//! working directory, writes into a scratch directory, then reads the
//! outputs back using the metafile to recover entry points and inputs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{BANNER, BundleError, BundleRequest, Bundler, DATAURL_EXTENSIONS, OutputFile};
use crate::utils::exec::Cmd;
use crate::utils::path::{clean_path, normalize_path};

/// The esbuild command line (`["esbuild"]`, `["npx", "esbuild"]`, ..).
#[derive(Debug, Clone)]
pub struct Esbuild {
    command: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Metafile {
    outputs: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MetaOutput {
    #[serde(rename = "entryPoint")]
    entry_point: Option<String>,
    #[serde(default)]
    inputs: serde_json::Map<String, serde_json::Value>,
}

impl Esbuild {
    /// Resolve the command, failing early when the executable is missing.
    pub fn new(command: Vec<String>) -> Result<Self, BundleError> {
        let program = command.first().ok_or(BundleError::NoCommand)?;
        which::which(program).map_err(|_| BundleError::NotFound(program.clone()))?;
        Ok(Self { command })
    }

    fn arguments(request: &BundleRequest, outdir: &Path, metafile: &Path) -> Vec<String> {
        let mut args: Vec<String> = request
            .entries
            .iter()
            .map(|entry| entry.to_string_lossy().into_owned())
            .collect();

        args.extend([
            "--bundle".to_string(),
            "--format=cjs".to_string(),
            "--platform=browser".to_string(),
            "--tree-shaking=true".to_string(),
            "--charset=utf8".to_string(),
            "--log-level=error".to_string(),
            format!("--outdir={}", outdir.display()),
            format!("--outbase={}", request.out_base.display()),
            format!("--metafile={}", metafile.display()),
            format!("--banner:js={BANNER}"),
            format!("--banner:css={BANNER}"),
        ]);

        for external in &request.externals {
            args.push(format!("--external:{external}"));
        }
        for ext in DATAURL_EXTENSIONS {
            args.push(format!("--loader:{ext}=dataurl"));
        }
        if !request.targets.is_empty() {
            args.push(format!("--target={}", request.targets.join(",")));
        }
        if request.inline_sourcemap {
            args.push("--sourcemap=inline".to_string());
        }
        args
    }
}

impl Bundler for Esbuild {
    fn build(&self, request: &BundleRequest) -> Result<Vec<OutputFile>, BundleError> {
        if request.entries.is_empty() {
            return Ok(Vec::new());
        }

        let scratch = tempfile::tempdir()?;
        let scratch_root = normalize_path(scratch.path());
        let outdir = scratch_root.join("out");
        let metafile = scratch_root.join("meta.json");
        let cwd = normalize_path(&request.out_base);

        Cmd::from_slice(&self.command)
            .args(Self::arguments(request, &outdir, &metafile))
            .cwd(&cwd)
            .env("NO_COLOR", "1")
            .run()
            .map_err(|e| BundleError::Failed(format!("{e:#}")))?;

        let raw = fs::read_to_string(&metafile)?;
        read_outputs(&raw, &cwd, &outdir)
    }
}

/// Map metafile outputs back to files, resolving paths against `cwd`.
fn read_outputs(metafile: &str, cwd: &Path, outdir: &Path) -> Result<Vec<OutputFile>, BundleError> {
    let meta: Metafile = serde_json::from_str(metafile).map_err(BundleError::Metafile)?;

    let mut files = Vec::with_capacity(meta.outputs.len());
    for (key, value) in meta.outputs {
        if key.ends_with(".map") {
            continue;
        }
        let output: MetaOutput = serde_json::from_value(value).map_err(BundleError::Metafile)?;

        let absolute = clean_path(&cwd.join(&key));
        let relative = absolute.strip_prefix(outdir).map_err(|_| {
            BundleError::Failed(format!("output `{key}` is outside {}", outdir.display()))
        })?;
        let text = fs::read_to_string(&absolute)?;

        files.push(OutputFile {
            path: relative.to_path_buf(),
            text,
            entry_point: output.entry_point.map(|ep| resolve(cwd, &ep)),
            inputs: output
                .inputs
                .keys()
                .filter(|input| !input.starts_with('<'))
                .map(|input| resolve(cwd, input))
                .collect(),
        });
    }
    Ok(files)
}

fn resolve(cwd: &Path, path: &str) -> PathBuf {
    clean_path(&cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_executable() {
        let err = Esbuild::new(vec!["plugsmith-no-such-bundler".into()]).unwrap_err();
        assert!(matches!(err, BundleError::NotFound(name) if name == "plugsmith-no-such-bundler"));
        assert!(matches!(Esbuild::new(Vec::new()), Err(BundleError::NoCommand)));
    }

    #[test]
    fn test_arguments() {
        let request = BundleRequest {
            entries: vec![PathBuf::from("/p/foo/index.ts")],
            externals: vec!["$:/*".into(), "fs".into()],
            targets: vec!["chrome100".into(), "safari15".into()],
            inline_sourcemap: true,
            out_base: PathBuf::from("/p/foo"),
        };
        let args = Esbuild::arguments(&request, Path::new("/tmp/out"), Path::new("/tmp/meta.json"));

        assert_eq!(args[0], "/p/foo/index.ts");
        assert!(args.contains(&"--bundle".to_string()));
        assert!(args.contains(&"--format=cjs".to_string()));
        assert!(args.contains(&"--external:$:/*".to_string()));
        assert!(args.contains(&"--external:fs".to_string()));
        assert!(args.contains(&"--target=chrome100,safari15".to_string()));
        assert!(args.contains(&"--loader:.woff2=dataurl".to_string()));
        assert!(args.contains(&"--sourcemap=inline".to_string()));
        assert!(args.contains(&"--outbase=/p/foo".to_string()));
    }

    #[test]
    fn test_no_sourcemap_without_flag() {
        let request = BundleRequest {
            entries: vec![PathBuf::from("/p/a.ts")],
            externals: Vec::new(),
            targets: Vec::new(),
            inline_sourcemap: false,
            out_base: PathBuf::from("/p"),
        };
        let args = Esbuild::arguments(&request, Path::new("/o"), Path::new("/m.json"));
        assert!(!args.iter().any(|a| a.starts_with("--sourcemap")));
        assert!(!args.iter().any(|a| a.starts_with("--target")));
    }

    #[test]
    fn test_read_outputs_from_metafile() {
        let temp = TempDir::new().unwrap();
        let root = normalize_path(temp.path());
        let cwd = root.join("src/foo");
        let outdir = root.join("scratch/out");
        fs::create_dir_all(&cwd).unwrap();
        fs::create_dir_all(outdir.join("lib")).unwrap();
        fs::write(outdir.join("index.js"), "/* js */").unwrap();
        fs::write(outdir.join("index.css"), "/* css */").unwrap();

        let metafile = serde_json::json!({
            "inputs": {},
            "outputs": {
                "../../scratch/out/index.js": {
                    "entryPoint": "index.ts",
                    "inputs": { "lib/util.ts": {}, "index.ts": {} }
                },
                "../../scratch/out/index.css": {
                    "inputs": { "style.css": {} }
                }
            }
        })
        .to_string();

        let files = read_outputs(&metafile, &cwd, &outdir).unwrap();
        assert_eq!(files.len(), 2);

        assert_eq!(files[0].path, PathBuf::from("index.js"));
        assert_eq!(files[0].text, "/* js */");
        assert_eq!(files[0].entry_point, Some(cwd.join("index.ts")));
        assert_eq!(files[0].inputs, vec![cwd.join("lib/util.ts"), cwd.join("index.ts")]);

        assert_eq!(files[1].entry_point, None);
        assert_eq!(files[1].inputs, vec![cwd.join("style.css")]);
    }

    #[test]
    fn test_read_outputs_rejects_garbage() {
        let err = read_outputs("not json", Path::new("/"), Path::new("/out")).unwrap_err();
        assert!(matches!(err, BundleError::Metafile(_)));
    }
}
