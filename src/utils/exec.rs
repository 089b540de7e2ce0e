//! Running external tools.
//!
//! The bundler is configured as a command line (`["esbuild"]`,
//! `["npx", "esbuild"]`, ..); [`Cmd`] prepends it to the per-run arguments,
//! waits for the process and turns a failing exit into an error that carries
//! the tool's own diagnostics.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;

/// SGR escape sequences some tools emit even when told not to.
static ANSI_SGR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

/// A command line plus the context one run of it needs.
pub struct Cmd {
    argv: Vec<String>,
    cwd: Option<PathBuf>,
    env: Vec<(&'static str, &'static str)>,
}

impl Cmd {
    /// Start from a configured command line; the first element is the program.
    pub fn from_slice(command: &[String]) -> Self {
        Self {
            argv: command.to_vec(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.argv.extend(args.into_iter().filter(|arg| !arg.is_empty()));
        self
    }

    pub fn cwd(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn env(mut self, key: &'static str, value: &'static str) -> Self {
        self.env.push((key, value));
        self
    }

    /// Run to completion; a non-zero exit is an error with the tool's stderr.
    pub fn run(self) -> Result<Output> {
        let Some((program, args)) = self.argv.split_first() else {
            bail!("empty command line");
        };

        let mut command = Command::new(program);
        command.args(args).envs(self.env.iter().copied());
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .with_context(|| format!("failed to start `{program}`"))?;

        let stderr = clean(&output.stderr);
        if !output.status.success() {
            bail!("`{program}` exited with {}\n{stderr}", output.status);
        }
        if !stderr.is_empty() {
            crate::debug!("exec"; "{}: {}", program, stderr);
        }
        Ok(output)
    }
}

/// Trimmed, colorless text of a tool's output stream.
fn clean(stream: &[u8]) -> String {
    let text = String::from_utf8_lossy(stream);
    ANSI_SGR.replace_all(text.trim(), "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_line_then_args() {
        let cmd = Cmd::from_slice(&argv(&["npx", "esbuild"]))
            .args(argv(&["index.ts", "", "--bundle"]))
            .cwd(Path::new("/tmp"))
            .env("NO_COLOR", "1");

        assert_eq!(cmd.argv, argv(&["npx", "esbuild", "index.ts", "--bundle"]));
        assert_eq!(cmd.cwd, Some(PathBuf::from("/tmp")));
        assert_eq!(cmd.env, vec![("NO_COLOR", "1")]);
    }

    #[test]
    fn test_clean_strips_colors() {
        assert_eq!(clean(b"  \x1b[31mx error\x1b[0m\n"), "x error");
        assert_eq!(clean(b"plain"), "plain");
    }

    #[test]
    fn test_empty_command_line() {
        assert!(Cmd::from_slice(&[]).run().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_carries_stderr() {
        let err = Cmd::from_slice(&argv(&["sh", "-c"]))
            .args(argv(&["echo oops >&2; exit 3"]))
            .run()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("`sh` exited with"));
        assert!(msg.contains("oops"));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let output = Cmd::from_slice(&argv(&["pwd"])).cwd(temp.path()).run().unwrap();
        let printed = String::from_utf8_lossy(&output.stdout);
        assert!(printed.trim().ends_with(&*temp.path().file_name().unwrap().to_string_lossy()));
    }
}
