//! Terminal output.
//!
//! - `log!` / `debug!` print one line behind a colored `[module]` prefix
//! - `CompileProgress` keeps a live `[compile] 4/12 plugins` counter at the
//!   bottom of the terminal while a pass runs; log lines print above it
//! - `status_success` / `status_error` report the outcome of a dev-loop pass,
//!   each report replacing the previous one
//!
//! ```ignore
//! log!("compile"; "{} plugins", count);
//! debug!("ws"; "client connected");
//! ```

use std::io::{Write, stdout};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use owo_colors::OwoColorize;
use parking_lot::Mutex;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set while a `CompileProgress` owns the last terminal line.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Print `[module] message`.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, but only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();
    let progress = PROGRESS_ACTIVE.load(Ordering::SeqCst);

    // Print over the progress line, then leave a fresh line for it
    if progress {
        execute!(out, MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }
    writeln!(out, "{} {}", prefix(module), message).ok();
    if progress {
        writeln!(out).ok();
    }
    out.flush().ok();
}

fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module {
        "compile" | "watch" | "build" => tag.bright_green().bold().to_string(),
        "preview" | "ws" | "serve" => tag.bright_blue().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Pass status
// ============================================================================

/// `HH:MM:SS` of a UNIX timestamp, in UTC.
fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600 % 24, secs / 60 % 60, secs % 60)
}

/// The block printed for the most recent pass.
struct StatusLine {
    /// Terminal lines the previous block occupies
    height: usize,
}

static STATUS: Mutex<StatusLine> = Mutex::new(StatusLine { height: 0 });

impl StatusLine {
    fn show(&mut self, mark: String, text: &str) {
        let mut out = stdout().lock();
        if self.height > 0 {
            let height = u16::try_from(self.height).unwrap_or(u16::MAX);
            execute!(out, MoveUp(height), Clear(ClearType::FromCursorDown)).ok();
        }

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let stamp = format!("[{}]", format_clock(secs)).dimmed().to_string();

        writeln!(out, "{stamp} {mark} {text}").ok();
        out.flush().ok();
        self.height = text.lines().count().max(1);
    }
}

pub fn status_success(summary: &str) {
    STATUS.lock().show("✓".green().to_string(), summary);
}

pub fn status_error(summary: &str, detail: &str) {
    let text = if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    };
    STATUS.lock().show("✗".red().to_string(), &text);
}

// ============================================================================
// Compile progress
// ============================================================================

/// Live `done/total` counter for the plugin directories of one pass.
///
/// Rayon workers call `inc`; a worker that finds the terminal busy skips the
/// redraw and the next one catches up.
pub struct CompileProgress {
    total: usize,
    done: AtomicUsize,
    draw: Mutex<()>,
}

impl CompileProgress {
    pub fn new(total: usize) -> Self {
        PROGRESS_ACTIVE.store(true, Ordering::SeqCst);
        let progress = Self {
            total,
            done: AtomicUsize::new(0),
            draw: Mutex::new(()),
        };
        progress.redraw(false);
        progress
    }

    pub fn inc(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.draw.try_lock() {
            self.redraw(false);
        }
    }

    /// Leave the final count on screen.
    pub fn finish(self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        let _guard = self.draw.lock();
        self.redraw(true);
    }

    fn render(&self) -> String {
        let noun = if self.total == 1 { "plugin" } else { "plugins" };
        format!("{}/{} {noun}", self.done.load(Ordering::Relaxed), self.total)
    }

    fn redraw(&self, last: bool) {
        let mut out = stdout().lock();
        execute!(out, MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        write!(out, "{} {}", prefix("compile"), self.render()).ok();
        if last {
            writeln!(out).ok();
        }
        out.flush().ok();
    }
}

impl Drop for CompileProgress {
    fn drop(&mut self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
    }
}
