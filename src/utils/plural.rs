//! Count + noun formatting for log lines.

/// `plural_count(1, "plugin")` is `"1 plugin"`, any other count adds an `s`.
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
