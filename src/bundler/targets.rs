//! Browser targets.
//!
//! Queries are resolved with lightningcss' browserslist support; the
//! resulting minimum versions are encoded as `major << 16 | minor << 8 | patch`.

use lightningcss::targets::Browsers;

use super::BundleError;

/// Resolve a browserslist query to minimum browser versions.
pub fn browsers_for(query: &str) -> Result<Browsers, BundleError> {
    let browsers = Browsers::from_browserslist([query])
        .map_err(|e| BundleError::Targets(query.to_string(), e.to_string()))?;
    Ok(browsers.unwrap_or_default())
}

/// esbuild `--target` names for the browsers esbuild knows about.
pub fn esbuild_targets(browsers: &Browsers) -> Vec<String> {
    [
        ("chrome", browsers.chrome),
        ("edge", browsers.edge),
        ("firefox", browsers.firefox),
        ("ie", browsers.ie),
        ("ios", browsers.ios_saf),
        ("opera", browsers.opera),
        ("safari", browsers.safari),
    ]
    .into_iter()
    .filter_map(|(name, version)| version.map(|v| format!("{name}{}", format_version(v))))
    .collect()
}

fn format_version(version: u32) -> String {
    let major = version >> 16;
    let minor = (version >> 8) & 0xff;
    let patch = version & 0xff;
    match (minor, patch) {
        (0, 0) => major.to_string(),
        (_, 0) => format!("{major}.{minor}"),
        _ => format!("{major}.{minor}.{patch}"),
    }
}
