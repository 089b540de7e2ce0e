//! Embedded static resources.
//!
//! The live-reload listener ships inside the binary, minified by `build.rs`.
//! Its socket port is only known once the dev loop has bound one, so the
//! script carries a placeholder that is filled in per session.

/// Placeholder left intact by the build-time minifier
const WS_PORT_PLACEHOLDER: &str = "__PLUGSMITH_WS_PORT__";

/// Browser-side listener that reloads the page on `refresh`.
const LIVERELOAD_JS: &str = include_str!(concat!(env!("OUT_DIR"), "/livereload.min.js"));

/// The listener script, connecting back to `ws_port`.
pub fn livereload_js(ws_port: u16) -> String {
    LIVERELOAD_JS.replace(WS_PORT_PLACEHOLDER, &ws_port.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_livereload_js_with_port() {
        let rendered = livereload_js(35729);
        assert!(rendered.contains("35729"));
        assert!(rendered.contains("refresh"));
        assert!(!rendered.contains(WS_PORT_PLACEHOLDER));
    }

    #[test]
    fn test_placeholder_survives_minification() {
        assert!(LIVERELOAD_JS.contains(WS_PORT_PLACEHOLDER));
    }
}
