//! Content-type table.
//!
//! Maps file extensions to the content types the engine understands and
//! records whether a type is stored base64-encoded.

use std::path::Path;

/// A known content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentType {
    pub mime: &'static str,
    pub extension: &'static str,
    /// Stored base64-encoded in the record's `text`.
    pub binary: bool,
}

pub const JAVASCRIPT: &str = "application/javascript";
pub const CSS: &str = "text/css";
pub const JSON: &str = "application/json";
pub const WIKITEXT: &str = "text/vnd.tiddlywiki";

const fn text(mime: &'static str, extension: &'static str) -> ContentType {
    ContentType {
        mime,
        extension,
        binary: false,
    }
}

const fn binary(mime: &'static str, extension: &'static str) -> ContentType {
    ContentType {
        mime,
        extension,
        binary: true,
    }
}

/// Extension → content type, first match wins when looking up by mime.
const TABLE: &[(&str, ContentType)] = &[
    // Text
    ("tid", text(WIKITEXT, ".tid")),
    ("wiki", text(WIKITEXT, ".tid")),
    ("txt", text("text/plain", ".txt")),
    ("md", text("text/markdown", ".md")),
    ("html", text("text/html", ".html")),
    ("htm", text("text/html", ".html")),
    ("css", text(CSS, ".css")),
    ("js", text(JAVASCRIPT, ".js")),
    ("mjs", text(JAVASCRIPT, ".js")),
    ("cjs", text(JAVASCRIPT, ".js")),
    ("json", text(JSON, ".json")),
    ("csv", text("text/csv", ".csv")),
    ("xml", text("application/xml", ".xml")),
    ("svg", text("image/svg+xml", ".svg")),
    // Images
    ("png", binary("image/png", ".png")),
    ("jpg", binary("image/jpeg", ".jpg")),
    ("jpeg", binary("image/jpeg", ".jpg")),
    ("gif", binary("image/gif", ".gif")),
    ("webp", binary("image/webp", ".webp")),
    ("ico", binary("image/x-icon", ".ico")),
    // Fonts
    ("woff", binary("font/woff", ".woff")),
    ("woff2", binary("font/woff2", ".woff2")),
    ("ttf", binary("font/ttf", ".ttf")),
    ("otf", binary("font/otf", ".otf")),
    ("eot", binary("application/vnd.ms-fontobject", ".eot")),
    // Documents
    ("pdf", binary("application/pdf", ".pdf")),
    ("zip", binary("application/zip", ".zip")),
    ("wasm", binary("application/wasm", ".wasm")),
];

/// Look up the content type for a file extension (case-insensitive, no dot).
pub fn from_extension(ext: &str) -> Option<ContentType> {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    TABLE
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, info)| *info)
}

/// Look up the content type for a path's extension.
pub fn from_path(path: &Path) -> Option<ContentType> {
    from_extension(path.extension()?.to_str()?)
}

/// Look up a content type by its mime string.
pub fn from_mime(mime: &str) -> Option<ContentType> {
    TABLE
        .iter()
        .find(|(_, info)| info.mime == mime)
        .map(|(_, info)| *info)
}

/// Whether records of this mime type carry base64 text.
pub fn is_binary(mime: &str) -> bool {
    from_mime(mime).is_some_and(|info| info.binary)
}
