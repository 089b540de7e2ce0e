//! Build mode configuration for production/development builds.

/// Build mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    /// Whether to minify compiled records (plugins may still opt out).
    pub minify: bool,

    /// Whether to attach a content hash to each plugin aggregate.
    pub hash: bool,

    /// Whether bundles always carry inline source maps.
    pub inline_sourcemap: bool,
}

impl BuildMode {
    /// Production mode: minified, hashed output without source maps.
    pub const PRODUCTION: Self = Self {
        minify: true,
        hash: true,
        inline_sourcemap: false,
    };

    /// Development mode: readable bundles with inline source maps.
    pub const DEVELOPMENT: Self = Self {
        minify: false,
        hash: false,
        inline_sourcemap: true,
    };
}
