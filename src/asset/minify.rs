//! Record minification for production builds.
//!
//! Uses oxc for JavaScript and lightningcss for CSS.

use anyhow::{Result, anyhow};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::engine::types::{CSS, JAVASCRIPT};
use crate::record::{Record, TEXT};

/// Oldest IE the CSS output stays compatible with.
const LEGACY_IE: u32 = 9 << 16;

/// Minify a CommonJS bundle.
pub fn minify_js(source: &str) -> Result<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(anyhow!("{error}"));
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify a stylesheet, keeping it compatible with `browsers` and legacy IE.
pub fn minify_css(source: &str, browsers: Browsers) -> Result<String> {
    let targets = Targets::from(Browsers {
        ie: Some(LEGACY_IE),
        ..browsers
    });

    let mut stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| anyhow!("{e}"))?;
    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("{e}"))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{e}"))?;
    Ok(result.code)
}

/// Minify a record's text according to its content type.
///
/// Records of other types come back unchanged. On failure the error is
/// logged and the original record is returned.
pub fn minify_record(record: Record, browsers: Browsers) -> Record {
    let Some(text) = record.text() else {
        return record;
    };

    let minified = match record.kind() {
        Some(JAVASCRIPT) => minify_js(text),
        Some(CSS) => minify_css(text, browsers),
        _ => return record,
    };

    match minified {
        Ok(text) => record.with(TEXT, text),
        Err(e) => {
            crate::log!(
                "minify";
                "failed to minify {}: {}",
                record.title().unwrap_or("<untitled>"),
                e
            );
            record
        }
    }
}
