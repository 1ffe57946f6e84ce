use cascade_output::OutputStyle;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Line terminator used in the generated CSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Linefeed {
    #[default]
    Lf,
    CrLf,
    Cr,
    LfCr,
}

impl Linefeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Linefeed::Lf => "\n",
            Linefeed::CrLf => "\r\n",
            Linefeed::Cr => "\r",
            Linefeed::LfCr => "\n\r",
        }
    }
}

/// Compilation options, passed explicitly to every entry point.
#[derive(Debug, Clone)]
pub struct Options {
    pub output_style: OutputStyle,
    /// Numeric precision for emitted values.
    pub precision: usize,
    /// Generate a source map alongside the CSS.
    pub source_map: bool,
    /// Path recorded in (and used to link) the source map.
    pub source_map_file: Option<PathBuf>,
    /// Include the original source text in the map.
    pub source_map_contents: bool,
    /// Embed the map as a base64 `data:` URI instead of a separate file.
    pub source_map_embed: bool,
    /// Value for the map's `sourceRoot` field.
    pub source_map_root: Option<String>,
    /// Directories searched for `@import` targets, in order.
    pub include_paths: Vec<PathBuf>,
    pub linefeed: Linefeed,
    /// Indentation unit for nested output.
    pub indent: String,
    /// Emit `/* line N, path */` above each rule.
    pub source_comments: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output_style: OutputStyle::Nested,
            precision: 5,
            source_map: false,
            source_map_file: None,
            source_map_contents: false,
            source_map_embed: false,
            source_map_root: None,
            include_paths: Vec::new(),
            linefeed: Linefeed::Lf,
            indent: "  ".to_string(),
            source_comments: false,
        }
    }
}
