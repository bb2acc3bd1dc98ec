//! Per-compile configuration handed to the engine.

use camino::{Utf8Path, Utf8PathBuf};

/// CSS output formatting requested from the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputStyle {
    #[default]
    Expanded,
    Compressed,
}

/// Source dialect of the stylesheet being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Scss,
    /// The indentation-based dialect used by `.sass` files.
    Indented,
    Css,
}

impl Syntax {
    /// Derive the dialect from the resource extension. Anything that is not
    /// `.sass` or `.css` compiles as SCSS.
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension() {
            Some("sass") => Syntax::Indented,
            Some("css") => Syntax::Css,
            _ => Syntax::Scss,
        }
    }
}

/// Everything one compile passes to the engine. Assembled once per compile
/// and owned by that compile's call stack; nothing here is shared across
/// concurrent compiles.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Stylesheet text, handed to the compiler in memory.
    pub source: String,
    /// Absolute path of the stylesheet the text came from.
    pub resource: Utf8PathBuf,
    pub syntax: Syntax,
    pub include_paths: Vec<Utf8PathBuf>,
    pub output_style: OutputStyle,
    /// Ask the engine for a source map.
    pub source_map: bool,
    /// Embed original source text into the map.
    pub source_map_contents: bool,
}
