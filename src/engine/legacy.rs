//! The callback-family compiler API.

use camino::Utf8PathBuf;

use crate::error::EngineError;
use crate::importer::ImportHook;
use crate::options::{CompileOptions, OutputStyle, Syntax};

/// Options shape consumed by callback-family compilers. Mirrors the `render`
/// option surface of that API generation: in-memory source with an indented
/// flag instead of a syntax enum, and byte-oriented output.
#[derive(Debug, Clone)]
pub struct LegacyOptions {
    pub data: String,
    pub indented_syntax: bool,
    pub include_paths: Vec<Utf8PathBuf>,
    pub output_style: OutputStyle,
    pub source_map: bool,
    pub source_map_contents: bool,
    /// Suppress the `sourceMappingURL` comment in the emitted CSS; the build
    /// system attaches maps itself.
    pub omit_source_map_url: bool,
}

impl LegacyOptions {
    pub fn from_compile(options: &CompileOptions) -> Self {
        Self {
            data: options.source.clone(),
            indented_syntax: options.syntax == Syntax::Indented,
            include_paths: options.include_paths.clone(),
            output_style: options.output_style,
            source_map: options.source_map,
            source_map_contents: options.source_map_contents,
            omit_source_map_url: true,
        }
    }
}

/// Raw output of a callback-family compiler: CSS bytes, the source map as
/// unparsed JSON bytes, and the files the compiler read as plain paths.
#[derive(Debug, Clone, Default)]
pub struct LegacyOutput {
    pub css: Vec<u8>,
    pub map: Option<Vec<u8>>,
    pub included_files: Vec<String>,
}

/// A compiler speaking the callback-family API.
///
/// `render` runs synchronously on a worker-pool thread and may call the
/// import hook any number of times, once per import statement encountered,
/// in source order. The hook never fails; an unresolvable specifier comes
/// back verbatim and the compiler's own resolution takes over.
pub trait LegacyCompiler: Send + Sync {
    fn render(
        &self,
        options: &LegacyOptions,
        importer: &dyn ImportHook,
    ) -> Result<LegacyOutput, EngineError>;
}
