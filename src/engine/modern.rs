//! The promise-family compiler API.

use std::sync::Arc;

use async_trait::async_trait;
use camino::Utf8PathBuf;

use crate::error::EngineError;
use crate::importer::AsyncImportHook;
use crate::normalize::SourceMap;
use crate::options::{CompileOptions, OutputStyle, Syntax};

/// Options shape consumed by promise-family compilers.
#[derive(Debug, Clone)]
pub struct ModernOptions {
    /// Canonical URL of the entry stylesheet, when it has one.
    pub url: Option<String>,
    pub syntax: Syntax,
    pub load_paths: Vec<Utf8PathBuf>,
    pub output_style: OutputStyle,
    pub source_map: bool,
    pub source_map_include_sources: bool,
}

impl ModernOptions {
    pub fn from_compile(options: &CompileOptions) -> Self {
        Self {
            url: Some(format!("file://{}", options.resource)),
            syntax: options.syntax,
            load_paths: options.include_paths.clone(),
            output_style: options.output_style,
            source_map: options.source_map,
            source_map_include_sources: options.source_map_contents,
        }
    }
}

/// Raw output of a promise-family compiler: CSS text, an already structured
/// source map, and the loaded files as `file:` URIs.
#[derive(Debug, Clone, Default)]
pub struct ModernOutput {
    pub css: String,
    pub source_map: Option<SourceMap>,
    pub loaded_urls: Vec<String>,
}

/// A compiler speaking the promise-family API. Invoked directly on the
/// runtime; no worker pool is involved.
#[async_trait]
pub trait ModernCompiler: Send + Sync {
    async fn compile_string(
        &self,
        source: &str,
        options: &ModernOptions,
        importer: Arc<dyn AsyncImportHook>,
    ) -> Result<ModernOutput, EngineError>;
}
