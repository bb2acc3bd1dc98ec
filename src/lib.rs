#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod candidates;
mod deps;
mod engine;
mod error;
mod importer;
#[cfg(feature = "logging")]
pub mod logging;
mod normalize;
mod options;
mod queue;
mod resolver;
mod search;
mod utils;

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

pub use crate::candidates::{CandidateList, expand, expand_for_general};
pub use crate::deps::{BuildContext, CollectDependencies, DependencySet};
#[cfg(feature = "grass")]
pub use crate::engine::native::GrassCompiler;
pub use crate::engine::{
    Engine, EngineInfo, Family, LegacyCompiler, LegacyOptions, LegacyOutput, ModernCompiler,
    ModernOptions, ModernOutput, Version, parse_info,
};
pub use crate::error::{
    CompileError, ConfigError, EngineError, NormalizeError, ResolveMiss, SourceSpan,
};
pub use crate::importer::{
    AsyncImportHook, ImportHook, ImportResolution, ImporterAdapter, STDIN_SENTINEL, SyncImportHook,
};
pub use crate::normalize::{CompileResult, RawOutput, SourceMap};
pub use crate::options::{CompileOptions, OutputStyle, Syntax};
pub use crate::queue::{QueueError, WorkerPool};
pub use crate::resolver::{DualResolver, FileResolver, ResolveOptions, Resolver};
pub use crate::search::{ResolutionEntry, ResolutionMap};

use crate::normalize::{NormalizeContext, normalize};

/// The compiler integration a build system holds on to.
///
/// One `Bridge` is configured once per build session and serves any number
/// of compiles. Apart from the worker pool nothing in it is mutable; every
/// compile allocates its own options, importer and dependency set.
#[derive(Debug)]
pub struct Bridge {
    engine: Engine,
    dual: DualResolver,
    include_paths: Vec<Utf8PathBuf>,
    build_root: Utf8PathBuf,
    cwd: Utf8PathBuf,
    output_style: OutputStyle,
    source_map: bool,
    source_map_contents: bool,
    pool: WorkerPool,
}

impl Bridge {
    pub fn config() -> Config {
        Config::new()
    }

    /// Compile one stylesheet.
    ///
    /// `source` is the stylesheet text and `resource` the path it came
    /// from; the dialect is derived from the resource extension. Every file
    /// the compile reads or resolves to is reported through `ctx`, on the
    /// error path as well, so the build system can invalidate correctly.
    pub async fn compile(
        &self,
        source: &str,
        resource: &Utf8Path,
        ctx: &dyn BuildContext,
    ) -> Result<CompileResult, CompileError> {
        let resource = self.absolute(resource);
        let resource_dir = match resource.parent() {
            Some(parent) => parent.to_owned(),
            None => self.build_root.clone(),
        };

        let adapter = Arc::new(ImporterAdapter::new(
            self.dual.clone(),
            self.include_paths.clone(),
            resource_dir,
        ));

        let options = CompileOptions {
            source: source.to_owned(),
            resource: resource.clone(),
            syntax: Syntax::from_path(&resource),
            include_paths: self.include_paths.clone(),
            output_style: self.output_style,
            source_map: self.source_map,
            source_map_contents: self.source_map_contents,
        };

        info!(%resource, "compiling stylesheet");

        let raw = match &self.engine {
            Engine::Modern(compiler) => {
                let modern = ModernOptions::from_compile(&options);
                compiler
                    .compile_string(&options.source, &modern, adapter.clone())
                    .await
                    .map(RawOutput::Modern)
            }
            Engine::Legacy(compiler) => {
                let compiler = compiler.clone();
                let legacy = LegacyOptions::from_compile(&options);
                let hook = SyncImportHook::new(adapter.clone(), tokio::runtime::Handle::current());

                match self
                    .pool
                    .run(move || compiler.render(&legacy, &hook).map(RawOutput::Legacy))
                    .await
                {
                    Ok(inner) => inner,
                    Err(queue) => {
                        adapter.take_dependencies().flush(ctx);
                        return Err(queue.into());
                    }
                }
            }
        };

        let mut deps = adapter.take_dependencies();

        let outcome = match raw {
            Ok(raw) => {
                let ctx = NormalizeContext {
                    resource: &resource,
                    build_root: &self.build_root,
                    cwd: &self.cwd,
                };
                normalize(raw, &ctx).map_err(CompileError::from)
            }
            Err(err) => Err(enrich_engine_error(err, &mut deps)),
        };

        match outcome {
            Ok(result) => {
                for file in &result.included_files {
                    deps.insert(file.as_str());
                }
                deps.flush(ctx);
                Ok(result)
            }
            Err(err) => {
                deps.flush(ctx);
                Err(err)
            }
        }
    }

    fn absolute(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() || utils::is_absolute_like(path.as_str()) {
            path.to_owned()
        } else {
            self.build_root.join(path)
        }
    }
}

/// Attach whatever context we can to a compiler failure: the offending file
/// becomes a dependency so fixing it retriggers the build, and a line
/// excerpt is appended when the file is readable.
fn enrich_engine_error(err: EngineError, deps: &mut DependencySet) -> CompileError {
    match err {
        EngineError::Compile { mut message, span } => {
            if let Some(file) = &span.file {
                deps.insert(file.as_str());

                if let Some(line) = span.line {
                    if let Some(excerpt) = utils::line_excerpt(file, line) {
                        message = format!("{message}\n{excerpt}");
                    }
                }
            }

            CompileError::Compilation { message, span }
        }
        EngineError::Other(err) => CompileError::Compilation {
            message: err.to_string(),
            span: SourceSpan::default(),
        },
    }
}

/// Builder for a [`Bridge`]. Validation happens in [`Config::finish`]; a
/// misconfigured builder never yields a usable bridge.
#[derive(Debug)]
pub struct Config {
    engine: Option<Engine>,
    include_paths: Vec<Utf8PathBuf>,
    build_root: Option<Utf8PathBuf>,
    resolvers: Option<DualResolver>,
    general_resolve: ResolveOptions,
    output_style: OutputStyle,
    source_map: bool,
    source_map_contents: bool,
    pool_limit: Option<usize>,
}

impl Config {
    fn new() -> Self {
        Self {
            engine: None,
            include_paths: Vec::new(),
            build_root: None,
            resolvers: None,
            general_resolve: ResolveOptions::bundler_style(),
            output_style: OutputStyle::default(),
            source_map: false,
            source_map_contents: true,
            pool_limit: None,
        }
    }

    /// Use an already constructed engine.
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Use a callback-family compiler, validating its self-reported info
    /// string first.
    pub fn legacy_engine(
        self,
        info: &str,
        compiler: Arc<dyn LegacyCompiler>,
    ) -> Result<Self, ConfigError> {
        parse_info(info)?;
        Ok(self.engine(Engine::Legacy(compiler)))
    }

    /// Use a promise-family compiler, validating its self-reported info
    /// string first.
    pub fn modern_engine(
        self,
        info: &str,
        compiler: Arc<dyn ModernCompiler>,
    ) -> Result<Self, ConfigError> {
        parse_info(info)?;
        Ok(self.engine(Engine::Modern(compiler)))
    }

    /// Use the in-process grass engine.
    #[cfg(feature = "grass")]
    pub fn native_engine(self) -> Self {
        self.engine(Engine::Legacy(Arc::new(GrassCompiler)))
    }

    /// Add one directory searched for imports in addition to the importing
    /// file's own directory. Relative paths are anchored at the build root.
    pub fn include_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    /// Directory all reported paths are made relative to. Defaults to the
    /// working directory.
    pub fn build_root(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.build_root = Some(path.into());
        self
    }

    /// Inject resolver handles, for build systems with their own resolver.
    pub fn resolvers(mut self, dual: DualResolver) -> Self {
        self.resolvers = Some(dual);
        self
    }

    /// Options for the built-in general resolver. Ignored when explicit
    /// resolver handles are injected.
    pub fn resolve_options(mut self, options: ResolveOptions) -> Self {
        self.general_resolve = options;
        self
    }

    /// Shorthand for one alias entry on the built-in general resolver.
    pub fn alias(mut self, key: impl Into<String>, target: impl Into<Utf8PathBuf>) -> Self {
        self.general_resolve.alias.push((key.into(), target.into()));
        self
    }

    pub fn output_style(mut self, style: OutputStyle) -> Self {
        self.output_style = style;
        self
    }

    /// Ask the engine for source maps; `contents` embeds the original
    /// source text into them.
    pub fn source_map(mut self, enabled: bool, contents: bool) -> Self {
        self.source_map = enabled;
        self.source_map_contents = contents;
        self
    }

    /// Cap for concurrent callback-family compiles. Defaults to one below
    /// the available parallelism.
    pub fn pool_limit(mut self, limit: usize) -> Self {
        self.pool_limit = Some(limit);
        self
    }

    pub fn finish(self) -> Result<Bridge, ConfigError> {
        let engine = self.engine.ok_or(ConfigError::MissingEngine)?;

        let cwd = Utf8PathBuf::try_from(std::env::current_dir()?)?;
        let build_root = match self.build_root {
            Some(root) if root.is_absolute() => root,
            Some(root) => cwd.join(root),
            None => cwd.clone(),
        };

        let include_paths = self
            .include_paths
            .into_iter()
            .map(|path| {
                if path.is_absolute() || utils::is_absolute_like(path.as_str()) {
                    path
                } else {
                    build_root.join(path)
                }
            })
            .collect();

        let dual = self
            .resolvers
            .unwrap_or_else(|| {
                DualResolver::from_options(ResolveOptions::sass_style(), self.general_resolve)
            });

        let pool = match self.pool_limit {
            Some(limit) => WorkerPool::with_limit(limit),
            None => WorkerPool::new(),
        };

        Ok(Bridge {
            engine,
            dual,
            include_paths,
            build_root,
            cwd,
            output_style: self.output_style,
            source_map: self.source_map,
            source_map_contents: self.source_map_contents,
            pool,
        })
    }
}
