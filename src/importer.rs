//! The import hook handed to the compiler.
//!
//! For every `@import`/`@use` the compiler cannot satisfy on its own it asks
//! this adapter, passing the requested url and the file the request came
//! from. The adapter builds the precedence chain for the request, runs the
//! search, registers whatever resolved as a build dependency and hands the
//! result back in the shape the compiler expects. Unresolvable requests go
//! back verbatim; whether that is an error is the compiler's call, made only
//! after every other importer in its chain had a chance.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::candidates::{self, is_module_request};
use crate::deps::DependencySet;
use crate::resolver::DualResolver;
use crate::search::{ResolutionEntry, ResolutionMap};
use crate::utils;

/// Sentinel compilers report as the previous file when the entry stylesheet
/// was handed over as in-memory text rather than a path.
pub const STDIN_SENTINEL: &str = "stdin";

/// Outcome of one import callback. `file` is either a resolved absolute
/// path, or the original specifier handed back untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResolution {
    pub file: String,
}

/// Synchronous hook shape consumed by callback-family compilers.
pub trait ImportHook: Send + Sync {
    fn import(&self, url: &str, prev: &str) -> ImportResolution;
}

/// Asynchronous hook shape consumed by promise-family compilers.
#[async_trait]
pub trait AsyncImportHook: Send + Sync {
    async fn import(&self, url: &str, prev: &str) -> ImportResolution;
}

/// The resolution glue exposed to the compiler.
///
/// One adapter is allocated per compile. It owns that compile's dependency
/// set; the compile drains it once the compiler returns.
pub struct ImporterAdapter {
    dual: DualResolver,
    include_paths: Vec<Utf8PathBuf>,
    resource_dir: Utf8PathBuf,
    deps: Mutex<DependencySet>,
}

impl ImporterAdapter {
    pub fn new(
        dual: DualResolver,
        include_paths: Vec<Utf8PathBuf>,
        resource_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            dual,
            include_paths,
            resource_dir: resource_dir.into(),
            deps: Mutex::new(DependencySet::default()),
        }
    }

    /// Resolve one import request. Never fails; exhaustion falls back to
    /// the original url.
    pub async fn import(&self, url: &str, prev: &str) -> ImportResolution {
        let dir = self.importing_dir(prev);
        let map = self.resolution_map(url, &dir);

        match map.search().await {
            Ok(found) => {
                self.deps.lock().unwrap().insert(found.as_str());

                // A hit ending in `.css` is returned without the extension,
                // which makes the compiler inline the file instead of
                // emitting a passthrough `@import url(...)`.
                let file = match found.as_str().strip_suffix(".css") {
                    Some(stem) => stem.to_string(),
                    None => found.into_string(),
                };

                ImportResolution { file }
            }
            Err(_) => {
                debug!(url, "import unresolved, passing through");
                ImportResolution {
                    file: url.to_string(),
                }
            }
        }
    }

    /// Directory the request is relative to. The stdin sentinel means the
    /// entry stylesheet, whose real directory we know; anything else is the
    /// previous file's parent, with separators normalized since compilers
    /// may report POSIX paths on any host.
    fn importing_dir(&self, prev: &str) -> Utf8PathBuf {
        if prev.is_empty() || prev == STDIN_SENTINEL {
            return self.resource_dir.clone();
        }

        let prev = utils::normalize_separators(prev);
        match Utf8Path::new(&prev).parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_owned(),
            _ => self.resource_dir.clone(),
        }
    }

    /// Build the precedence chain: Sass-style lookup rooted at each include
    /// path first, the general resolver rooted at the importing directory
    /// last, with the original url appended there as the final fallback.
    fn resolution_map(&self, url: &str, dir: &Utf8Path) -> ResolutionMap {
        let mut map = ResolutionMap::default();

        let (request, from_file_uri) = if url.starts_with("file:") {
            match utils::file_uri_to_path(url) {
                Some(path) => (path.into_string(), true),
                // a remote or malformed file URI degrades to a relative path
                None => (url.to_string(), false),
            }
        } else {
            (url.to_string(), false)
        };

        // Sass-style emulation is meaningless for requests that already name
        // a location or a package; those go straight to the general resolver.
        let skip_sass = from_file_uri
            || is_module_request(&request)
            || utils::is_absolute_like(&request);

        if !skip_sass {
            for include in &self.include_paths {
                map.push(ResolutionEntry::new(
                    self.dual.sass(),
                    include.clone(),
                    candidates::expand(&request),
                ));
            }
        }

        let fallbacks = [request.as_str(), url];
        map.push(ResolutionEntry::new(
            self.dual.general(),
            dir,
            candidates::expand_for_general(&request, fallbacks),
        ));

        map
    }

    /// Hand over everything registered so far, leaving the adapter empty.
    pub fn take_dependencies(&self) -> DependencySet {
        std::mem::take(&mut self.deps.lock().unwrap())
    }
}

#[async_trait]
impl AsyncImportHook for ImporterAdapter {
    async fn import(&self, url: &str, prev: &str) -> ImportResolution {
        ImporterAdapter::import(self, url, prev).await
    }
}

/// Bridge for callback-family compilers: their hook is synchronous and runs
/// on a worker-pool thread, so each import blocks that thread on the async
/// resolution driven by the runtime. The pool keeps a thread free for
/// exactly this. Requires the multi-thread runtime; on a current-thread
/// runtime the blocked compile would starve its own resolution.
pub struct SyncImportHook {
    adapter: Arc<ImporterAdapter>,
    handle: tokio::runtime::Handle,
}

impl SyncImportHook {
    pub fn new(adapter: Arc<ImporterAdapter>, handle: tokio::runtime::Handle) -> Self {
        Self { adapter, handle }
    }
}

impl ImportHook for SyncImportHook {
    fn import(&self, url: &str, prev: &str) -> ImportResolution {
        self.handle.block_on(self.adapter.import(url, prev))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveMiss;
    use crate::resolver::Resolver;
    use std::collections::HashMap;

    /// Resolver answering from a fixed request table.
    #[derive(Default)]
    struct Table {
        hits: HashMap<String, Utf8PathBuf>,
    }

    impl Table {
        fn with(hits: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                hits: hits
                    .iter()
                    .map(|(k, v)| (k.to_string(), Utf8PathBuf::from(v)))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl Resolver for Table {
        async fn resolve(
            &self,
            _base: &Utf8Path,
            request: &str,
        ) -> Result<Utf8PathBuf, ResolveMiss> {
            self.hits.get(request).cloned().ok_or(ResolveMiss)
        }
    }

    fn adapter(
        sass: &[(&str, &str)],
        general: &[(&str, &str)],
        include_paths: &[&str],
    ) -> ImporterAdapter {
        ImporterAdapter::new(
            DualResolver::new(Table::with(sass), Table::with(general)),
            include_paths.iter().map(Utf8PathBuf::from).collect(),
            "/proj/styles",
        )
    }

    #[tokio::test]
    async fn include_path_hit_wins_over_general() {
        let adapter = adapter(
            &[("_buttons.scss", "/proj/styles/vendor/_buttons.scss")],
            &[("_buttons.scss", "/elsewhere/_buttons.scss")],
            &["/proj/styles/vendor"],
        );

        let out = adapter.import("buttons", "/proj/styles/main.scss").await;
        assert_eq!(out.file, "/proj/styles/vendor/_buttons.scss");

        let deps: Vec<_> = adapter
            .take_dependencies()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(deps, ["/proj/styles/vendor/_buttons.scss"]);
    }

    #[tokio::test]
    async fn falls_through_to_general_alias_on_literal_request() {
        // nothing matches the expanded candidates, only the literal name,
        // the way a bundler alias table would
        let adapter = adapter(
            &[],
            &[("bootstrap", "/proj/node_modules/bootstrap/scss/bootstrap.scss")],
            &["/proj/styles/vendor"],
        );

        let out = adapter.import("bootstrap", "/proj/styles/main.scss").await;
        assert_eq!(out.file, "/proj/node_modules/bootstrap/scss/bootstrap.scss");
    }

    #[tokio::test]
    async fn unresolvable_request_passes_through_verbatim() {
        let adapter = adapter(&[], &[], &["/proj/styles/vendor"]);

        let out = adapter.import("missing", "/proj/styles/main.scss").await;
        assert_eq!(out.file, "missing");
        assert!(adapter.take_dependencies().is_empty());
    }

    #[tokio::test]
    async fn css_hit_comes_back_without_extension() {
        let adapter = adapter(&[], &[("reset.css", "/proj/vendor/reset.css")], &[]);

        let out = adapter.import("reset.css", "/proj/styles/main.scss").await;
        assert_eq!(out.file, "/proj/vendor/reset");

        // the dependency keeps the real extension
        let deps: Vec<_> = adapter
            .take_dependencies()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(deps, ["/proj/vendor/reset.css"]);
    }

    #[tokio::test]
    async fn scss_hit_keeps_extension() {
        let adapter = adapter(&[("_a.scss", "/proj/styles/_a.scss")], &[], &["/proj/styles"]);

        let out = adapter.import("a", "/proj/styles/main.scss").await;
        assert_eq!(out.file, "/proj/styles/_a.scss");
    }

    #[tokio::test]
    async fn module_request_skips_sass_entries() {
        // the sass table would match, but module requests must never
        // consult include paths
        let adapter = adapter(
            &[("~pkg/sub", "/wrong/sub.scss")],
            &[("~pkg/sub", "/proj/node_modules/pkg/sub.scss")],
            &["/proj/styles/vendor"],
        );

        let out = adapter.import("~pkg/sub", "/proj/styles/main.scss").await;
        assert_eq!(out.file, "/proj/node_modules/pkg/sub.scss");
    }

    #[tokio::test]
    async fn absolute_request_skips_sass_entries() {
        let adapter = adapter(
            &[],
            &[("/abs/theme.scss", "/abs/theme.scss")],
            &["/proj/styles/vendor"],
        );

        let out = adapter.import("/abs/theme.scss", "/proj/styles/main.scss").await;
        assert_eq!(out.file, "/abs/theme.scss");
    }

    #[tokio::test]
    async fn windows_drive_request_skips_sass_entries() {
        let adapter = adapter(
            &[],
            &[("C:/styles/theme.scss", "C:/styles/theme.scss")],
            &["/proj/styles/vendor"],
        );

        let out = adapter
            .import("C:/styles/theme.scss", "/proj/styles/main.scss")
            .await;
        assert_eq!(out.file, "C:/styles/theme.scss");
    }

    #[tokio::test]
    async fn file_uri_is_converted_before_resolution() {
        let adapter = adapter(
            &[],
            &[("/proj/vendor/theme.scss", "/proj/vendor/theme.scss")],
            &[],
        );

        let out = adapter
            .import("file:///proj/vendor/theme.scss", "/proj/styles/main.scss")
            .await;
        assert_eq!(out.file, "/proj/vendor/theme.scss");
    }

    #[tokio::test]
    async fn remote_file_uri_degrades_to_passthrough() {
        let adapter = adapter(&[], &[], &[]);

        let out = adapter
            .import("file://host/theme.scss", "/proj/styles/main.scss")
            .await;
        assert_eq!(out.file, "file://host/theme.scss");
    }

    #[tokio::test]
    async fn stdin_previous_file_uses_resource_directory() {
        #[derive(Default)]
        struct CaptureBase {
            bases: Mutex<Vec<Utf8PathBuf>>,
        }

        #[async_trait]
        impl Resolver for CaptureBase {
            async fn resolve(
                &self,
                base: &Utf8Path,
                _request: &str,
            ) -> Result<Utf8PathBuf, ResolveMiss> {
                self.bases.lock().unwrap().push(base.to_owned());
                Err(ResolveMiss)
            }
        }

        let capture = Arc::new(CaptureBase::default());
        let adapter = ImporterAdapter::new(
            DualResolver::new(capture.clone(), capture.clone()),
            Vec::new(),
            "/proj/styles",
        );

        adapter.import("foo", STDIN_SENTINEL).await;

        let bases = capture.bases.lock().unwrap();
        assert!(bases.iter().all(|b| b == Utf8Path::new("/proj/styles")));
    }

    #[tokio::test]
    async fn backslash_separators_in_previous_file_normalized() {
        let adapter = adapter(&[], &[], &[]);

        let dir = adapter.importing_dir("C:\\proj\\styles\\partials\\_nav.scss");
        assert_eq!(dir, Utf8PathBuf::from("C:/proj/styles/partials"));
    }
}
