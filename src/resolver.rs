//! Resolver capabilities used by the resolution search.
//!
//! Two handles participate in every import: a constrained resolver modeling
//! Sass's own filesystem semantics for include-path lookups, and a general
//! resolver modeling how the host build system resolves a request anywhere
//! else in its dependency graph. Which handle is used for which tier of the
//! search is decided by the importer, not here.

use std::sync::Arc;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tracing::trace;

use crate::error::ResolveMiss;
use crate::utils;

/// A resolver capability: turn a request rooted at a base directory into an
/// absolute file path, or signal a miss.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, base: &Utf8Path, request: &str) -> Result<Utf8PathBuf, ResolveMiss>;
}

/// The subset of the host resolver's configuration surface this crate
/// consumes. The built-in [`FileResolver`] honors all of it; a build system
/// injecting its own [`Resolver`] maps these onto its native options.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Request prefixes rewritten to fixed paths before any probing.
    pub alias: Vec<(String, Utf8PathBuf)>,
    /// Extensions appended to extensionless requests, in precedence order.
    pub extensions: Vec<String>,
    /// Index file names probed inside a resolved directory.
    pub main_files: Vec<String>,
    /// `package.json` fields consulted for a package's entry stylesheet.
    pub main_fields: Vec<String>,
    /// Condition names consulted in a package's `exports` map.
    pub condition_names: Vec<String>,
    /// Directory names searched upwards for package requests.
    pub modules: Vec<String>,
    /// Accepted suffixes of a final resolved path; empty accepts anything.
    pub restrictions: Vec<String>,
}

impl ResolveOptions {
    /// The constrained configuration for include-path lookups: stylesheet
    /// extensions and index files only, no aliases, no package awareness.
    pub fn sass_style() -> Self {
        Self {
            alias: Vec::new(),
            extensions: vec![".sass".into(), ".scss".into(), ".css".into()],
            main_files: vec!["_index".into(), "index".into()],
            main_fields: Vec::new(),
            condition_names: Vec::new(),
            modules: Vec::new(),
            restrictions: vec![".sass".into(), ".scss".into(), ".css".into()],
        }
    }

    /// The general configuration: stylesheet-oriented package fields ahead
    /// of the generic entry point, `node_modules` lookup, same extension
    /// precedence as the Sass side.
    pub fn bundler_style() -> Self {
        Self {
            alias: Vec::new(),
            extensions: vec![".sass".into(), ".scss".into(), ".css".into()],
            main_files: vec!["_index".into(), "index".into()],
            main_fields: vec!["sass".into(), "style".into(), "main".into()],
            condition_names: vec!["sass".into(), "style".into()],
            modules: vec!["node_modules".into()],
            restrictions: vec![".sass".into(), ".scss".into(), ".css".into()],
        }
    }
}

/// The two resolver handles serving one import, exposed uniformly so the
/// search can treat them polymorphically.
#[derive(Clone)]
pub struct DualResolver {
    sass: Arc<dyn Resolver>,
    general: Arc<dyn Resolver>,
}

impl std::fmt::Debug for DualResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualResolver")
            .field("sass", &"*")
            .field("general", &"*")
            .finish()
    }
}

impl DualResolver {
    pub fn new(sass: Arc<dyn Resolver>, general: Arc<dyn Resolver>) -> Self {
        Self { sass, general }
    }

    /// Both handles backed by the built-in filesystem resolver.
    pub fn from_options(sass: ResolveOptions, general: ResolveOptions) -> Self {
        Self::new(
            Arc::new(FileResolver::new(sass)),
            Arc::new(FileResolver::new(general)),
        )
    }

    pub fn sass(&self) -> Arc<dyn Resolver> {
        self.sass.clone()
    }

    pub fn general(&self) -> Arc<dyn Resolver> {
        self.general.clone()
    }
}

/// Filesystem-backed [`Resolver`] honoring the [`ResolveOptions`] surface.
///
/// This is a deliberately modest stand-in for a full bundler resolver. It
/// understands aliases, extension and index-file probing, upward
/// `node_modules` walks and the stylesheet-oriented `package.json` fields,
/// which is enough to run the crate standalone and to exercise the search
/// in tests. A host build system with its own resolver injects it through
/// the [`Resolver`] trait instead.
#[derive(Debug)]
pub struct FileResolver {
    options: ResolveOptions,
}

impl FileResolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self { options }
    }

    /// Rewrite the request through the alias table. Aliases match either the
    /// whole request or a `key/` prefix of it.
    fn apply_alias(&self, request: &str) -> Option<Utf8PathBuf> {
        for (key, target) in &self.options.alias {
            if request == key {
                return Some(target.clone());
            }
            if let Some(rest) = request.strip_prefix(key.as_str()) {
                if let Some(rest) = rest.strip_prefix('/') {
                    return Some(target.join(rest));
                }
            }
        }

        None
    }

    fn accepts(&self, path: &Utf8Path) -> bool {
        self.options.restrictions.is_empty()
            || self
                .options
                .restrictions
                .iter()
                .any(|suffix| path.as_str().ends_with(suffix.as_str()))
    }

    /// Probe one location: the exact path, then appended extensions, then
    /// index files if the path is a directory.
    fn probe(&self, path: Utf8PathBuf) -> Result<Utf8PathBuf, ResolveMiss> {
        let path = utils::clean_path(&path);

        if path.is_file() && self.accepts(&path) {
            return Ok(path);
        }

        for ext in &self.options.extensions {
            let extended = Utf8PathBuf::from(format!("{path}{ext}"));
            if extended.is_file() && self.accepts(&extended) {
                return Ok(extended);
            }
        }

        if path.is_dir() {
            return self.probe_directory(&path);
        }

        Err(ResolveMiss)
    }

    fn probe_directory(&self, dir: &Utf8Path) -> Result<Utf8PathBuf, ResolveMiss> {
        if let Ok(found) = self.probe_package(dir) {
            return Ok(found);
        }

        for name in &self.options.main_files {
            for ext in &self.options.extensions {
                let index = dir.join(format!("{name}{ext}"));
                if index.is_file() && self.accepts(&index) {
                    return Ok(index);
                }
            }
        }

        Err(ResolveMiss)
    }

    /// Consult `package.json` for a directory: the `exports` map filtered by
    /// the configured condition names first, then the entry fields in order.
    fn probe_package(&self, dir: &Utf8Path) -> Result<Utf8PathBuf, ResolveMiss> {
        if self.options.main_fields.is_empty() && self.options.condition_names.is_empty() {
            return Err(ResolveMiss);
        }

        let manifest = dir.join("package.json");
        let text = std::fs::read_to_string(&manifest).map_err(|_| ResolveMiss)?;
        let json: Value = serde_json::from_str(&text).map_err(|_| ResolveMiss)?;

        if let Some(entry) = self.package_exports_entry(&json) {
            let target = dir.join(entry.trim_start_matches("./"));
            if target.is_file() && self.accepts(&target) {
                return Ok(utils::clean_path(&target));
            }
        }

        for field in &self.options.main_fields {
            if let Some(entry) = json.get(field).and_then(Value::as_str) {
                let entry = entry.trim_start_matches("./");
                // a self-referential entry would loop back into this directory
                if entry.is_empty() || entry == "." {
                    continue;
                }

                if let Ok(found) = self.probe(dir.join(entry)) {
                    return Ok(found);
                }
            }
        }

        Err(ResolveMiss)
    }

    /// The `.` entry of an `exports` map, either a bare string or a
    /// conditional object matched against the configured condition names
    /// with `default` as the final fallback.
    fn package_exports_entry<'a>(&self, json: &'a Value) -> Option<&'a str> {
        let exports = json.get("exports")?;

        let entry = match exports {
            Value::Object(map) if map.keys().any(|k| k.starts_with('.')) => map.get(".")?,
            other => other,
        };

        match entry {
            Value::String(path) => Some(path),
            Value::Object(conditions) => {
                for name in &self.options.condition_names {
                    if let Some(Value::String(path)) = conditions.get(name) {
                        return Some(path);
                    }
                }
                conditions.get("default").and_then(Value::as_str)
            }
            _ => None,
        }
    }

    /// Walk `base` and its ancestors looking for the request inside the
    /// configured modules directories.
    fn resolve_in_modules(
        &self,
        base: &Utf8Path,
        request: &str,
    ) -> Result<Utf8PathBuf, ResolveMiss> {
        for dir in base.ancestors() {
            for modules in &self.options.modules {
                let root = dir.join(modules);
                if !root.is_dir() {
                    continue;
                }

                if let Ok(found) = self.probe(root.join(request)) {
                    return Ok(found);
                }
            }
        }

        Err(ResolveMiss)
    }
}

#[async_trait]
impl Resolver for FileResolver {
    async fn resolve(&self, base: &Utf8Path, request: &str) -> Result<Utf8PathBuf, ResolveMiss> {
        trace!(%base, request, "probing");

        if let Some(aliased) = self.apply_alias(request) {
            return self.probe(aliased);
        }

        if let Some(rest) = request.strip_prefix('~') {
            return self.resolve_in_modules(base, rest);
        }

        if utils::is_absolute_like(request) {
            return self.probe(Utf8PathBuf::from(request));
        }

        if let Ok(found) = self.probe(base.join(request)) {
            return Ok(found);
        }

        // bare requests may still name a package
        if !request.starts_with('.') && !self.options.modules.is_empty() {
            return self.resolve_in_modules(base, request);
        }

        Err(ResolveMiss)
    }
}
