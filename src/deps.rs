//! Dependency reporting back to the build system.

use std::collections::HashSet;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::trace;

use crate::utils;

/// The build system's invalidation boundary. Every file this crate reads or
/// resolves to during a compile is reported here, so that editing any of
/// them retriggers the build. Implementations must be idempotent; the same
/// path may be reported more than once across compiles.
pub trait BuildContext: Send + Sync {
    fn add_dependency(&self, path: &Utf8Path);
}

/// Ordered set of absolute dependency paths accumulated during one compile.
/// Grows monotonically, is flushed once at compile end, including on the
/// error path, and is never shared across compiles.
#[derive(Debug, Default)]
pub struct DependencySet {
    seen: HashSet<Utf8PathBuf>,
    order: Vec<Utf8PathBuf>,
}

impl DependencySet {
    /// Record one path. Separators are normalized first; paths that are not
    /// absolute are dropped, they indicate content synthesized by an
    /// importer rather than a real file and must not be watched.
    pub fn insert(&mut self, path: impl AsRef<str>) -> bool {
        let path = Utf8PathBuf::from(utils::normalize_separators(path.as_ref()));

        if !utils::is_absolute_like(path.as_str()) {
            trace!(%path, "dropping non-absolute dependency");
            return false;
        }

        if self.seen.insert(path.clone()) {
            self.order.push(path);
            true
        } else {
            false
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Utf8Path> {
        self.order.iter().map(Utf8PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Report everything collected to the build system.
    pub fn flush(&self, ctx: &dyn BuildContext) {
        for path in self.iter() {
            ctx.add_dependency(path);
        }
    }
}

/// Ready-made [`BuildContext`] capturing dependencies in memory, useful for
/// standalone builds and tests.
#[derive(Debug, Default)]
pub struct CollectDependencies {
    inner: Mutex<Vec<Utf8PathBuf>>,
}

impl CollectDependencies {
    pub fn paths(&self) -> Vec<Utf8PathBuf> {
        self.inner.lock().unwrap().clone()
    }
}

impl BuildContext for CollectDependencies {
    fn add_dependency(&self, path: &Utf8Path) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.iter().any(|p| p == path) {
            inner.push(path.to_owned());
        }
    }
}
