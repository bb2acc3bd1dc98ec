//! Reconciling the two engine output shapes into one result.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::engine::{LegacyOutput, ModernOutput};
use crate::error::NormalizeError;
use crate::importer::STDIN_SENTINEL;
use crate::utils;

/// The JSON source-map shape exchanged with compilers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceMap {
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// A map that carries no sources and no mappings says nothing; it is
    /// treated the same as no map at all.
    pub fn is_trivial(&self) -> bool {
        self.sources.is_empty() && self.mappings.is_empty()
    }
}

/// Normalized compile outcome handed to the build system.
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub css: String,
    pub map: Option<SourceMap>,
    /// Absolute paths of every file the compiler read, deduplicated in
    /// first-seen order.
    pub included_files: Vec<Utf8PathBuf>,
}

/// Raw engine output, one variant per API family.
#[derive(Debug, Clone)]
pub enum RawOutput {
    Legacy(LegacyOutput),
    Modern(ModernOutput),
}

pub(crate) struct NormalizeContext<'a> {
    pub resource: &'a Utf8Path,
    pub build_root: &'a Utf8Path,
    pub cwd: &'a Utf8Path,
}

/// Shape raw engine output into a [`CompileResult`].
///
/// Callback-family output carries CSS as bytes and the map as unparsed JSON
/// whose first source is the stdin marker; that source is rewritten to the
/// real resource path relative to the build root, and the map's root is set
/// to the build root relative to the working directory. Promise-family
/// output is already structured and its map passes through untouched. In
/// both families a requested-but-trivial map normalizes to `None`, and
/// reported files that are not local absolute paths are dropped.
pub(crate) fn normalize(
    raw: RawOutput,
    ctx: &NormalizeContext<'_>,
) -> Result<CompileResult, NormalizeError> {
    match raw {
        RawOutput::Legacy(out) => normalize_legacy(out, ctx),
        RawOutput::Modern(out) => normalize_modern(out),
    }
}

fn normalize_legacy(
    out: LegacyOutput,
    ctx: &NormalizeContext<'_>,
) -> Result<CompileResult, NormalizeError> {
    let css = String::from_utf8(out.css)?;

    let map = match out.map {
        Some(bytes) if !bytes.is_empty() => {
            let mut map: SourceMap = serde_json::from_slice(&bytes)?;

            if map.is_trivial() {
                None
            } else {
                rewrite_stdin_source(&mut map, ctx);
                Some(map)
            }
        }
        _ => None,
    };

    let included_files = collect_files(out.included_files.iter().map(String::as_str));

    Ok(CompileResult {
        css,
        map,
        included_files,
    })
}

fn normalize_modern(out: ModernOutput) -> Result<CompileResult, NormalizeError> {
    let map = out.source_map.filter(|map| !map.is_trivial());

    let included_files = collect_files(out.loaded_urls.iter().filter_map(|uri| {
        let path = utils::file_uri_to_path(uri);
        if path.is_none() {
            trace!(%uri, "dropping non-local loaded url");
        }
        path
    }));

    Ok(CompileResult {
        css: out.css,
        map,
        included_files,
    })
}

/// Replace the compiler's stdin marker with the resource's build-root
/// relative path, and anchor the map at the build root.
fn rewrite_stdin_source(map: &mut SourceMap, ctx: &NormalizeContext<'_>) {
    if let Some(first) = map.sources.first_mut() {
        if first == STDIN_SENTINEL {
            *first = utils::relative_path(ctx.build_root, ctx.resource).into_string();
        }
    }

    map.source_root = Some(utils::relative_path(ctx.cwd, ctx.build_root).into_string());
}

fn collect_files<I, P>(paths: I) -> Vec<Utf8PathBuf>
where
    I: Iterator<Item = P>,
    P: AsRef<str>,
{
    let mut acc: Vec<Utf8PathBuf> = Vec::new();

    for path in paths {
        let path = Utf8PathBuf::from(utils::normalize_separators(path.as_ref()));

        if !utils::is_absolute_like(path.as_str()) {
            trace!(%path, "dropping non-absolute included file");
            continue;
        }

        if !acc.contains(&path) {
            acc.push(path);
        }
    }

    acc
}
