//! Expansion of import specifiers into ordered lookup candidates.
//!
//! Sass resolves an extensionless import against a fixed family of file
//! names: the underscore-prefixed partial form wins over the plain form,
//! `.sass` wins over `.scss` wins over `.css`, and a direct file wins over a
//! directory index. The expansion here reproduces that precedence so that a
//! plain filesystem resolver can probe the candidates one by one.

use std::collections::VecDeque;

/// Extension precedence used throughout the expansion.
const EXTENSIONS: [&str; 3] = ["sass", "scss", "css"];

/// Ordered, deduplicated sequence of lookup candidates derived from one
/// import specifier. Consumed front to back, destructively, during the
/// resolution search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList {
    items: VecDeque<String>,
}

impl CandidateList {
    fn one(candidate: impl Into<String>) -> Self {
        Self {
            items: VecDeque::from([candidate.into()]),
        }
    }

    fn collect(candidates: impl IntoIterator<Item = String>) -> Self {
        let mut list = Self::default();
        for candidate in candidates {
            list.push_dedup(candidate);
        }
        list
    }

    fn push_dedup(&mut self, candidate: impl Into<String>) {
        let candidate = candidate.into();
        if !self.items.contains(&candidate) {
            self.items.push_back(candidate);
        }
    }

    /// Remove and return the next candidate to try.
    pub fn take_front(&mut self) -> Option<String> {
        self.items.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CandidateList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::collect(iter.into_iter().map(Into::into))
    }
}

/// True for specifiers that name a package rather than a file: a `~` marker
/// followed by a bare or scoped package name, with at most one extra path
/// segment and an optional trailing slash. These are handed whole to the
/// package resolver and never expanded.
pub(crate) fn is_module_request(specifier: &str) -> bool {
    let Some(rest) = specifier.strip_prefix('~') else {
        return false;
    };

    if rest.is_empty() || rest.starts_with('.') || rest.starts_with('/') {
        return false;
    }

    let trimmed = rest.strip_suffix('/').unwrap_or(rest);
    if trimmed.is_empty() || trimmed.split('/').any(str::is_empty) {
        return false;
    }

    let segments = trimmed.split('/').count();
    let max = if trimmed.starts_with('@') { 3 } else { 2 };

    segments <= max
}

/// Split a specifier into its directory part (trailing slash included) and
/// final segment.
fn split_last_segment(specifier: &str) -> (&str, &str) {
    match specifier.rfind('/') {
        Some(at) => (&specifier[..=at], &specifier[at + 1..]),
        None => ("", specifier),
    }
}

/// Extension of the final path segment, if any. Only the final dot of the
/// final segment counts; a dot elsewhere in the path is a regular character,
/// and a leading dot marks a hidden file rather than an extension.
fn extension_of(segment: &str) -> Option<&str> {
    match segment.rfind('.') {
        Some(0) | None => None,
        Some(at) => Some(&segment[at + 1..]),
    }
}

/// Expand a specifier into the ordered candidates Sass would probe for it.
///
/// Module requests come back as a single opaque candidate. Specifiers with
/// an explicit `.scss`/`.sass` extension produce exactly the partial and the
/// plain form, never a different extension. A `.css` specifier produces no
/// candidates at all, forcing the caller to fall back to passing the
/// original string through. Everything else expands to twelve candidates:
/// six direct file forms followed by six directory-index forms.
pub fn expand(specifier: &str) -> CandidateList {
    if is_module_request(specifier) {
        return CandidateList::one(specifier);
    }

    let specifier = specifier.trim_end_matches('/');
    let (dir, base) = split_last_segment(specifier);

    match extension_of(base) {
        Some("css") => CandidateList::default(),
        Some("scss" | "sass") => {
            CandidateList::collect([format!("{dir}_{base}"), format!("{dir}{base}")])
        }
        _ => {
            let mut acc = Vec::with_capacity(12);

            for ext in EXTENSIONS {
                acc.push(format!("{dir}_{base}.{ext}"));
                acc.push(format!("{dir}{base}.{ext}"));
            }
            for ext in EXTENSIONS {
                acc.push(format!("{dir}{base}/_index.{ext}"));
                acc.push(format!("{dir}{base}/index.{ext}"));
            }

            CandidateList::collect(acc)
        }
    }
}

/// Expansion for the general resolver: the same candidates, with the
/// unexpanded original specifiers appended as final fallbacks so that an
/// alias table can still match the literal request.
pub fn expand_for_general<'a>(
    specifier: &str,
    fallbacks: impl IntoIterator<Item = &'a str>,
) -> CandidateList {
    let mut list = expand(specifier);

    for fallback in fallbacks {
        list.push_dedup(fallback);
    }

    list
}
