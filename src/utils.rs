use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use url::Url;

/// Rewrite backslash separators to forward slashes. Compilers may report
/// paths with either separator regardless of the host OS.
pub(crate) fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// True when the specifier denotes a filesystem location on its own: a
/// POSIX-absolute path, a Windows drive-letter path or a UNC share.
pub(crate) fn is_absolute_like(spec: &str) -> bool {
    if spec.starts_with('/') {
        return true;
    }

    if spec.starts_with("\\\\") || spec.starts_with("//") {
        return true;
    }

    has_drive_prefix(spec)
}

/// `C:/` or `C:\` prefixes.
pub(crate) fn has_drive_prefix(spec: &str) -> bool {
    let bytes = spec.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

/// Convert a `file:` URI into a filesystem path.
///
/// Returns `None` when the URI names a remote host, is malformed, or the
/// resulting path is not valid UTF-8. Callers degrade to treating the
/// original string as a relative specifier in that case.
pub(crate) fn file_uri_to_path(uri: &str) -> Option<Utf8PathBuf> {
    let parsed = Url::parse(uri).ok()?;

    if parsed.scheme() != "file" {
        return None;
    }

    let path = parsed.to_file_path().ok()?;
    Utf8PathBuf::from_path_buf(path).ok()
}

/// Lexically remove `.` and `..` components without touching the filesystem.
pub(crate) fn clean_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut acc = Utf8PathBuf::new();

    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if !acc.pop() {
                    acc.push("..");
                }
            }
            other => acc.push(other),
        }
    }

    acc
}

/// Express `to` relative to the directory `from`. Both sides should be
/// absolute; when they share no prefix at all, `to` is returned as is.
pub(crate) fn relative_path(from: &Utf8Path, to: &Utf8Path) -> Utf8PathBuf {
    let from = clean_path(from);
    let to = clean_path(to);

    let mut from_parts = from.components().peekable();
    let mut to_parts = to.components().peekable();

    // skip the shared prefix
    while let (Some(a), Some(b)) = (from_parts.peek(), to_parts.peek()) {
        if a != b {
            break;
        }
        from_parts.next();
        to_parts.next();
    }

    let mut acc = Utf8PathBuf::new();
    for _ in from_parts {
        acc.push("..");
    }
    for part in to_parts {
        acc.push(part);
    }

    if acc.as_str().is_empty() {
        acc.push(".");
    }

    acc
}

/// One line of context for a compiler diagnostic, when the file is readable.
pub(crate) fn line_excerpt(path: &Utf8Path, line: u32) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    let excerpt = text.lines().nth(line.saturating_sub(1) as usize)?;

    Some(format!("{line} | {excerpt}"))
}
