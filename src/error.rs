use camino::Utf8PathBuf;
use thiserror::Error;

/// A single resolver probe found nothing. This is control flow, not a
/// failure: the search consumes it and moves on to the next candidate, and
/// only a fully exhausted map surfaces it to the importer, which then falls
/// back to the original specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no matching file")]
pub struct ResolveMiss;

/// Position a compiler attached to a failure, when it reported one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceSpan {
    pub file: Option<Utf8PathBuf>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// Raised while assembling a [`Bridge`](crate::Bridge), before any compile is
/// attempted. Never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Malformed compiler info '{0}', expected \"<implementation>\\t<version>\"")]
    MalformedInfo(String),

    #[error("Unknown Sass implementation '{0}'")]
    UnknownImplementation(String),

    #[error("Unsupported {name} version {found}, {minimum} or newer is required")]
    UnsupportedVersion {
        name: &'static str,
        found: String,
        minimum: &'static str,
    },

    #[error("An engine must be configured before finishing")]
    MissingEngine,

    #[error("Couldn't determine the current working directory.\n{0}")]
    WorkingDir(#[from] std::io::Error),

    #[error("Couldn't convert path to UTF-8.\n{0}")]
    PathFormat(#[from] camino::FromPathBufError),
}

/// Failure reported by an engine while compiling a stylesheet.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{message}")]
    Compile { message: String, span: SourceSpan },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure while reshaping raw engine output.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Compiler returned CSS that is not valid UTF-8.\n{0}")]
    CssEncoding(#[from] std::string::FromUtf8Error),

    #[error("Couldn't parse the source map returned by the compiler.\n{0}")]
    SourceMapJson(#[from] serde_json::Error),
}

/// Everything a single compile can surface to the build system.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Sass compilation failed.\n{message}")]
    Compilation { message: String, span: SourceSpan },

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("Couldn't run the compile job.\n{0}")]
    Queue(#[from] crate::queue::QueueError),
}
