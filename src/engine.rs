//! The external compiler boundary.
//!
//! Two API families exist in the wild: a synchronous callback-based one and
//! a promise-based one. Both are modeled as traits here and selected once at
//! configuration time into a closed [`Engine`] union, so nothing downstream
//! ever sniffs version strings at compile time.

pub mod legacy;
pub mod modern;

#[cfg(feature = "grass")]
pub mod native;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ConfigError;

pub use legacy::{LegacyCompiler, LegacyOptions, LegacyOutput};
pub use modern::{ModernCompiler, ModernOptions, ModernOutput};

/// Known compiler implementation families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    NodeSass,
    DartSass,
    Embedded,
}

impl Family {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "node-sass" => Some(Family::NodeSass),
            "dart-sass" | "sass" => Some(Family::DartSass),
            "sass-embedded" => Some(Family::Embedded),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Family::NodeSass => "node-sass",
            Family::DartSass => "dart-sass",
            Family::Embedded => "sass-embedded",
        }
    }

    /// Oldest version this crate knows how to talk to.
    fn minimum(&self) -> (Version, &'static str) {
        match self {
            Family::NodeSass => (Version::new(4, 0, 0), "4.0.0"),
            Family::DartSass => (Version::new(1, 3, 0), "1.3.0"),
            Family::Embedded => (Version::new(1, 45, 0), "1.45.0"),
        }
    }
}

/// Three-component compiler version. Pre-release and build suffixes are
/// accepted on parse and ignored for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for Version {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s
            .split_once(['-', '+'])
            .map(|(head, _)| head)
            .unwrap_or(s);

        let mut parts = bare.split('.');
        let major = parts.next().ok_or(())?.parse().map_err(|_| ())?;
        let minor = parts.next().unwrap_or("0").parse().map_err(|_| ())?;
        let patch = parts.next().unwrap_or("0").parse().map_err(|_| ())?;

        if parts.next().is_some() {
            return Err(());
        }

        Ok(Version::new(major, minor, patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parsed compiler self-identification.
///
/// Compilers report themselves as `"<implementation>\t<semver>"`. Anything
/// unparseable, unknown or too old is a configuration error surfaced before
/// the first compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineInfo {
    pub family: Family,
    pub version: Version,
}

pub fn parse_info(info: &str) -> Result<EngineInfo, ConfigError> {
    let (name, version) = info
        .split_once('\t')
        .ok_or_else(|| ConfigError::MalformedInfo(info.to_string()))?;

    let family = Family::from_name(name.trim())
        .ok_or_else(|| ConfigError::UnknownImplementation(name.trim().to_string()))?;

    let version: Version = version
        .trim()
        .parse()
        .map_err(|_| ConfigError::MalformedInfo(info.to_string()))?;

    let (floor, minimum) = family.minimum();
    if version < floor {
        return Err(ConfigError::UnsupportedVersion {
            name: family.name(),
            found: version.to_string(),
            minimum,
        });
    }

    Ok(EngineInfo { family, version })
}

/// A configured compiler, one of the two API families.
#[derive(Clone)]
pub enum Engine {
    Legacy(Arc<dyn LegacyCompiler>),
    Modern(Arc<dyn ModernCompiler>),
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Legacy(_) => write!(f, "Engine::Legacy(*)"),
            Engine::Modern(_) => write!(f, "Engine::Modern(*)"),
        }
    }
}
