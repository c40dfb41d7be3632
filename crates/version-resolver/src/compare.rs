use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::VersionError;

static VERSION_RE: OnceLock<Regex> = OnceLock::new();

/// Permissive semver: up to four release components, `x`/`*` wildcards after
/// the major, optional pre-release and build metadata.
fn version_re() -> &'static Regex {
    VERSION_RE.get_or_init(|| {
        RegexBuilder::new(
            r"^v?\d+(\.([x*]|\d+)(\.([x*]|\d+)(\.([x*]|\d+))?(-[\da-z-]+(\.[\da-z-]+)*)?(\+[\da-z-]+(\.[\da-z-]+)*)?)?)?$",
        )
        .case_insensitive(true)
        .build()
        .unwrap()
    })
}

/// One dot-separated pre-release identifier. Numeric identifiers always
/// order before alphanumeric ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    Numeric(u64),
    Alpha(String),
}

impl Identifier {
    pub(crate) fn parse(s: &str) -> Self {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = s.parse() {
                return Identifier::Numeric(n);
            }
        }
        Identifier::Alpha(s.to_string())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{}", n),
            Identifier::Alpha(s) => f.write_str(s),
        }
    }
}

/// A parsed version. Missing and wildcard release components are zero, and
/// build metadata is dropped, so `1.0 == 1.0.0 == 1.0.0+build`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    release: [u64; 4],
    pre: Vec<Identifier>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            release: [major, minor, patch, 0],
            pre: Vec::new(),
        }
    }

    pub fn with_pre(mut self, pre: Vec<Identifier>) -> Self {
        self.pre = pre;
        self
    }

    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let trimmed = s.trim();
        if !version_re().is_match(trimmed) {
            return Err(VersionError::InvalidVersion(s.to_string()));
        }
        let trimmed = trimmed.trim_start_matches(['v', 'V']);
        let trimmed = trimmed.split('+').next().unwrap_or_default();
        let (release_part, pre_part) = match trimmed.split_once('-') {
            Some((release, pre)) => (release, Some(pre)),
            None => (trimmed, None),
        };

        let mut release = [0u64; 4];
        for (slot, part) in release.iter_mut().zip(release_part.split('.')) {
            if part == "x" || part == "X" || part == "*" {
                continue;
            }
            *slot = part
                .parse()
                .map_err(|_| VersionError::InvalidVersion(s.to_string()))?;
        }

        let pre = pre_part
            .map(|p| p.split('.').map(Identifier::parse).collect())
            .unwrap_or_default();
        Ok(Self { release, pre })
    }

    pub fn major(&self) -> u64 {
        self.release[0]
    }

    pub fn minor(&self) -> u64 {
        self.release[1]
    }

    pub fn patch(&self) -> u64 {
        self.release[2]
    }

    pub fn triple(&self) -> (u64, u64, u64) {
        (self.release[0], self.release[1], self.release[2])
    }

    pub fn pre(&self) -> &[Identifier] {
        &self.pre
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release
            .cmp(&other.release)
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor, patch, build] = self.release;
        write!(f, "{}.{}.{}", major, minor, patch)?;
        if build != 0 {
            write!(f, ".{}", build)?;
        }
        for (i, id) in self.pre.iter().enumerate() {
            f.write_str(if i == 0 { "-" } else { "." })?;
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

pub fn is_valid(version: &str) -> bool {
    version_re().is_match(version.trim())
}

/// Total order over valid version strings.
pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionError> {
    Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
}

/// Sort versions latest first. Strings that are not valid versions are dropped.
pub fn sort_descending(versions: Vec<String>) -> Vec<String> {
    let mut parsed: Vec<(Version, String)> = versions
        .into_iter()
        .filter_map(|raw| match Version::parse(&raw) {
            Ok(v) => Some((v, raw)),
            Err(e) => {
                debug!("skipping unsortable version: {}", e);
                None
            }
        })
        .collect();
    parsed.sort_by(|a, b| b.0.cmp(&a.0));
    parsed.into_iter().map(|(_, raw)| raw).collect()
}
