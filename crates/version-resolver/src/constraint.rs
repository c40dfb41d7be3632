use std::fmt;
use std::str::FromStr;

use crate::compare::{Identifier, Version};
use crate::error::VersionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=1.2.3`
    Exact,
    /// `>1.2.3`
    Greater,
    /// `>=1.2.3`
    GreaterEq,
    /// `<1.2.3`
    Less,
    /// `<=1.2.3`
    LessEq,
    /// `~1.2.3`
    Tilde,
    /// `^1.2.3` or a bare `1.2.3`
    Caret,
    /// `1.2.*`
    Wildcard,
}

impl Operator {
    fn as_str(&self) -> &'static str {
        match self {
            Operator::Exact => "=",
            Operator::Greater => ">",
            Operator::GreaterEq => ">=",
            Operator::Less => "<",
            Operator::LessEq => "<=",
            Operator::Tilde => "~",
            Operator::Caret => "^",
            Operator::Wildcard => "",
        }
    }
}

/// One comparator of a requirement. `minor` and `patch` are `None` when left
/// out or written as a wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    pub op: Operator,
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub pre: Vec<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Bound {
    version: Version,
    inclusive: bool,
}

impl Comparator {
    fn parse(requirement: &str, text: &str) -> Result<Option<Self>, VersionError> {
        let text = text.trim();
        let (op, rest) = [
            (">=", Operator::GreaterEq),
            ("<=", Operator::LessEq),
            (">", Operator::Greater),
            ("<", Operator::Less),
            ("=", Operator::Exact),
            ("^", Operator::Caret),
            ("~", Operator::Tilde),
        ]
        .into_iter()
        .find_map(|(prefix, op)| text.strip_prefix(prefix).map(|rest| (op, rest.trim_start())))
        .unwrap_or((Operator::Caret, text));

        if rest.is_empty() {
            return Err(VersionError::constraint(requirement, "missing version"));
        }

        // build metadata never affects matching
        let rest = rest.split('+').next().unwrap_or_default();
        let (release, pre) = match rest.split_once('-') {
            Some((release, pre)) => (release, Some(pre)),
            None => (rest, None),
        };

        let mut parts = Vec::with_capacity(3);
        let mut wildcard = false;
        for part in release.split('.') {
            if part == "*" || part == "x" || part == "X" {
                wildcard = true;
                parts.push(None);
                continue;
            }
            if wildcard {
                return Err(VersionError::constraint(
                    requirement,
                    format!("unexpected `{}` after a wildcard", part),
                ));
            }
            let n = part.parse::<u64>().map_err(|_| {
                VersionError::constraint(requirement, format!("invalid component `{}`", part))
            })?;
            parts.push(Some(n));
        }
        if parts.len() > 3 {
            return Err(VersionError::constraint(requirement, "too many components"));
        }

        let Some(major) = parts[0] else {
            // `*` matches everything
            return Ok(None);
        };
        let minor = parts.get(1).copied().flatten();
        let patch = parts.get(2).copied().flatten();

        let pre = match pre {
            Some(_) if patch.is_none() => {
                return Err(VersionError::constraint(
                    requirement,
                    "a pre-release needs a full version",
                ));
            }
            Some(pre) if pre.is_empty() || pre.split('.').any(str::is_empty) => {
                return Err(VersionError::constraint(requirement, "empty pre-release"));
            }
            Some(pre) => pre.split('.').map(Identifier::parse).collect(),
            None => Vec::new(),
        };

        let op = match op {
            Operator::Caret | Operator::Exact if wildcard => Operator::Wildcard,
            op => op,
        };
        Ok(Some(Comparator {
            op,
            major,
            minor,
            patch,
            pre,
        }))
    }

    fn is_full(&self) -> bool {
        self.minor.is_some() && self.patch.is_some()
    }

    /// The version written, with missing components as zero
    fn floor(&self) -> Version {
        Version::new(
            self.major,
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0),
        )
        .with_pre(self.pre.clone())
    }

    /// First version past a partial `major` or `major.minor`
    fn past_partial(&self) -> Version {
        match self.minor {
            None => Version::new(self.major.saturating_add(1), 0, 0),
            Some(minor) => Version::new(self.major, minor.saturating_add(1), 0),
        }
    }

    fn caret_upper(&self) -> Version {
        let present = [Some(self.major), self.minor, self.patch];
        let present: Vec<u64> = present.iter().map_while(|c| *c).collect();
        let bump = present
            .iter()
            .position(|c| *c != 0)
            .unwrap_or(present.len() - 1);
        match bump {
            0 => Version::new(self.major.saturating_add(1), 0, 0),
            1 => Version::new(self.major, present[1].saturating_add(1), 0),
            _ => Version::new(self.major, present[1], present[2].saturating_add(1)),
        }
    }

    fn bounds(&self) -> (Option<Bound>, Option<Bound>) {
        let inclusive = |version| Some(Bound { version, inclusive: true });
        let exclusive = |version| Some(Bound { version, inclusive: false });
        match self.op {
            Operator::Exact if self.is_full() => (inclusive(self.floor()), inclusive(self.floor())),
            Operator::Exact | Operator::Wildcard => {
                (inclusive(self.floor()), exclusive(self.past_partial()))
            }
            Operator::Greater if self.is_full() => (exclusive(self.floor()), None),
            Operator::Greater => (inclusive(self.past_partial()), None),
            Operator::GreaterEq => (inclusive(self.floor()), None),
            Operator::Less => (None, exclusive(self.floor())),
            Operator::LessEq if self.is_full() => (None, inclusive(self.floor())),
            Operator::LessEq => (None, exclusive(self.past_partial())),
            Operator::Tilde => {
                let upper = match self.minor {
                    Some(minor) => Version::new(self.major, minor.saturating_add(1), 0),
                    None => Version::new(self.major.saturating_add(1), 0, 0),
                };
                (inclusive(self.floor()), exclusive(upper))
            }
            Operator::Caret => (inclusive(self.floor()), exclusive(self.caret_upper())),
        }
    }

    fn matches(&self, version: &Version) -> bool {
        let (lower, upper) = self.bounds();
        let above = lower.map_or(true, |b| {
            if b.inclusive {
                *version >= b.version
            } else {
                *version > b.version
            }
        });
        let below = upper.map_or(true, |b| {
            if b.inclusive {
                *version <= b.version
            } else {
                *version < b.version
            }
        });
        above && below
    }

    fn allows_prerelease_of(&self, version: &Version) -> bool {
        !self.pre.is_empty()
            && Some(version.triple()) == self.minor.zip(self.patch).map(|(m, p)| (self.major, m, p))
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.major)?;
        match (self.minor, self.op) {
            (Some(minor), _) => write!(f, ".{}", minor)?,
            (None, Operator::Wildcard) => return f.write_str(".*"),
            (None, _) => return Ok(()),
        }
        match (self.patch, self.op) {
            (Some(patch), _) => write!(f, ".{}", patch)?,
            (None, Operator::Wildcard) => return f.write_str(".*"),
            (None, _) => return Ok(()),
        }
        for (i, id) in self.pre.iter().enumerate() {
            f.write_str(if i == 0 { "-" } else { "." })?;
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

/// A parsed version requirement: comma separated comparators that must all
/// hold. An empty requirement or `*` accepts every release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    comparators: Vec<Comparator>,
}

impl VersionConstraint {
    pub fn parse(requirement: &str) -> Result<Self, VersionError> {
        let trimmed = requirement.trim();
        if trimmed.is_empty() {
            return Ok(Self {
                comparators: Vec::new(),
            });
        }
        let mut comparators = Vec::new();
        for part in trimmed.split(',') {
            if part.trim().is_empty() {
                return Err(VersionError::constraint(requirement, "empty comparator"));
            }
            if let Some(comparator) = Comparator::parse(requirement, part)? {
                comparators.push(comparator);
            }
        }
        Ok(Self { comparators })
    }

    pub fn comparators(&self) -> &[Comparator] {
        &self.comparators
    }

    pub fn is_any(&self) -> bool {
        self.comparators.is_empty()
    }

    /// Pre-releases only match when a comparator names a pre-release of the
    /// same `major.minor.patch`.
    pub fn matches(&self, version: &Version) -> bool {
        if !self.comparators.iter().all(|c| c.matches(version)) {
            return false;
        }
        !version.is_prerelease()
            || self
                .comparators
                .iter()
                .any(|c| c.allows_prerelease_of(version))
    }

    /// Like [`matches`](Self::matches) for a raw string; invalid versions never match.
    pub fn matches_str(&self, version: &str) -> bool {
        Version::parse(version).is_ok_and(|v| self.matches(&v))
    }

    /// The requirement as explicit bounds, e.g. `[">=1.2.3", "<2.0.0"]`.
    pub fn to_range(&self) -> Vec<String> {
        if self.comparators.is_empty() {
            return vec![">=0.0.0".to_string()];
        }
        let mut range = Vec::new();
        for comparator in &self.comparators {
            match comparator.bounds() {
                (Some(lower), Some(upper)) if lower == upper => {
                    range.push(format!("={}", lower.version));
                }
                (lower, upper) => {
                    if let Some(b) = lower {
                        range.push(format!("{}{}", if b.inclusive { ">=" } else { ">" }, b.version));
                    }
                    if let Some(b) = upper {
                        range.push(format!("{}{}", if b.inclusive { "<=" } else { "<" }, b.version));
                    }
                }
            }
        }
        range
    }
}

impl FromStr for VersionConstraint {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionConstraint::parse(s)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.comparators.is_empty() {
            return f.write_str("*");
        }
        for (i, c) in self.comparators.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(req: &str) -> Vec<String> {
        VersionConstraint::parse(req).unwrap().to_range()
    }

    fn matches(req: &str, version: &str) -> bool {
        VersionConstraint::parse(req).unwrap().matches_str(version)
    }

    #[test]
    fn test_caret_ranges() {
        assert_eq!(range("^1.2.3"), vec![">=1.2.3", "<2.0.0"]);
        assert_eq!(range("1.2.3"), vec![">=1.2.3", "<2.0.0"]);
        assert_eq!(range("^1.2"), vec![">=1.2.0", "<2.0.0"]);
        assert_eq!(range("^1"), vec![">=1.0.0", "<2.0.0"]);
        assert_eq!(range("^0.2.3"), vec![">=0.2.3", "<0.3.0"]);
        assert_eq!(range("^0.2"), vec![">=0.2.0", "<0.3.0"]);
        assert_eq!(range("^0.0.3"), vec![">=0.0.3", "<0.0.4"]);
        assert_eq!(range("^0.0"), vec![">=0.0.0", "<0.1.0"]);
        assert_eq!(range("^0"), vec![">=0.0.0", "<1.0.0"]);
        assert_eq!(range("^0.0.0"), vec![">=0.0.0", "<0.0.1"]);
        assert_eq!(range("^1.x"), vec![">=1.0.0", "<2.0.0"]);
    }

    #[test]
    fn test_caret_boundaries() {
        assert!(matches("^0.2.3", "0.2.9"));
        assert!(!matches("^0.2.3", "0.3.0"));
        assert!(!matches("^0.2.3", "0.2.2"));
        assert!(matches("^0.0.3", "0.0.3"));
        assert!(!matches("^0.0.3", "0.0.4"));
        assert!(matches("1.0", "1.9.9"));
        assert!(!matches("1.0", "2.0.0"));
    }

    #[test]
    fn test_tilde_ranges() {
        assert_eq!(range("~1.2.3"), vec![">=1.2.3", "<1.3.0"]);
        assert_eq!(range("~1.2"), vec![">=1.2.0", "<1.3.0"]);
        assert_eq!(range("~1"), vec![">=1.0.0", "<2.0.0"]);
        assert_eq!(range("~0.0.3"), vec![">=0.0.3", "<0.1.0"]);
    }

    #[test]
    fn test_wildcard_and_any() {
        assert_eq!(range("1.*"), vec![">=1.0.0", "<2.0.0"]);
        assert_eq!(range("1.2.x"), vec![">=1.2.0", "<1.3.0"]);
        assert_eq!(range("=1.2"), vec![">=1.2.0", "<1.3.0"]);
        assert!(VersionConstraint::parse("*").unwrap().is_any());
        assert!(VersionConstraint::parse("").unwrap().is_any());
        assert!(matches("*", "99.0.0"));
        assert!(!matches("*", "1.0.0-beta"));
    }

    #[test]
    fn test_operators() {
        assert_eq!(range("=1.2.3"), vec!["=1.2.3"]);
        assert_eq!(range(">1.2"), vec![">=1.3.0"]);
        assert_eq!(range(">1.2.3"), vec![">1.2.3"]);
        assert_eq!(range("<=1.2"), vec!["<1.3.0"]);
        assert_eq!(range("<=1.2.3"), vec!["<=1.2.3"]);
        assert_eq!(range(">= 1.2, < 1.5"), vec![">=1.2.0", "<1.5.0"]);

        assert!(matches(">=1.2, <1.5", "1.4.99"));
        assert!(!matches(">=1.2, <1.5", "1.5.0"));
        assert!(matches("=1.2.3", "1.2.3"));
        assert!(!matches("=1.2.3", "1.2.4"));
        assert!(matches("<1.2.3", "1.2.2"));
    }

    #[test]
    fn test_prerelease_matching() {
        assert!(!matches("^1.2.3", "1.3.0-beta.1"));
        assert!(matches("^1.2.3-alpha.1", "1.2.3-alpha.2"));
        assert!(matches("^1.2.3-alpha.1", "1.2.3"));
        assert!(matches("^1.2.3-alpha.1", "1.4.0"));
        assert!(!matches("^1.2.3-alpha.1", "1.2.4-alpha.1"));
        assert!(!matches("^1.2.3-alpha.2", "1.2.3-alpha.1"));
    }

    #[test]
    fn test_invalid_requirements() {
        for req in ["?", "abc", "^", "1.2.3.4", "1.*.3", ">=1.0,", "1.2-beta", "~>1.0"] {
            assert!(
                matches!(
                    VersionConstraint::parse(req),
                    Err(VersionError::InvalidConstraint { .. })
                ),
                "{}",
                req
            );
        }
    }

    #[test]
    fn test_display() {
        let c = VersionConstraint::parse(">= 1.2, <1.5, 2.*, ~0.3.1-rc.1").unwrap();
        assert_eq!(c.to_string(), ">=1.2, <1.5, 2.*, ~0.3.1-rc.1");
        assert_eq!(VersionConstraint::parse("*").unwrap().to_string(), "*");
    }
}
