use crate::compare::Version;
use crate::constraint::VersionConstraint;
use crate::error::VersionError;

/// How a declared requirement relates to what the registry offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The latest available version satisfies the requirement
    UpToDate,
    /// Some version satisfies the requirement, but not the latest
    Outdated,
    /// Nothing available satisfies the requirement
    Incompatible,
    /// The requirement could not be parsed, or there is nothing to compare with
    Error,
}

/// Everything the presentation layer needs to decorate one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub classification: Classification,
    pub latest: Option<String>,
    pub max_satisfying: Option<String>,
    pub error: Option<String>,
}

/// Check a requirement against versions sorted latest first.
///
/// Returns whether the latest version satisfies the requirement, and the
/// highest satisfying version.
pub fn check_version(
    constraint: &str,
    available: &[String],
) -> Result<(bool, Option<String>), VersionError> {
    let constraint = VersionConstraint::parse(constraint)?;

    let is_latest = available
        .first()
        .is_some_and(|latest| constraint.matches_str(latest));

    let max_satisfying = available
        .iter()
        .filter_map(|raw| Version::parse(raw).ok().map(|v| (v, raw)))
        .filter(|(v, _)| constraint.matches(v))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, raw)| raw.clone());

    Ok((is_latest, max_satisfying))
}

pub fn resolve(constraint: &str, available: &[String]) -> Resolution {
    let latest = available.first().cloned();
    if latest.is_none() {
        return Resolution {
            classification: Classification::Error,
            latest,
            max_satisfying: None,
            error: Some("no versions available".to_string()),
        };
    }

    // cargo rejects a blank requirement in a manifest
    if constraint.trim().is_empty() {
        return Resolution {
            classification: Classification::Error,
            latest,
            max_satisfying: None,
            error: Some(VersionError::constraint(constraint, "empty requirement").to_string()),
        };
    }

    match check_version(constraint, available) {
        Ok((is_latest, max_satisfying)) => {
            let classification = match (is_latest, &max_satisfying) {
                (true, _) => Classification::UpToDate,
                (false, Some(_)) => Classification::Outdated,
                (false, None) => Classification::Incompatible,
            };
            Resolution {
                classification,
                latest,
                max_satisfying,
                error: None,
            }
        }
        Err(e) => Resolution {
            classification: Classification::Error,
            latest,
            max_satisfying: None,
            error: Some(e.to_string()),
        },
    }
}

pub fn classify(constraint: &str, available: &[String]) -> Classification {
    resolve(constraint, available).classification
}
