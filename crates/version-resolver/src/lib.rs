//! # version-resolver
//!
//! Semantic version ordering and Cargo-style requirement matching.
//!
//! - [`compare`] orders version strings, pre-releases before their release.
//! - [`VersionConstraint`] parses `^`, `~`, `=`, `<`, `>`, wildcard and bare
//!   requirements into bounds.
//! - [`check_version`] and [`resolve`] decide whether a dependency is up to
//!   date against the versions a registry offers.
//!
//! ```
//! use version_resolver::{classify, Classification};
//!
//! let available = vec!["2.0.0".to_string(), "1.5.0".to_string()];
//! assert_eq!(classify("1.2", &available), Classification::Outdated);
//! ```

mod compare;
mod constraint;
mod error;
mod resolve;

pub use compare::{compare, is_valid, sort_descending, Identifier, Version};
pub use constraint::{Comparator, Operator, VersionConstraint};
pub use error::VersionError;
pub use resolve::{check_version, classify, resolve, Classification, Resolution};
