//! # registry-index
//!
//! Look up the published versions and feature lists of crates.
//!
//! ## Overview
//!
//! - [`SparseIndex`] speaks the sparse HTTP index protocol (crates.io and
//!   alternate registries with an optional auth token).
//! - [`LocalGitIndex`] reads the git mirror cargo keeps in `$CARGO_HOME`.
//! - [`CachedLookup`] puts a time-bounded cache in front of either.
//! - [`fetch_versions`] resolves every dependency of a manifest concurrently,
//!   turning per-crate failures into [`FetchState::Failed`].
//!
//! ## Example
//!
//! ```ignore
//! use registry_index::{fetch_versions, CachedLookup, FetchOptions, Registries, SparseIndex};
//!
//! let lookup = CachedLookup::new(SparseIndex::new(reqwest::Client::new()));
//! let deps = toml_parser::filter_crates(toml_parser::parse(text).tables());
//! let resolved = fetch_versions(&lookup, &Registries::default(), deps, FetchOptions::default()).await;
//! for r in &resolved {
//!     println!("{} -> {:?}", r.dependency.name, r.latest());
//! }
//! ```

mod cache;
mod error;
mod fetcher;
mod git;
mod index;
mod lookup;
mod sparse;

pub use cache::{CachedLookup, CACHE_TTL};
pub use error::RegistryError;
pub use fetcher::{failed_crates, fetch_versions, FetchOptions, FetchState, ResolvedDependency};
pub use git::{LocalGitIndex, DEFAULT_BRANCH, DEFAULT_INDEX_HASH};
pub use index::{index_path, parse_index_lines, CrateMetadata};
pub use lookup::{IndexRouter, Registries, RegistryLookup, RegistrySource, CRATES_IO_INDEX};
pub use sparse::{crate_url, SparseIndex};
