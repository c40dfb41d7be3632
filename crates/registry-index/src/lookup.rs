use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::RegistryError;
use crate::git::LocalGitIndex;
use crate::index::CrateMetadata;
use crate::sparse::SparseIndex;

pub const CRATES_IO_INDEX: &str = "https://index.crates.io/";

/// Where to look a crate up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrySource {
    /// `None` for the default registry
    pub name: Option<String>,
    /// Sparse index base url, without the `sparse+` prefix
    pub index: String,
    /// Sent verbatim as the `Authorization` header
    pub token: Option<String>,
}

impl RegistrySource {
    pub fn new(name: Option<String>, index: &str, token: Option<String>) -> Self {
        let index = index.strip_prefix("sparse+").unwrap_or(index);
        Self {
            name,
            index: index.to_string(),
            token,
        }
    }

    pub fn crates_io() -> Self {
        Self::new(None, CRATES_IO_INDEX, None)
    }

    pub fn is_default(&self) -> bool {
        self.name.is_none()
    }
}

/// Fetches the published versions of a crate.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    async fn get_versions(
        &self,
        name: &str,
        source: &RegistrySource,
    ) -> Result<CrateMetadata, RegistryError>;
}

/// The default registry plus named alternate registries.
#[derive(Debug, Clone)]
pub struct Registries {
    default: RegistrySource,
    alternates: HashMap<String, RegistrySource>,
}

impl Default for Registries {
    fn default() -> Self {
        Self::new(RegistrySource::crates_io())
    }
}

impl Registries {
    pub fn new(default: RegistrySource) -> Self {
        Self {
            default,
            alternates: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, index: &str, token: Option<String>) {
        self.alternates.insert(
            name.to_string(),
            RegistrySource::new(Some(name.to_string()), index, token),
        );
    }

    pub fn default_source(&self) -> &RegistrySource {
        &self.default
    }

    pub fn source_for(&self, registry: Option<&str>) -> Result<&RegistrySource, RegistryError> {
        match registry {
            None | Some("crates-io") => Ok(&self.default),
            Some(name) => self
                .alternates
                .get(name)
                .ok_or_else(|| RegistryError::UnknownRegistry(name.to_string())),
        }
    }
}

/// Sends default-registry lookups to a local git mirror when one is
/// configured, and everything else to the sparse index.
pub struct IndexRouter {
    sparse: SparseIndex,
    local: Option<LocalGitIndex>,
}

impl IndexRouter {
    pub fn new(sparse: SparseIndex, local: Option<LocalGitIndex>) -> Self {
        Self { sparse, local }
    }
}

#[async_trait]
impl RegistryLookup for IndexRouter {
    async fn get_versions(
        &self,
        name: &str,
        source: &RegistrySource,
    ) -> Result<CrateMetadata, RegistryError> {
        match &self.local {
            Some(local) if source.is_default() => local.get_versions(name, source).await,
            _ => self.sparse.get_versions(name, source).await,
        }
    }
}
