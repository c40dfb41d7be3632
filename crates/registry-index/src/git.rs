use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::RegistryError;
use crate::index::{index_path, parse_index_lines, CrateMetadata};
use crate::lookup::{RegistryLookup, RegistrySource};

pub const DEFAULT_INDEX_HASH: &str = "github.com-1ecc6299db9ec823";
pub const DEFAULT_BRANCH: &str = "origin/HEAD";

/// Reads index files straight out of the git mirror cargo keeps under
/// `$CARGO_HOME/registry/index/<hash>/.git`. The mirror is not updated here.
#[derive(Debug, Clone)]
pub struct LocalGitIndex {
    git_dir: PathBuf,
    branch: String,
}

impl LocalGitIndex {
    pub fn new(cargo_home: &Path, hash: Option<&str>, branch: Option<&str>) -> Self {
        let git_dir = cargo_home
            .join("registry")
            .join("index")
            .join(hash.unwrap_or(DEFAULT_INDEX_HASH))
            .join(".git");
        Self {
            git_dir,
            branch: branch.unwrap_or(DEFAULT_BRANCH).to_string(),
        }
    }

    /// Open the configured mirror, falling back to the default hash when the
    /// configured one does not exist. `None` if neither exists.
    pub fn discover(cargo_home: &Path, hash: Option<&str>, branch: Option<&str>) -> Option<Self> {
        let index = Self::new(cargo_home, hash, branch);
        if index.is_available() {
            return Some(index);
        }
        error!(
            "local cargo index {} is not available",
            index.git_dir.display()
        );
        if hash.is_some_and(|h| h != DEFAULT_INDEX_HASH) {
            let fallback = Self::new(cargo_home, None, branch);
            if fallback.is_available() {
                return Some(fallback);
            }
        }
        None
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn is_available(&self) -> bool {
        self.git_dir.exists()
    }
}

#[async_trait]
impl RegistryLookup for LocalGitIndex {
    async fn get_versions(
        &self,
        name: &str,
        _source: &RegistrySource,
    ) -> Result<CrateMetadata, RegistryError> {
        let object = format!("{}:{}", self.branch, index_path(name));
        debug!("git show {} in {}", object, self.git_dir.display());

        let output = tokio::process::Command::new("git")
            .arg("--no-pager")
            .arg(format!("--git-dir={}", self.git_dir.display()))
            .arg("show")
            .arg(&object)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RegistryError::Git(stderr));
        }

        parse_index_lines(name, &String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let index = LocalGitIndex::new(Path::new("/home/me/.cargo"), None, None);
        assert_eq!(
            index.git_dir(),
            Path::new("/home/me/.cargo/registry/index/github.com-1ecc6299db9ec823/.git")
        );
        assert_eq!(index.branch, "origin/HEAD");

        let index = LocalGitIndex::new(Path::new("/c"), Some("mirror-1"), Some("origin/master"));
        assert_eq!(index.git_dir(), Path::new("/c/registry/index/mirror-1/.git"));
        assert_eq!(index.branch, "origin/master");
    }

    #[test]
    fn test_discover() {
        let home = tempfile::tempdir().unwrap();
        assert!(LocalGitIndex::discover(home.path(), None, None).is_none());

        let default_git = home
            .path()
            .join("registry/index")
            .join(DEFAULT_INDEX_HASH)
            .join(".git");
        std::fs::create_dir_all(&default_git).unwrap();

        let index = LocalGitIndex::discover(home.path(), Some("missing-hash"), None).unwrap();
        assert_eq!(index.git_dir(), default_git);
    }

    #[tokio::test]
    async fn test_missing_mirror_is_an_error() {
        let home = tempfile::tempdir().unwrap();
        let index = LocalGitIndex::new(home.path(), None, None);
        let result = index.get_versions("serde", &RegistrySource::crates_io()).await;
        // either git is missing (Io) or it rejects the git dir (Git)
        assert!(matches!(
            result,
            Err(RegistryError::Git(_)) | Err(RegistryError::Io(_))
        ));
    }
}
