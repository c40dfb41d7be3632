use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, error};
use url::Url;

use crate::error::RegistryError;
use crate::index::{index_path, parse_index_lines, CrateMetadata};
use crate::lookup::{RegistryLookup, RegistrySource};

/// HTTP transport for the sparse index protocol.
#[derive(Debug, Clone)]
pub struct SparseIndex {
    client: reqwest::Client,
}

impl SparseIndex {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Join an index base with a crate's sharded path. The base is treated as a
/// directory whether or not it ends with `/`.
pub fn crate_url(index: &str, name: &str) -> Result<Url, RegistryError> {
    let base = format!("{}/", index.trim_end_matches('/'));
    Ok(Url::parse(&base)?.join(&index_path(name))?)
}

#[async_trait]
impl RegistryLookup for SparseIndex {
    async fn get_versions(
        &self,
        name: &str,
        source: &RegistrySource,
    ) -> Result<CrateMetadata, RegistryError> {
        let url = crate_url(&source.index, name)?;
        debug!("fetching '{}' from {}", name, url);

        let mut request = self.client.get(url);
        if let Some(token) = &source.token {
            request = request.header(AUTHORIZATION, token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            error!("{} returned {} for '{}'", source.index, status, name);
            return Err(RegistryError::Status(status.as_u16()));
        }

        let text = resp.text().await?;
        parse_index_lines(name, &text)
    }
}
