use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use registry_index::FetchOptions;
use serde::Deserialize;
use tracing::debug;

use crate::decoration::{CompiledFormatter, DecorationFormatter};

#[derive(Default, Debug, Clone)]
pub struct Config {
    pub decoration_formatter: CompiledFormatter,
    pub index_server_url: Option<String>,
    pub local_index: Option<LocalIndexConfig>,
    pub list_pre_releases: bool,
    pub registries: HashMap<String, RegistryConfig>,
}

impl Config {
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            list_prereleases: self.list_pre_releases,
        }
    }
}

/// Which local git mirror to read instead of the sparse index.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct LocalIndexConfig {
    pub hash: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    pub index: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Default, Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    #[serde(default)]
    pub decoration_formatter: DecorationFormatter,
    #[serde(default)]
    pub index_server_url: Option<String>,
    #[serde(default)]
    pub use_local_index: bool,
    #[serde(default)]
    pub local_index_hash: Option<String>,
    #[serde(default)]
    pub local_index_branch: Option<String>,
    #[serde(default)]
    pub list_pre_releases: bool,
    #[serde(default)]
    pub registries: HashMap<String, RegistryConfig>,
}

impl UserConfig {
    pub fn compile(self) -> Config {
        let local_index = self.use_local_index.then(|| LocalIndexConfig {
            hash: self.local_index_hash,
            branch: self.local_index_branch,
        });
        Config {
            decoration_formatter: self.decoration_formatter.compile(),
            index_server_url: self.index_server_url.filter(|url| !url.trim().is_empty()),
            local_index,
            list_pre_releases: self.list_pre_releases,
            registries: self.registries,
        }
    }
}

pub static GLOBAL_CONFIG: Lazy<RwLock<Config>> = Lazy::new(|| RwLock::new(Config::default()));

pub fn initialize_config(config: UserConfig) {
    let mut global_config = GLOBAL_CONFIG.write();
    *global_config = config.compile();
    debug!("config {:?}", global_config);
}
