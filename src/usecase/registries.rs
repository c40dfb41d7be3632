use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use registry_index::{
    CachedLookup, IndexRouter, LocalGitIndex, Registries, RegistryLookup, RegistrySource,
    SparseIndex,
};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::Config;

/// `$CARGO_HOME`, or `~/.cargo`
pub fn cargo_home() -> Option<PathBuf> {
    match std::env::var_os("CARGO_HOME") {
        Some(home) if !home.is_empty() => Some(PathBuf::from(home)),
        _ => dirs::home_dir().map(|home| home.join(".cargo")),
    }
}

#[derive(Debug, Default, Deserialize)]
struct CargoRegistriesFile {
    #[serde(default)]
    registries: HashMap<String, CargoRegistryEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct CargoRegistryEntry {
    index: Option<String>,
    token: Option<String>,
}

/// An alternate registry as cargo knows it
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiscoveredRegistry {
    pub index: Option<String>,
    pub token: Option<String>,
}

/// Read `[registries.<name>]` from cargo's `config.toml` (index) and
/// `credentials.toml` (token). The extension-less legacy names are used when
/// the `.toml` file is missing.
pub fn discover_registries(cargo_home: &Path) -> anyhow::Result<HashMap<String, DiscoveredRegistry>> {
    let mut found: HashMap<String, DiscoveredRegistry> = HashMap::new();

    if let Some(config) = read_registries_file(cargo_home, "config")? {
        for (name, entry) in config.registries {
            found.entry(name).or_default().index = entry.index;
        }
    }
    if let Some(credentials) = read_registries_file(cargo_home, "credentials")? {
        for (name, entry) in credentials.registries {
            found.entry(name).or_default().token = entry.token;
        }
    }
    Ok(found)
}

fn read_registries_file(cargo_home: &Path, stem: &str) -> anyhow::Result<Option<CargoRegistriesFile>> {
    let candidates = [
        cargo_home.join(format!("{}.toml", stem)),
        cargo_home.join(stem),
    ];
    let Some(path) = candidates.iter().find(|p| p.is_file()) else {
        return Ok(None);
    };
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    debug!("read registries from {}", path.display());
    Ok(Some(file))
}

/// The default registry plus every alternate registry from cargo's files and
/// the user configuration. Configured entries win.
pub fn build_registries(config: &Config, cargo_home: Option<&Path>) -> Registries {
    let default = match &config.index_server_url {
        Some(url) => RegistrySource::new(None, url, None),
        None => RegistrySource::crates_io(),
    };
    let mut registries = Registries::new(default);

    if let Some(home) = cargo_home {
        match discover_registries(home) {
            Ok(found) => {
                for (name, entry) in found {
                    let Some(index) = entry.index else {
                        debug!("registry '{}' has a token but no index", name);
                        continue;
                    };
                    registries.insert(&name, &index, entry.token);
                }
            }
            Err(e) => error!("{:#}", e),
        }
    }

    for (name, entry) in &config.registries {
        registries.insert(name, &entry.index, entry.token.clone());
    }
    registries
}

/// The lookup stack for a configuration: sparse index, optionally a local
/// git mirror for the default registry, behind a read-through cache.
pub fn build_lookup(
    config: &Config,
    http_client: reqwest::Client,
    cargo_home: Option<&Path>,
) -> Arc<dyn RegistryLookup> {
    let local = match (&config.local_index, cargo_home) {
        (Some(local), Some(home)) => {
            let index = LocalGitIndex::discover(home, local.hash.as_deref(), local.branch.as_deref());
            match &index {
                Some(index) => info!("using local cargo index {}", index.git_dir().display()),
                None => error!("local cargo index is not available, run `cargo fetch` to download it"),
            }
            index
        }
        _ => None,
    };
    let router = IndexRouter::new(SparseIndex::new(http_client), local);
    Arc::new(CachedLookup::new(router))
}
