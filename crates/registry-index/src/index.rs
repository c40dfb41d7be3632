use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use tracing::debug;
use version_resolver::sort_descending;

use crate::error::RegistryError;

/// Versions and features of one crate as published in an index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateMetadata {
    pub name: String,
    /// Non-yanked versions, latest first
    pub versions: Vec<String>,
    /// Feature names (without `default`, sorted) for every non-yanked version
    pub features: HashMap<String, Vec<String>>,
}

impl CrateMetadata {
    pub fn latest(&self) -> Option<&str> {
        self.versions.first().map(String::as_str)
    }

    pub fn features_of(&self, version: &str) -> &[String] {
        self.features.get(version).map(Vec::as_slice).unwrap_or_default()
    }
}

/// A single version entry from the index
#[derive(Deserialize, Debug)]
struct IndexEntry {
    vers: String,
    #[serde(default)]
    features: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    features2: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    yanked: bool,
}

/// Path of a crate's file inside an index, e.g. `se/rd/serde`.
///
/// Names of one or two characters live under `1/` and `2/`, three character
/// names under `3/<first char>/`, and longer names under
/// `<first two>/<next two>/`.
pub fn index_path(crate_name: &str) -> String {
    let name = crate_name.trim().to_lowercase();
    let name = name
        .strip_prefix('"')
        .and_then(|n| n.strip_suffix('"'))
        .unwrap_or(name.as_str());
    let prefix = |skip: usize, take: usize| name.chars().skip(skip).take(take).collect::<String>();
    match name.chars().count() {
        1 => format!("1/{}", name),
        2 => format!("2/{}", name),
        3 => format!("3/{}/{}", prefix(0, 1), name),
        _ => format!("{}/{}/{}", prefix(0, 2), prefix(2, 2), name),
    }
}

/// Parse the newline-delimited JSON of an index file.
pub fn parse_index_lines(name: &str, text: &str) -> Result<CrateMetadata, RegistryError> {
    let mut versions = Vec::new();
    let mut features = HashMap::new();
    let mut first_error = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let entry = match serde_json::from_str::<IndexEntry>(line) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Failed to parse index line for '{}': {}", name, e);
                first_error.get_or_insert(e);
                continue;
            }
        };
        if entry.yanked {
            continue;
        }
        let mut names: Vec<String> = entry
            .features
            .into_keys()
            .chain(entry.features2.into_keys())
            .filter(|f| f != "default")
            .collect();
        names.sort();
        names.dedup();
        features.insert(entry.vers.clone(), names);
        versions.push(entry.vers);
    }

    if versions.is_empty() {
        if let Some(e) = first_error {
            return Err(RegistryError::Deserialize(e));
        }
    }

    debug!("parsed {} versions for '{}'", versions.len(), name);
    Ok(CrateMetadata {
        name: name.to_string(),
        versions: sort_descending(versions),
        features,
    })
}
