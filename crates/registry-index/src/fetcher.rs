use std::collections::HashMap;

use futures::future::join_all;
use toml_parser::Dependency;
use tracing::{debug, info};
use version_resolver::Version;

use crate::error::RegistryError;
use crate::lookup::{Registries, RegistryLookup};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FetchState {
    /// Lookup still in flight
    #[default]
    Pending,
    Resolved {
        /// Latest first
        versions: Vec<String>,
        features: HashMap<String, Vec<String>>,
    },
    /// `"<crate>: <error>"`
    Failed(String),
}

/// A dependency together with what the registry said about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub dependency: Dependency,
    pub state: FetchState,
}

impl ResolvedDependency {
    pub fn pending(dependency: Dependency) -> Self {
        Self {
            dependency,
            state: FetchState::Pending,
        }
    }

    pub fn versions(&self) -> &[String] {
        match &self.state {
            FetchState::Resolved { versions, .. } => versions,
            _ => &[],
        }
    }

    pub fn latest(&self) -> Option<&str> {
        self.versions().first().map(String::as_str)
    }

    pub fn features_of(&self, version: &str) -> &[String] {
        match &self.state {
            FetchState::Resolved { features, .. } => {
                features.get(version).map(Vec::as_slice).unwrap_or_default()
            }
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            FetchState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, FetchState::Pending)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub list_prereleases: bool,
}

/// Look every dependency up concurrently. One result per input, in input
/// order; a failed lookup never affects its siblings.
pub async fn fetch_versions<L>(
    lookup: &L,
    registries: &Registries,
    deps: Vec<Dependency>,
    options: FetchOptions,
) -> Vec<ResolvedDependency>
where
    L: RegistryLookup + ?Sized,
{
    info!("fetching versions for {} dependencies", deps.len());
    let lookups = deps.into_iter().map(|dependency| async move {
        let state = match fetch_one(lookup, registries, &dependency, options).await {
            Ok(state) => state,
            Err(e) => {
                debug!("lookup failed for '{}': {}", dependency.name, e);
                FetchState::Failed(format!("{}: {}", dependency.name, e))
            }
        };
        ResolvedDependency { dependency, state }
    });
    join_all(lookups).await
}

async fn fetch_one<L>(
    lookup: &L,
    registries: &Registries,
    dependency: &Dependency,
    options: FetchOptions,
) -> Result<FetchState, RegistryError>
where
    L: RegistryLookup + ?Sized,
{
    let source = registries.source_for(dependency.registry.as_deref())?;
    let metadata = lookup.get_versions(&dependency.name, source).await?;

    let versions: Vec<String> = metadata
        .versions
        .iter()
        .filter(|v| options.list_prereleases || !is_prerelease(v))
        .cloned()
        .collect();
    if versions.is_empty() {
        return Err(RegistryError::NoVersions);
    }

    let features = versions
        .iter()
        .map(|v| (v.clone(), metadata.features_of(v).to_vec()))
        .collect();
    Ok(FetchState::Resolved { versions, features })
}

fn is_prerelease(version: &str) -> bool {
    Version::parse(version).map_or(version.contains('-'), |v| v.is_prerelease())
}

/// Names of the dependencies whose lookup failed, for status reporting.
pub fn failed_crates(resolved: &[ResolvedDependency]) -> Vec<&str> {
    resolved
        .iter()
        .filter(|r| r.error().is_some())
        .map(|r| r.dependency.name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Barrier;
    use toml_parser::{filter_crates, parse};

    use super::*;
    use crate::index::CrateMetadata;
    use crate::lookup::RegistrySource;

    /// In-memory registry.
    struct MemoryRegistry {
        crates: HashMap<String, Vec<&'static str>>,
    }

    impl MemoryRegistry {
        fn new(crates: Vec<(&str, Vec<&'static str>)>) -> Self {
            Self {
                crates: crates
                    .into_iter()
                    .map(|(name, versions)| (name.to_string(), versions))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl RegistryLookup for MemoryRegistry {
        async fn get_versions(
            &self,
            name: &str,
            source: &RegistrySource,
        ) -> Result<CrateMetadata, RegistryError> {
            let versions = self.crates.get(name).ok_or(RegistryError::Status(404))?;
            let features = versions
                .iter()
                .map(|v| (v.to_string(), vec![format!("{}-feature", source.index)]))
                .collect();
            Ok(CrateMetadata {
                name: name.to_string(),
                versions: versions.iter().map(|v| v.to_string()).collect(),
                features,
            })
        }
    }

    /// Holds every lookup until `gate` has seen all of them.
    struct GatedRegistry {
        inner: MemoryRegistry,
        gate: Barrier,
    }

    #[async_trait]
    impl RegistryLookup for GatedRegistry {
        async fn get_versions(
            &self,
            name: &str,
            source: &RegistrySource,
        ) -> Result<CrateMetadata, RegistryError> {
            self.gate.wait().await;
            self.inner.get_versions(name, source).await
        }
    }

    fn deps(toml: &str) -> Vec<Dependency> {
        filter_crates(parse(toml).tables())
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let registry = MemoryRegistry::new(vec![("serde", vec!["1.0.5", "1.0.4"])]);
        let resolved = fetch_versions(
            &registry,
            &Registries::default(),
            deps("[dependencies]\nserde = \"1.0\"\n"),
            FetchOptions::default(),
        )
        .await;

        assert_eq!(resolved.len(), 1);
        let serde = &resolved[0];
        assert_eq!(serde.dependency.name, "serde");
        assert_eq!(serde.versions(), ["1.0.5", "1.0.4"]);

        let resolution = version_resolver::resolve(&serde.dependency.version, serde.versions());
        assert_eq!(resolution.max_satisfying.as_deref(), Some("1.0.5"));
        assert_eq!(
            resolution.classification,
            version_resolver::Classification::UpToDate
        );
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let registry = MemoryRegistry::new(vec![
            ("anyhow", vec!["2.0.0"]),
            ("log", vec!["0.4.22"]),
        ]);
        let toml = r#"[dependencies]
anyhow = "2"
missing = "1"
log = "0.4"
private = { version = "1", registry = "nowhere" }
"#;
        let resolved = fetch_versions(
            &registry,
            &Registries::default(),
            deps(toml),
            FetchOptions::default(),
        )
        .await;

        let names: Vec<_> = resolved.iter().map(|r| r.dependency.name.as_str()).collect();
        assert_eq!(names, vec!["anyhow", "missing", "log", "private"]);
        assert_eq!(resolved[0].latest(), Some("2.0.0"));
        assert_eq!(resolved[1].error(), Some("missing: statusCode=404"));
        assert_eq!(resolved[2].latest(), Some("0.4.22"));
        assert_eq!(
            resolved[3].error(),
            Some("private: unknown registry `nowhere`")
        );
        assert_eq!(failed_crates(&resolved), vec!["missing", "private"]);
    }

    #[tokio::test]
    async fn test_lookups_run_concurrently() {
        let names = ["serde", "log", "rand", "tokio"];
        let registry = GatedRegistry {
            inner: MemoryRegistry::new(names.iter().map(|n| (*n, vec!["1.0.0"])).collect()),
            gate: Barrier::new(names.len()),
        };
        let toml: String = names
            .iter()
            .fold("[dependencies]\n".to_string(), |acc, n| acc + &format!("{n} = \"1\"\n"));

        // a lookup awaited before the next starts never gets past the gate
        let resolved = tokio::time::timeout(
            Duration::from_secs(5),
            fetch_versions(
                &registry,
                &Registries::default(),
                deps(&toml),
                FetchOptions::default(),
            ),
        )
        .await
        .expect("lookups were serialized");

        assert_eq!(resolved.len(), names.len());
        assert!(resolved.iter().all(|r| r.latest() == Some("1.0.0")));
    }

    #[tokio::test]
    async fn test_prerelease_filtering() {
        let registry = MemoryRegistry::new(vec![
            ("tokio", vec!["2.0.0-alpha.1", "1.38.0"]),
            ("nightly", vec!["0.1.0-rc.1"]),
        ]);
        let manifest = deps("[dependencies]\ntokio = \"1\"\nnightly = \"0.1.0-rc.1\"\n");

        let resolved = fetch_versions(
            &registry,
            &Registries::default(),
            manifest.clone(),
            FetchOptions::default(),
        )
        .await;
        assert_eq!(resolved[0].versions(), ["1.38.0"]);
        assert!(resolved[0].features_of("2.0.0-alpha.1").is_empty());
        assert_eq!(resolved[1].error(), Some("nightly: no versions found"));

        let resolved = fetch_versions(
            &registry,
            &Registries::default(),
            manifest,
            FetchOptions {
                list_prereleases: true,
            },
        )
        .await;
        assert_eq!(resolved[0].versions(), ["2.0.0-alpha.1", "1.38.0"]);
        assert_eq!(resolved[1].latest(), Some("0.1.0-rc.1"));
    }

    #[tokio::test]
    async fn test_duplicates_stay_separate() {
        let registry = MemoryRegistry::new(vec![("log", vec!["0.4.22"])]);
        let toml = "[dependencies]\nlog = \"0.4\"\n\n[target.'cfg(unix)'.dependencies]\nlog = \"0.3\"\n";
        let resolved = fetch_versions(
            &registry,
            &Registries::default(),
            deps(toml),
            FetchOptions::default(),
        )
        .await;
        assert_eq!(resolved.len(), 2);
        assert_ne!(resolved[0].dependency.span, resolved[1].dependency.span);
        assert_eq!(resolved[1].dependency.version, "0.3");
    }

    #[tokio::test]
    async fn test_alternate_registry_source() {
        let registry = MemoryRegistry::new(vec![("internal", vec!["3.1.0"])]);
        let mut registries = Registries::default();
        registries.insert("corp", "sparse+https://corp.example.com/index/", None);
        let resolved = fetch_versions(
            &registry,
            &registries,
            deps("[dependencies]\ninternal = { version = \"3\", registry = \"corp\" }\n"),
            FetchOptions::default(),
        )
        .await;
        assert_eq!(
            resolved[0].features_of("3.1.0"),
            ["https://corp.example.com/index/-feature"]
        );
    }
}
