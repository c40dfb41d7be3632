use registry_index::{FetchState, ResolvedDependency};
use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::{Position, Uri};
use version_resolver::{resolve, Classification};

pub mod inlay_hint;

#[derive(Debug, Clone)]
pub enum DecorationEvent {
    Reset(Uri),
    /// Replace every decoration of a document
    Update(Uri, Vec<DecorationItem>),
}

/// One annotation, rendered after the end of a dependency's line.
#[derive(Debug, Clone)]
pub struct DecorationItem {
    pub position: Position,
    pub dependency: ResolvedDependency,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VersionDecorationKind {
    #[default]
    Loading,
    //latest satisfies the requirement
    UpToDate,
    //something satisfies, but not the latest
    Outdated,
    //nothing satisfies
    Incompatible,
    Error,
}

#[derive(Debug, Default, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DecorationPayload {
    pub kind: VersionDecorationKind,
    pub current: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_satisfying: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `None` for the `"?"` placeholder, which gets a quick fix rather than a
/// decoration.
pub fn formatted_string(
    dep: &ResolvedDependency,
    formatter: &CompiledFormatter,
) -> Option<(VersionDecorationKind, String)> {
    if dep.dependency.is_placeholder() {
        return None;
    }
    let payload = version_decoration(dep);
    let template = match payload.kind {
        VersionDecorationKind::Loading => &formatter.loading,
        VersionDecorationKind::UpToDate => &formatter.up_to_date,
        VersionDecorationKind::Outdated => &formatter.outdated,
        VersionDecorationKind::Incompatible => &formatter.incompatible,
        VersionDecorationKind::Error => &formatter.error,
    };
    let text = template.format(&payload);
    if text.is_empty() {
        return None;
    }
    Some((payload.kind, text))
}

pub fn version_decoration(dep: &ResolvedDependency) -> DecorationPayload {
    let current = dep.dependency.version.clone();
    match &dep.state {
        FetchState::Pending => DecorationPayload {
            kind: VersionDecorationKind::Loading,
            current,
            ..Default::default()
        },
        FetchState::Failed(e) => DecorationPayload {
            kind: VersionDecorationKind::Error,
            current,
            error: Some(e.clone()),
            ..Default::default()
        },
        FetchState::Resolved { versions, .. } => {
            let resolution = resolve(&current, versions);
            let kind = match resolution.classification {
                Classification::UpToDate => VersionDecorationKind::UpToDate,
                Classification::Outdated => VersionDecorationKind::Outdated,
                Classification::Incompatible => VersionDecorationKind::Incompatible,
                Classification::Error => VersionDecorationKind::Error,
            };
            DecorationPayload {
                kind,
                current,
                latest: resolution.latest,
                max_satisfying: resolution.max_satisfying,
                error: resolution
                    .error
                    .map(|e| format!("{}: {}", dep.dependency.name, e)),
            }
        }
    }
}

/// decoration formatter
/// the formatter has 5 fields:
/// up_to_date: the latest version satisfies the requirement
/// outdated: a newer version satisfies the requirement, but not the latest one
/// incompatible: no published version satisfies the requirement
/// error: the lookup failed or the requirement can't be parsed
/// loading: the versions are being fetched
///
/// each field's value may use 4 template strings:
/// - current: the requirement as written
/// - latest: the latest published version
/// - max_satisfying: the highest version the requirement accepts
/// - error: the error message
///
/// an empty template hides the decoration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DecorationFormatter {
    #[serde(default = "default_up_to_date")]
    pub up_to_date: String,
    #[serde(default = "default_outdated")]
    pub outdated: String,
    #[serde(default = "default_incompatible")]
    pub incompatible: String,
    #[serde(default = "default_error")]
    pub error: String,
    #[serde(default = "default_loading")]
    pub loading: String,
}

impl DecorationFormatter {
    pub fn compile(&self) -> CompiledFormatter {
        CompiledFormatter {
            up_to_date: CompiledTemplate::new(self.up_to_date.clone()),
            outdated: CompiledTemplate::new(self.outdated.clone()),
            incompatible: CompiledTemplate::new(self.incompatible.clone()),
            error: CompiledTemplate::new(self.error.clone()),
            loading: CompiledTemplate::new(self.loading.clone()),
        }
    }
}

impl Default for DecorationFormatter {
    fn default() -> Self {
        Self {
            up_to_date: default_up_to_date(),
            outdated: default_outdated(),
            incompatible: default_incompatible(),
            error: default_error(),
            loading: default_loading(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledFormatter {
    up_to_date: CompiledTemplate,
    outdated: CompiledTemplate,
    incompatible: CompiledTemplate,
    error: CompiledTemplate,
    loading: CompiledTemplate,
}

impl Default for CompiledFormatter {
    fn default() -> Self {
        DecorationFormatter::default().compile()
    }
}

#[derive(Debug, Clone, Default)]
struct CompiledTemplate {
    template: String,
    needs_current: bool,
    needs_latest: bool,
    needs_max_satisfying: bool,
    needs_error: bool,
}

impl CompiledTemplate {
    fn new(template: String) -> Self {
        Self {
            needs_current: template.contains("{{current}}"),
            needs_latest: template.contains("{{latest}}"),
            needs_max_satisfying: template.contains("{{max_satisfying}}"),
            needs_error: template.contains("{{error}}"),
            template,
        }
    }

    fn format(&self, payload: &DecorationPayload) -> String {
        let mut result = self.template.clone();

        if self.needs_current {
            result = result.replace("{{current}}", &payload.current);
        }
        if let (true, Some(latest)) = (self.needs_latest, &payload.latest) {
            result = result.replace("{{latest}}", latest);
        }
        if let (true, Some(max)) = (self.needs_max_satisfying, &payload.max_satisfying) {
            result = result.replace("{{max_satisfying}}", max);
        }
        if let (true, Some(error)) = (self.needs_error, &payload.error) {
            // inlay hints are single line
            let first = error.lines().next().unwrap_or_default();
            result = result.replace("{{error}}", first);
        }

        result
    }
}

fn default_up_to_date() -> String {
    "✅".to_string()
}

fn default_outdated() -> String {
    "🚀 {{max_satisfying}}, {{latest}}".to_string()
}

fn default_incompatible() -> String {
    "❌ {{latest}}".to_string()
}

fn default_error() -> String {
    "❗ {{error}}".to_string()
}

fn default_loading() -> String {
    "Loading...".to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use toml_parser::{filter_crates, parse};

    use super::*;

    fn resolved(toml: &str, state: FetchState) -> ResolvedDependency {
        let dependency = filter_crates(parse(toml).tables()).remove(0);
        ResolvedDependency { dependency, state }
    }

    fn versions(v: &[&str]) -> FetchState {
        FetchState::Resolved {
            versions: v.iter().map(|s| s.to_string()).collect(),
            features: HashMap::new(),
        }
    }

    #[test]
    fn test_version_decoration() {
        let formatter = DecorationFormatter::default().compile();

        let dep = resolved("[dependencies]\nserde = \"1.0\"\n", versions(&["1.0.5", "1.0.4"]));
        assert_eq!(
            formatted_string(&dep, &formatter),
            Some((VersionDecorationKind::UpToDate, "✅".to_string()))
        );

        let dep = resolved(
            "[dependencies]\nserde = \"=1.0.4\"\n",
            versions(&["2.0.0", "1.0.4"]),
        );
        assert_eq!(
            formatted_string(&dep, &formatter),
            Some((VersionDecorationKind::Outdated, "🚀 1.0.4, 2.0.0".to_string()))
        );

        let dep = resolved("[dependencies]\nserde = \"3\"\n", versions(&["2.0.0"]));
        assert_eq!(
            formatted_string(&dep, &formatter),
            Some((VersionDecorationKind::Incompatible, "❌ 2.0.0".to_string()))
        );
    }

    #[test]
    fn test_error_and_loading() {
        let formatter = DecorationFormatter::default().compile();

        let dep = resolved(
            "[dependencies]\nserde = \"1\"\n",
            FetchState::Failed("serde: statusCode=404".to_string()),
        );
        assert_eq!(
            formatted_string(&dep, &formatter),
            Some((
                VersionDecorationKind::Error,
                "❗ serde: statusCode=404".to_string()
            ))
        );

        let dep = resolved("[dependencies]\nserde = \"1\"\n", FetchState::Pending);
        assert_eq!(
            formatted_string(&dep, &formatter),
            Some((VersionDecorationKind::Loading, "Loading...".to_string()))
        );

        let dep = resolved("[dependencies]\nserde = \"not a version\"\n", versions(&["1.0.0"]));
        let payload = version_decoration(&dep);
        assert_eq!(payload.kind, VersionDecorationKind::Error);
        assert!(payload.error.unwrap().starts_with("serde: "));
    }

    #[test]
    fn test_placeholder_and_empty_template() {
        let formatter = DecorationFormatter::default().compile();
        let dep = resolved("[dependencies]\nserde = \"?\"\n", versions(&["1.0.0"]));
        assert_eq!(formatted_string(&dep, &formatter), None);

        let formatter = DecorationFormatter {
            up_to_date: String::new(),
            ..Default::default()
        }
        .compile();
        let dep = resolved("[dependencies]\nserde = \"1\"\n", versions(&["1.0.0"]));
        assert_eq!(formatted_string(&dep, &formatter), None);
    }

    #[test]
    fn test_current_placeholder() {
        let formatter = DecorationFormatter {
            outdated: "{{current}} -> {{latest}}".to_string(),
            ..Default::default()
        }
        .compile();
        let dep = resolved("[dependencies]\nlog = \"~0.3\"\n", versions(&["0.4.0", "0.3.9"]));
        assert_eq!(
            formatted_string(&dep, &formatter).map(|(_, s)| s),
            Some("~0.3 -> 0.4.0".to_string())
        );
    }
}
