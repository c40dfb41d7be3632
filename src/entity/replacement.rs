use std::collections::HashMap;

use registry_index::ResolvedDependency;
use serde::{Deserialize, Serialize};
use toml_parser::{Dependency, LineIndex, Span};
use tower_lsp::lsp_types::{TextEdit, Uri, WorkspaceEdit};

/// A pending rewrite of one version literal. `start..end` covers the inside
/// of the quotes, so the original delimiters survive the edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replacement {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub version: String,
}

impl Replacement {
    pub fn new(dependency: &Dependency, version: &str) -> Self {
        let inner = dependency.span.inner();
        Self {
            name: dependency.name.clone(),
            start: inner.start,
            end: inner.end,
            version: version.to_string(),
        }
    }

    /// Update to the latest version, unless the literal already says so.
    pub fn to_latest(resolved: &ResolvedDependency) -> Option<Self> {
        let latest = resolved.latest()?;
        if resolved.dependency.version == latest {
            return None;
        }
        Some(Self::new(&resolved.dependency, latest))
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// The span still sits between two matching quotes of `text`. A document
    /// edited since the replacement was computed usually fails this.
    pub fn applies_to(&self, text: &str) -> bool {
        if self.start == 0 || self.start > self.end || self.end >= text.len() {
            return false;
        }
        let bytes = text.as_bytes();
        let open = bytes[self.start - 1];
        (open == b'"' || open == b'\'') && bytes[self.end] == open
    }

    pub fn text_edit(&self, index: &LineIndex) -> TextEdit {
        TextEdit {
            range: index.range(self.span()),
            new_text: self.version.clone(),
        }
    }
}

/// Every dependency whose literal differs from its latest version, in
/// document order.
pub fn pending_replacements(resolved: &[ResolvedDependency]) -> Vec<Replacement> {
    resolved.iter().filter_map(Replacement::to_latest).collect()
}

pub fn workspace_edit(uri: &Uri, index: &LineIndex, replacements: &[Replacement]) -> WorkspaceEdit {
    let edits = replacements.iter().map(|r| r.text_edit(index)).collect();
    WorkspaceEdit {
        changes: Some(HashMap::from([(uri.clone(), edits)])),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use registry_index::FetchState;
    use toml_parser::{filter_crates, parse};

    use super::*;

    const TOML: &str = "[dependencies]\nserde = \"1.0\"\nlog = '0.4.22'\nrand = \"?\"\n";

    fn resolved() -> Vec<ResolvedDependency> {
        filter_crates(parse(TOML).tables())
            .into_iter()
            .map(|dependency| {
                let latest = match dependency.name.as_str() {
                    "serde" => "1.0.210",
                    _ => "0.4.22",
                };
                ResolvedDependency {
                    dependency,
                    state: FetchState::Resolved {
                        versions: vec![latest.to_string()],
                        features: HashMap::new(),
                    },
                }
            })
            .collect()
    }

    #[test]
    fn test_pending_replacements() {
        let replacements = pending_replacements(&resolved());
        let names: Vec<_> = replacements.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["serde", "rand"]);

        let serde = &replacements[0];
        assert_eq!(&TOML[serde.span().range()], "1.0");
        assert_eq!(serde.version, "1.0.210");
        assert!(serde.applies_to(TOML));
        assert_eq!(&TOML[replacements[1].span().range()], "?");
    }

    #[test]
    fn test_applies_to_edited_text() {
        let replacements = pending_replacements(&resolved());
        let edited = TOML.replace("serde = ", "serde=");
        assert!(!replacements[0].applies_to(&edited));
        assert!(!replacements[1].applies_to("short"));
    }

    #[test]
    fn test_workspace_edit_keeps_quotes() {
        let index = LineIndex::new(TOML);
        let uri: Uri = "file:///work/Cargo.toml".parse().unwrap();
        let replacements = pending_replacements(&resolved());
        let edit = workspace_edit(&uri, &index, &replacements);
        let edits = &edit.changes.unwrap()[&uri];

        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].range.start.line, 1);
        assert_eq!(edits[0].range.start.character, 9);
        assert_eq!(edits[0].range.end.character, 12);
        assert_eq!(edits[0].new_text, "1.0.210");
    }

    #[test]
    fn test_command_argument_shape() {
        let replacement = pending_replacements(&resolved()).remove(0);
        let value = serde_json::to_value(&replacement).unwrap();
        assert_eq!(value["name"], "serde");
        assert_eq!(value["version"], "1.0.210");
        let back: Replacement = serde_json::from_value(value).unwrap();
        assert_eq!(back, replacement);
    }
}
