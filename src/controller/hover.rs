use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use registry_index::{FetchState, ResolvedDependency};
use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position, Uri};
use version_resolver::check_version;

use crate::{
    entity::{Replacement, REPLACE_VERSION},
    usecase::Document,
};

/// What the hover over a dependency shows, independent of LSP types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoverModel {
    Versions {
        name: String,
        /// crates.io and docs.rs only know the default registry
        links: bool,
        entries: Vec<VersionEntry>,
    },
    Errors(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub version: String,
    pub max_satisfying: bool,
    pub docs: bool,
    pub replacement: Replacement,
}

impl HoverModel {
    pub fn new(resolved: &ResolvedDependency) -> Option<Self> {
        let dep = &resolved.dependency;
        match &resolved.state {
            FetchState::Pending => None,
            FetchState::Failed(e) => Some(HoverModel::Errors(
                e.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            FetchState::Resolved { versions, .. } => {
                let links = dep.registry.is_none();
                // an unparsable requirement still lists the versions
                let max_satisfying = check_version(&dep.version, versions)
                    .ok()
                    .and_then(|(_, max)| max);
                let entries = versions
                    .iter()
                    .enumerate()
                    .map(|(i, version)| {
                        let is_max = max_satisfying.as_deref() == Some(version.as_str());
                        VersionEntry {
                            version: version.clone(),
                            max_satisfying: is_max,
                            docs: links && (i == 0 || is_max),
                            replacement: Replacement::new(dep, version),
                        }
                    })
                    .collect();
                Some(HoverModel::Versions {
                    name: dep.name.clone(),
                    links,
                    entries,
                })
            }
        }
    }

    pub fn markdown(&self, uri: &Uri) -> String {
        match self {
            HoverModel::Errors(lines) => {
                let mut s = String::from("#### Errors\n");
                for line in lines {
                    s.push_str(&format!("* {}\n", line));
                }
                s
            }
            HoverModel::Versions {
                name,
                links,
                entries,
            } => {
                let mut s = String::from("#### Versions");
                if *links {
                    s.push_str(&format!(
                        " _( [View Crate](https://crates.io/crates/{name}) | [Docs](https://docs.rs/crate/{name}) )_"
                    ));
                }
                for entry in entries {
                    let mut line = format!(
                        "[{}]({})",
                        entry.version,
                        replace_command_uri(uri, &entry.replacement)
                    );
                    if entry.docs {
                        line.push_str(&format!(
                            "[(docs)](https://docs.rs/crate/{}/{})",
                            name, entry.version
                        ));
                    }
                    if entry.max_satisfying {
                        line = format!("**{}**", line);
                    }
                    s.push_str("\n * ");
                    s.push_str(&line);
                }
                s
            }
        }
    }
}

/// `command:` link running the replace command with `[uri, replacement]`.
pub fn replace_command_uri(uri: &Uri, replacement: &Replacement) -> String {
    let args = serde_json::json!([uri.as_str(), replacement]);
    format!(
        "command:{}?{}",
        REPLACE_VERSION,
        utf8_percent_encode(&args.to_string(), NON_ALPHANUMERIC)
    )
}

pub fn hover(doc: &Document, position: Position) -> Option<Hover> {
    let resolved = doc.dependency_at(position)?;
    let model = HoverModel::new(resolved)?;
    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: model.markdown(&doc.uri),
        }),
        range: Some(doc.index().range(resolved.dependency.span)),
    })
}
