use std::collections::HashMap;

use registry_index::ResolvedDependency;
use tower_lsp::lsp_types::Uri;

use super::document::Document;

/// Every open Cargo.toml, owned by the appraiser task.
#[derive(Debug, Default)]
pub struct Workspace {
    documents: HashMap<Uri, Document>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, uri: &Uri) -> Option<&Document> {
        self.documents.get(uri)
    }

    /// Parse `text` as the next revision of `uri`, keeping whatever the
    /// previous revision had already fetched. A manifest that can't be parsed
    /// at all drops the document.
    pub fn update(&mut self, uri: &Uri, text: &str) -> anyhow::Result<&Document> {
        let previous = self.documents.remove(uri);
        let mut doc = Document::parse(uri, text)?;
        if let Some(previous) = previous {
            doc.rev = previous.rev + 1;
            doc.carry_over(&previous);
        }
        Ok(self.documents.entry(uri.clone()).or_insert(doc))
    }

    /// Store a fetch result. A result for the current revision replaces
    /// every state; one for an older revision only fills dependencies that
    /// are still pending, since edits do not start a fetch of their own.
    pub fn resolve(
        &mut self,
        uri: &Uri,
        rev: usize,
        resolved: Vec<ResolvedDependency>,
    ) -> Option<&Document> {
        let doc = self.documents.get_mut(uri)?;
        let stored = if doc.rev == rev {
            doc.set_resolved(resolved)
        } else {
            doc.fill_pending(&resolved)
        };
        stored.then_some(&*doc)
    }

    pub fn remove(&mut self, uri: &Uri) -> Option<Document> {
        self.documents.remove(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use registry_index::FetchState;

    use super::*;

    fn uri() -> Uri {
        "file:///work/Cargo.toml".parse().unwrap()
    }

    fn answer(doc: &Document, latest: &str) -> Vec<ResolvedDependency> {
        doc.dependencies()
            .iter()
            .map(|d| ResolvedDependency {
                dependency: d.clone(),
                state: FetchState::Resolved {
                    versions: vec![latest.to_string()],
                    features: HashMap::new(),
                },
            })
            .collect()
    }

    #[test]
    fn test_revisions() {
        let mut ws = Workspace::new();
        let uri = uri();
        assert_eq!(ws.update(&uri, "[dependencies]\nserde = \"1\"\n").unwrap().rev, 0);
        assert_eq!(ws.update(&uri, "[dependencies]\nserde = \"1.0\"\n").unwrap().rev, 1);
        assert_eq!(ws.len(), 1);

        ws.remove(&uri);
        assert!(ws.document(&uri).is_none());
        assert_eq!(ws.update(&uri, "").unwrap().rev, 0);
    }

    #[test]
    fn test_older_result_fills_pending() {
        let mut ws = Workspace::new();
        let uri = uri();
        let opened = ws.update(&uri, "[dependencies]\nserde = \"1\"\n").unwrap();
        let first_fetch = answer(opened, "1.0.1");

        // edited before the fetch landed
        ws.update(&uri, "[dependencies]\nserde = \"1\"\nlog = \"0.4\"\n").unwrap();
        assert!(ws.document(&uri).unwrap().is_pending());

        let doc = ws.resolve(&uri, 0, first_fetch).unwrap();
        assert_eq!(doc.rev, 1);
        assert_eq!(doc.resolved()[0].latest(), Some("1.0.1"));
        assert!(doc.resolved()[1].is_pending());
    }

    #[test]
    fn test_older_result_keeps_newer_states() {
        let mut ws = Workspace::new();
        let uri = uri();
        let first = ws.update(&uri, "[dependencies]\nserde = \"1\"\n").unwrap();
        let stale = answer(first, "1.0.1");

        let second = ws.update(&uri, "[dependencies]\nserde = \"1\"\n").unwrap();
        let fresh = answer(second, "1.0.2");

        let doc = ws.resolve(&uri, 1, fresh).unwrap();
        assert_eq!(doc.resolved()[0].latest(), Some("1.0.2"));

        // nothing pending is left for the late answer to fill
        assert!(ws.resolve(&uri, 0, stale).is_none());
        assert_eq!(
            ws.document(&uri).unwrap().resolved()[0].latest(),
            Some("1.0.2")
        );
    }

    #[test]
    fn test_unknown_document() {
        let mut ws = Workspace::new();
        assert!(ws.resolve(&uri(), 0, Vec::new()).is_none());
    }
}
