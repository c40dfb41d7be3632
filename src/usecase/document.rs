use std::collections::HashMap;

use anyhow::anyhow;
use registry_index::{FetchState, ResolvedDependency};
use toml_parser::{filter_crates, parse, query, Dependency, LineIndex, ParseError};
use tower_lsp::lsp_types::{Position, Uri};
use tracing::debug;

use crate::{
    decoration::DecorationItem,
    entity::{pending_replacements, Replacement},
};

/// One open Cargo.toml: its text, what the parser made of it and the latest
/// registry answers for its dependencies.
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: Uri,
    pub rev: usize,
    index: LineIndex,
    parse_errors: Vec<ParseError>,
    dependencies: Vec<Dependency>,
    //same order as dependencies, replaced as a whole
    resolved: Vec<ResolvedDependency>,
    replacements: Vec<Replacement>,
}

impl Document {
    pub fn parse(uri: &Uri, text: &str) -> anyhow::Result<Self> {
        let (result, dependencies) = std::panic::catch_unwind(|| {
            let result = parse(text);
            let dependencies = filter_crates(result.tables());
            (result, dependencies)
        })
        .map_err(|_| anyhow!("Cargo.toml is not valid!"))?;

        for e in &result.errors {
            debug!("{}: {} at {:?}", uri.as_str(), e.message, e.span);
        }

        let resolved = dependencies
            .iter()
            .cloned()
            .map(ResolvedDependency::pending)
            .collect();
        Ok(Self {
            uri: uri.clone(),
            rev: 0,
            index: LineIndex::new(text),
            parse_errors: result.errors,
            dependencies,
            resolved,
            replacements: Vec::new(),
        })
    }

    pub fn text(&self) -> &str {
        self.index.text()
    }

    pub fn index(&self) -> &LineIndex {
        &self.index
    }

    pub fn parse_errors(&self) -> &[ParseError] {
        &self.parse_errors
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn resolved(&self) -> &[ResolvedDependency] {
        &self.resolved
    }

    /// Replacements collected by the last completed fetch
    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    pub fn is_pending(&self) -> bool {
        self.resolved.iter().any(ResolvedDependency::is_pending)
    }

    pub fn offset(&self, position: Position) -> Option<usize> {
        self.index.offset(position)
    }

    /// The dependency whose version literal, or failing that name, is under
    /// `position`.
    pub fn dependency_at(&self, position: Position) -> Option<&ResolvedDependency> {
        let offset = self.offset(position)?;
        let dep = query::dependency_at(&self.dependencies, offset)?;
        self.resolved_for(dep)
    }

    //spans are unique, duplicated crate names are not
    fn resolved_for(&self, dep: &Dependency) -> Option<&ResolvedDependency> {
        self.resolved.iter().find(|r| r.dependency.span == dep.span)
    }

    /// Reuse what an older revision already fetched for the same
    /// dependencies, matched by id. Anything new stays pending.
    pub fn carry_over(&mut self, previous: &Document) {
        self.adopt_states(&previous.resolved, false);
    }

    /// Fill dependencies still pending from a fetch started for an older
    /// revision. Returns false if nothing could be taken over.
    pub fn fill_pending(&mut self, resolved: &[ResolvedDependency]) -> bool {
        self.adopt_states(resolved, true)
    }

    //states are matched by id, in order, so duplicated ids pair up one to one
    fn adopt_states(&mut self, source: &[ResolvedDependency], only_pending: bool) -> bool {
        let mut states: HashMap<String, Vec<&FetchState>> = HashMap::new();
        for r in source {
            if !r.is_pending() {
                states.entry(r.dependency.id()).or_default().push(&r.state);
            }
        }
        let mut adopted = false;
        for r in &mut self.resolved {
            if only_pending && !r.is_pending() {
                continue;
            }
            if let Some(found) = states.get_mut(&r.dependency.id()) {
                if !found.is_empty() {
                    r.state = found.remove(0).clone();
                    adopted = true;
                }
            }
        }
        self.replacements = pending_replacements(&self.resolved);
        adopted
    }

    /// Swap in the result of a fetch. Ignored unless it answers the
    /// dependencies of this exact revision.
    pub fn set_resolved(&mut self, resolved: Vec<ResolvedDependency>) -> bool {
        let matches = resolved.len() == self.dependencies.len()
            && resolved
                .iter()
                .zip(&self.dependencies)
                .all(|(r, d)| &r.dependency == d);
        if !matches {
            return false;
        }
        self.replacements = pending_replacements(&resolved);
        self.resolved = resolved;
        true
    }

    /// One decoration per dependency, placed at the end of the line holding
    /// its version literal.
    pub fn decoration_items(&self) -> Vec<DecorationItem> {
        self.resolved
            .iter()
            .map(|r| {
                let line = self.index.line_of(r.dependency.span.start);
                let end = self
                    .index
                    .line_span(line)
                    .map_or(r.dependency.span.end, |span| span.end);
                DecorationItem {
                    position: self.index.position(end),
                    dependency: r.clone(),
                }
            })
            .collect()
    }
}
