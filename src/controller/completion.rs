use registry_index::ResolvedDependency;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionList, CompletionResponse, CompletionTextEdit,
    Position, TextEdit,
};
use version_resolver::check_version;

use crate::usecase::Document;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Sort key keeping the registry order: `a`..`z`, then `za`..`zz`, `zza`..
pub fn sort_text(i: usize) -> String {
    let letter = ALPHABET[i % ALPHABET.len()] as char;
    let mut s = "z".repeat(i / ALPHABET.len());
    s.push(letter);
    s
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCompletion {
    pub version: String,
    pub sort_text: String,
    pub preselect: bool,
}

/// Versions starting with what was typed so far, latest first.
pub fn version_completions(versions: &[String], typed: &str) -> Vec<VersionCompletion> {
    let typed = typed.to_lowercase();
    versions
        .iter()
        .filter(|v| v.to_lowercase().starts_with(&typed))
        .enumerate()
        .map(|(i, v)| VersionCompletion {
            version: v.clone(),
            sort_text: sort_text(i),
            preselect: i == 0,
        })
        .collect()
}

/// Features of the highest version the requirement accepts (the latest one
/// when nothing matches), minus those already enabled.
pub fn feature_completions(resolved: &ResolvedDependency) -> Vec<String> {
    let dep = &resolved.dependency;
    let version = check_version(&dep.version, resolved.versions())
        .ok()
        .and_then(|(_, max)| max)
        .or_else(|| resolved.latest().map(str::to_string));
    let Some(version) = version else {
        return Vec::new();
    };
    resolved
        .features_of(&version)
        .iter()
        .filter(|f| !dep.features.contains(f))
        .cloned()
        .collect()
}

pub fn completion(doc: &Document, position: Position) -> Option<CompletionResponse> {
    let offset = doc.offset(position)?;

    if let Some(resolved) = doc
        .resolved()
        .iter()
        .find(|r| r.dependency.span.inner().contains(offset))
    {
        let inner = resolved.dependency.span.inner();
        let typed = doc.text().get(inner.start..offset)?;
        let range = doc.index().range(inner);
        let items = version_completions(resolved.versions(), typed)
            .into_iter()
            .map(|c| CompletionItem {
                label: c.version.clone(),
                kind: Some(CompletionItemKind::VALUE),
                sort_text: Some(c.sort_text),
                preselect: Some(c.preselect),
                text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                    range,
                    new_text: c.version,
                })),
                ..Default::default()
            })
            .collect();
        return Some(CompletionResponse::List(CompletionList {
            is_incomplete: true,
            items,
        }));
    }

    let resolved = doc.resolved().iter().find(|r| {
        r.dependency
            .features_span
            .is_some_and(|span| span.contains(offset))
    })?;
    let items = feature_completions(resolved)
        .into_iter()
        .enumerate()
        .map(|(i, feature)| CompletionItem {
            label: feature,
            kind: Some(CompletionItemKind::PROPERTY),
            sort_text: Some(sort_text(i)),
            ..Default::default()
        })
        .collect();
    Some(CompletionResponse::Array(items))
}
