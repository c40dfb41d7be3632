use toml_parser::Span;
use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, CodeActionResponse, Command, Range,
};

use crate::{
    entity::{workspace_edit, Replacement, UPDATE_ALL},
    usecase::Document,
};

/// Replacements a code action at `span` should offer. A selection picks every
/// literal inside it, a bare cursor the literal it sits in.
pub fn quick_fix_replacements(doc: &Document, span: Span) -> Vec<&Replacement> {
    let is_selection = !span.is_empty();
    doc.replacements()
        .iter()
        .filter(|r| {
            //with the quotes
            let literal = Span::new(r.start.saturating_sub(1), r.end + 1);
            if is_selection {
                span.start <= literal.start && literal.end <= span.end
            } else {
                literal.contains(span.start)
            }
        })
        .collect()
}

pub fn code_action(doc: &Document, range: Range) -> CodeActionResponse {
    let mut actions: CodeActionResponse = vec![];
    let Some(span) = doc.index().span(range) else {
        return actions;
    };

    let replacements: Vec<Replacement> = quick_fix_replacements(doc, span)
        .into_iter()
        .filter(|r| r.applies_to(doc.text()))
        .cloned()
        .collect();
    match replacements.as_slice() {
        [] => {}
        [single] => actions.push(CodeActionOrCommand::CodeAction(CodeAction {
            title: format!("Update {} to {}", single.name, single.version),
            kind: Some(CodeActionKind::QUICKFIX),
            edit: Some(workspace_edit(&doc.uri, doc.index(), &replacements)),
            is_preferred: Some(true),
            ..Default::default()
        })),
        _ => actions.push(CodeActionOrCommand::CodeAction(CodeAction {
            title: "Update Dependencies".to_string(),
            kind: Some(CodeActionKind::QUICKFIX),
            edit: Some(workspace_edit(&doc.uri, doc.index(), &replacements)),
            ..Default::default()
        })),
    }

    if !doc.replacements().is_empty() {
        actions.push(CodeActionOrCommand::CodeAction(CodeAction {
            title: "Update All Dependencies".to_string(),
            kind: Some(CodeActionKind::SOURCE),
            command: Some(Command {
                title: "Update All Dependencies".to_string(),
                command: UPDATE_ALL.to_string(),
                arguments: Some(vec![serde_json::json!(doc.uri.as_str())]),
            }),
            ..Default::default()
        }));
    }
    actions
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use registry_index::{FetchState, ResolvedDependency};
    use tower_lsp::lsp_types::Position;

    use super::*;

    const TOML: &str = "[dependencies]\nserde = \"1.0\"\nlog = \"0.4.22\"\nrand = \"?\"\n";

    fn doc() -> Document {
        let uri = "file:///work/Cargo.toml".parse().unwrap();
        let mut doc = Document::parse(&uri, TOML).unwrap();
        let resolved = doc
            .dependencies()
            .iter()
            .map(|d| {
                let latest = match d.name.as_str() {
                    "serde" => "1.0.210",
                    "log" => "0.4.22",
                    _ => "0.8.5",
                };
                ResolvedDependency {
                    dependency: d.clone(),
                    state: FetchState::Resolved {
                        versions: vec![latest.to_string()],
                        features: HashMap::new(),
                    },
                }
            })
            .collect();
        doc.set_resolved(resolved);
        doc
    }

    fn titles(actions: &CodeActionResponse) -> Vec<String> {
        actions
            .iter()
            .map(|a| match a {
                CodeActionOrCommand::CodeAction(a) => a.title.clone(),
                CodeActionOrCommand::Command(c) => c.title.clone(),
            })
            .collect()
    }

    #[test]
    fn test_cursor_in_literal() {
        let doc = doc();
        let cursor = Range::new(Position::new(1, 10), Position::new(1, 10));
        let actions = code_action(&doc, cursor);
        assert_eq!(
            titles(&actions),
            vec!["Update serde to 1.0.210", "Update All Dependencies"]
        );
        let CodeActionOrCommand::CodeAction(fix) = &actions[0] else {
            panic!("expected a code action");
        };
        assert_eq!(fix.is_preferred, Some(true));
        let edits = &fix.edit.as_ref().unwrap().changes.as_ref().unwrap()[&doc.uri];
        assert_eq!(edits[0].new_text, "1.0.210");
    }

    #[test]
    fn test_up_to_date_literal() {
        let doc = doc();
        let cursor = Range::new(Position::new(2, 9), Position::new(2, 9));
        assert_eq!(titles(&code_action(&doc, cursor)), vec!["Update All Dependencies"]);
    }

    #[test]
    fn test_selection() {
        let doc = doc();
        let selection = Range::new(Position::new(1, 0), Position::new(3, 10));
        let actions = code_action(&doc, selection);
        assert_eq!(
            titles(&actions),
            vec!["Update Dependencies", "Update All Dependencies"]
        );
        let CodeActionOrCommand::CodeAction(fix) = &actions[0] else {
            panic!("expected a code action");
        };
        let edits = &fix.edit.as_ref().unwrap().changes.as_ref().unwrap()[&doc.uri];
        let texts: Vec<_> = edits.iter().map(|e| e.new_text.as_str()).collect();
        assert_eq!(texts, vec!["1.0.210", "0.8.5"]);
    }

    #[test]
    fn test_partial_selection_excludes_literal() {
        let doc = doc();
        // ends inside serde's literal
        let selection = Range::new(Position::new(1, 0), Position::new(1, 10));
        assert!(quick_fix_replacements(&doc, doc.index().span(selection).unwrap()).is_empty());
    }

    #[test]
    fn test_nothing_fetched() {
        let uri = "file:///work/Cargo.toml".parse().unwrap();
        let doc = Document::parse(&uri, TOML).unwrap();
        let cursor = Range::new(Position::new(1, 10), Position::new(1, 10));
        assert!(code_action(&doc, cursor).is_empty());
    }
}
