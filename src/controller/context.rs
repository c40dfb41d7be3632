//! Shared context and types for the Appraiser controller.

use registry_index::ResolvedDependency;
use tokio::sync::oneshot;
use tower_lsp::lsp_types::{
    CodeActionResponse, CompletionResponse, Hover, Position, Range, Uri, WorkspaceEdit,
};

use crate::entity::Replacement;

/// Identifies the revision a fetch was started for.
#[derive(Debug, Clone)]
pub struct Ctx {
    pub uri: Uri,
    pub rev: usize,
}

/// Events that can be sent to the Appraiser controller.
pub enum CargoDocumentEvent {
    /// Configuration changed, rebuild the registry lookup
    Configured,
    Opened(CargoTomlPayload),
    Saved(CargoTomlPayload),
    /// Re-parse only, fetched versions are carried over
    Changed(CargoTomlPayload),
    Closed(Uri),
    /// Result of a fetch batch
    Fetched(Ctx, Vec<ResolvedDependency>),
    /// Code action request
    CodeAction(Uri, Range, oneshot::Sender<CodeActionResponse>),
    /// Hover event
    Hovered(Uri, Position, oneshot::Sender<Option<Hover>>),
    /// Completion request
    Completion(Uri, Position, oneshot::Sender<Option<CompletionResponse>>),
    /// Edit for a single replacement, if it still applies
    ReplaceVersion(Uri, Replacement, oneshot::Sender<Option<WorkspaceEdit>>),
    /// Edit for every pending replacement of a document
    UpdateAll(Uri, oneshot::Sender<Option<WorkspaceEdit>>),
}

/// Payload for Cargo.toml document events.
pub struct CargoTomlPayload {
    pub uri: Uri,
    pub text: String,
}
