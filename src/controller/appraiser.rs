use std::sync::Arc;

use registry_index::{
    failed_crates, fetch_versions, FetchOptions, Registries, RegistryLookup, ResolvedDependency,
};
use tokio::sync::mpsc::{self, Sender};
use tower_lsp::{
    lsp_types::{MessageType, Uri, WorkspaceEdit},
    Client,
};
use tracing::{debug, error, info, warn};

use crate::{
    config::{Config, GLOBAL_CONFIG},
    controller::{code_action::code_action, completion::completion, hover::hover},
    decoration::DecorationEvent,
    entity::{workspace_edit, Replacement},
    usecase::{build_lookup, build_registries, cargo_home, Document, Workspace},
};

use super::context::{CargoDocumentEvent, Ctx};

/// Everything a fetch needs, rebuilt whenever the configuration changes.
struct RegistryStack {
    lookup: Arc<dyn RegistryLookup>,
    registries: Arc<Registries>,
    options: FetchOptions,
}

impl RegistryStack {
    fn new(config: &Config, http_client: &reqwest::Client) -> Self {
        let home = cargo_home();
        Self {
            lookup: build_lookup(config, http_client.clone(), home.as_deref()),
            registries: Arc::new(build_registries(config, home.as_deref())),
            options: config.fetch_options(),
        }
    }
}

//Appraiser runs a dedicated task that owns every open document.
//lsp handlers talk to it through CargoDocumentEvent, fetches run in their own
//tasks and post their result back as Fetched
#[derive(Debug)]
pub struct Appraiser {
    client: Client,
    render_tx: Sender<DecorationEvent>,
    http_client: reqwest::Client,
}

impl Appraiser {
    pub fn new(
        client: Client,
        render_tx: Sender<DecorationEvent>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            render_tx,
            http_client,
        }
    }

    pub fn initialize(&self) -> Sender<CargoDocumentEvent> {
        let (tx, mut rx) = mpsc::channel::<CargoDocumentEvent>(64);

        let client = self.client.clone();
        let render_tx = self.render_tx.clone();
        let http_client = self.http_client.clone();
        let fetch_tx = tx.clone();
        tokio::spawn(async move {
            let mut state = Workspace::new();
            let mut stack = RegistryStack::new(&Config::default(), &http_client);

            while let Some(event) = rx.recv().await {
                match event {
                    CargoDocumentEvent::Configured => {
                        let config = GLOBAL_CONFIG.read().clone();
                        stack = RegistryStack::new(&config, &http_client);
                        info!("registry lookup configured");
                    }
                    CargoDocumentEvent::Opened(msg) | CargoDocumentEvent::Saved(msg) => {
                        let doc = match state.update(&msg.uri, &msg.text) {
                            Ok(doc) => doc,
                            Err(e) => {
                                invalid_manifest(&client, &render_tx, &msg.uri, e).await;
                                continue;
                            }
                        };
                        if !doc.parse_errors().is_empty() {
                            client
                                .log_message(
                                    MessageType::WARNING,
                                    format!(
                                        "{}: {} lines skipped by the parser",
                                        msg.uri.as_str(),
                                        doc.parse_errors().len()
                                    ),
                                )
                                .await;
                        }
                        // stale values stay visible as loading until the fetch lands
                        let mut loading = doc.clone();
                        loading.set_resolved(
                            doc.dependencies()
                                .iter()
                                .cloned()
                                .map(ResolvedDependency::pending)
                                .collect(),
                        );
                        render(&render_tx, &loading).await;
                        spawn_fetch(&stack, doc, fetch_tx.clone());
                    }
                    CargoDocumentEvent::Changed(msg) => match state.update(&msg.uri, &msg.text) {
                        Ok(doc) => render(&render_tx, doc).await,
                        Err(e) => invalid_manifest(&client, &render_tx, &msg.uri, e).await,
                    },
                    CargoDocumentEvent::Closed(uri) => {
                        state.remove(&uri);
                        debug!("{} documents open", state.len());
                        if let Err(e) = render_tx.send(DecorationEvent::Reset(uri)).await {
                            error!("render reset tx error: {}", e);
                        }
                    }
                    CargoDocumentEvent::Fetched(ctx, resolved) => {
                        match state.resolve(&ctx.uri, ctx.rev, resolved) {
                            Some(doc) => {
                                render(&render_tx, doc).await;
                                if !doc.is_pending() {
                                    report_status(&client, doc).await;
                                }
                            }
                            None => debug!(
                                "discarded stale fetch for {} rev {}",
                                ctx.uri.as_str(),
                                ctx.rev
                            ),
                        }
                        // edited while fetching, look up what the old revision lacked
                        if let Some(doc) = state
                            .document(&ctx.uri)
                            .filter(|doc| doc.rev != ctx.rev && doc.is_pending())
                        {
                            spawn_fetch(&stack, doc, fetch_tx.clone());
                        }
                    }
                    CargoDocumentEvent::Hovered(uri, pos, tx) => {
                        let h = state.document(&uri).and_then(|doc| hover(doc, pos));
                        let _ = tx.send(h);
                    }
                    CargoDocumentEvent::Completion(uri, pos, tx) => {
                        let c = state.document(&uri).and_then(|doc| completion(doc, pos));
                        let _ = tx.send(c);
                    }
                    CargoDocumentEvent::CodeAction(uri, range, tx) => {
                        let actions = state
                            .document(&uri)
                            .map(|doc| code_action(doc, range))
                            .unwrap_or_default();
                        let _ = tx.send(actions);
                    }
                    CargoDocumentEvent::ReplaceVersion(uri, replacement, tx) => {
                        let edit = state
                            .document(&uri)
                            .and_then(|doc| applicable_edit(doc, vec![replacement]));
                        let _ = tx.send(edit);
                    }
                    CargoDocumentEvent::UpdateAll(uri, tx) => {
                        let edit = state
                            .document(&uri)
                            .and_then(|doc| applicable_edit(doc, doc.replacements().to_vec()));
                        let _ = tx.send(edit);
                    }
                }
            }
        });
        tx
    }
}

/// Edit for the replacements that still fit the current text.
fn applicable_edit(doc: &Document, replacements: Vec<Replacement>) -> Option<WorkspaceEdit> {
    let (fit, stale): (Vec<_>, Vec<_>) = replacements
        .into_iter()
        .partition(|r| r.applies_to(doc.text()));
    for r in &stale {
        warn!("replacement for '{}' no longer applies, skipped", r.name);
    }
    if fit.is_empty() {
        return None;
    }
    Some(workspace_edit(&doc.uri, doc.index(), &fit))
}

fn spawn_fetch(stack: &RegistryStack, doc: &Document, tx: Sender<CargoDocumentEvent>) {
    let lookup = Arc::clone(&stack.lookup);
    let registries = Arc::clone(&stack.registries);
    let options = stack.options;
    let deps = doc.dependencies().to_vec();
    let ctx = Ctx {
        uri: doc.uri.clone(),
        rev: doc.rev,
    };
    tokio::spawn(async move {
        let resolved = fetch_versions(lookup.as_ref(), &registries, deps, options).await;
        if let Err(e) = tx.send(CargoDocumentEvent::Fetched(ctx, resolved)).await {
            error!("fetched tx error: {}", e);
        }
    });
}

async fn render(render_tx: &Sender<DecorationEvent>, doc: &Document) {
    if let Err(e) = render_tx
        .send(DecorationEvent::Update(doc.uri.clone(), doc.decoration_items()))
        .await
    {
        error!("render tx error: {}", e);
    }
}

async fn invalid_manifest(
    client: &Client,
    render_tx: &Sender<DecorationEvent>,
    uri: &Uri,
    e: anyhow::Error,
) {
    error!("{}: {}", uri.as_str(), e);
    client
        .show_message(MessageType::ERROR, "Cargo.toml is not valid!")
        .await;
    if let Err(e) = render_tx.send(DecorationEvent::Reset(uri.clone())).await {
        error!("render reset tx error: {}", e);
    }
}

async fn report_status(client: &Client, doc: &Document) {
    let failed = failed_crates(doc.resolved());
    if failed.is_empty() {
        client
            .log_message(
                MessageType::INFO,
                format!("{}: versions of {} dependencies fetched", doc.uri.as_str(), doc.resolved().len()),
            )
            .await;
        return;
    }
    warn!("lookups failed for {}", failed.join(", "));
    let errors: Vec<&str> = doc.resolved().iter().filter_map(|r| r.error()).collect();
    client
        .log_message(
            MessageType::ERROR,
            format!("Completed with errors\n{}", errors.join("\n")),
        )
        .await;
}
