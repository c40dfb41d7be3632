use clap::Parser;
use config::{initialize_config, UserConfig};
use controller::{Appraiser, CargoDocumentEvent, CargoTomlPayload, EditGuard};
use decoration::inlay_hint::InlayHintDecoration;
use entity::{supported_commands, Replacement, REPLACE_VERSION, UPDATE_ALL};
use serde_json::Value;
use tokio::sync::{mpsc::Sender, oneshot};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{error, info, warn};

mod config;
mod controller;
mod decoration;
mod entity;
mod usecase;

fn is_cargo_toml(uri: &Uri) -> bool {
    uri.path().as_str().ends_with("Cargo.toml")
}

#[derive(Debug)]
struct CratesLens {
    client: Client,
    tx: Sender<CargoDocumentEvent>,
    render: InlayHintDecoration,
    edit_guard: EditGuard,
}

impl CratesLens {
    /// Ask the appraiser for an edit and hand it to the client.
    async fn apply(
        &self,
        event: impl FnOnce(oneshot::Sender<Option<WorkspaceEdit>>) -> CargoDocumentEvent,
    ) {
        let Some(_permit) = self.edit_guard.try_acquire() else {
            warn!("another edit is in progress, command ignored");
            return;
        };
        let (tx, rx) = oneshot::channel();
        if let Err(e) = self.tx.send(event(tx)).await {
            error!("error sending edit event: {}", e);
            return;
        }
        let Ok(Some(edit)) = rx.await else {
            return;
        };
        match self.client.apply_edit(edit).await {
            Ok(res) if !res.applied => {
                warn!("edit not applied: {}", res.failure_reason.unwrap_or_default())
            }
            Ok(_) => {}
            Err(e) => error!("apply edit error: {}", e),
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for CratesLens {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        //init config
        let config: UserConfig = params
            .initialization_options
            .map(serde_json::from_value)
            .and_then(|v| v.ok())
            .unwrap_or_default();
        initialize_config(config);
        if let Err(e) = self.tx.send(CargoDocumentEvent::Configured).await {
            error!("error sending configured event: {}", e);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: supported_commands(),
                    ..Default::default()
                }),
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(
                        [".", "\"", "'", "0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]
                            .into_iter()
                            .map(str::to_string)
                            .collect(),
                    ),
                    ..Default::default()
                }),
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        will_save: None,
                        will_save_wait_until: None,
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(true),
                        })),
                    },
                )),
                inlay_hint_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("crates-lens server initialized!");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let mut args = params.arguments.into_iter();
        let Some(uri) = args
            .next()
            .and_then(|v| v.as_str().and_then(|s| s.parse::<Uri>().ok()))
        else {
            warn!("{} called without a document uri", params.command);
            return Ok(None);
        };
        match params.command.as_str() {
            REPLACE_VERSION => {
                let Some(replacement) = args
                    .next()
                    .and_then(|v| serde_json::from_value::<Replacement>(v).ok())
                else {
                    warn!("{} called without a replacement", REPLACE_VERSION);
                    return Ok(None);
                };
                self.apply(|tx| CargoDocumentEvent::ReplaceVersion(uri, replacement, tx))
                    .await;
            }
            UPDATE_ALL => {
                self.apply(|tx| CargoDocumentEvent::UpdateAll(uri, tx)).await;
            }
            _ => {}
        }
        Ok(None)
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        if !is_cargo_toml(&uri) {
            return;
        };
        if let Err(e) = self
            .tx
            .send(CargoDocumentEvent::Opened(CargoTomlPayload {
                uri,
                text: params.text_document.text,
            }))
            .await
        {
            error!("error sending opened event: {}", e);
        };
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        if !is_cargo_toml(&params.text_document.uri) {
            return;
        };
        //full sync, the last change is the whole document
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        if let Err(e) = self
            .tx
            .send(CargoDocumentEvent::Changed(CargoTomlPayload {
                uri: params.text_document.uri,
                text: change.text,
            }))
            .await
        {
            error!("error sending changed event: {}", e);
        };
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        if !is_cargo_toml(&uri) {
            return;
        };
        if let Err(e) = self.tx.send(CargoDocumentEvent::Closed(uri)).await {
            error!("error sending closed event: {}", e);
        };
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        if !is_cargo_toml(&uri) {
            return;
        };

        if let Some(text) = params.text {
            if let Err(e) = self
                .tx
                .send(CargoDocumentEvent::Saved(CargoTomlPayload { uri, text }))
                .await
            {
                error!("error sending saved event: {}", e);
            };
        };
    }

    async fn inlay_hint(&self, params: InlayHintParams) -> Result<Option<Vec<InlayHint>>> {
        let uri = params.text_document.uri;
        if !is_cargo_toml(&uri) {
            return Ok(None);
        };
        Ok(Some(self.render.list(&uri)))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        if !is_cargo_toml(&uri) {
            return Ok(None);
        };
        let (tx, rx) = oneshot::channel();
        if let Err(e) = self
            .tx
            .send(CargoDocumentEvent::Completion(
                uri,
                params.text_document_position.position,
                tx,
            ))
            .await
        {
            error!("error sending completion event: {}", e);
            return Ok(None);
        };
        Ok(rx.await.ok().flatten())
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        if !is_cargo_toml(&uri) {
            return Ok(None);
        };
        let (tx, rx) = oneshot::channel();
        if let Err(e) = self
            .tx
            .send(CargoDocumentEvent::CodeAction(uri, params.range, tx))
            .await
        {
            error!("error sending code action event: {}", e);
            return Ok(None);
        };
        Ok(rx.await.ok().filter(|actions| !actions.is_empty()))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        if !is_cargo_toml(&uri) {
            return Ok(None);
        };
        //create a once channel with payload Hover
        let (tx, rx) = oneshot::channel();
        if let Err(e) = self
            .tx
            .send(CargoDocumentEvent::Hovered(
                uri,
                params.text_document_position_params.position,
                tx,
            ))
            .await
        {
            error!("error sending hover event: {}", e);
            return Ok(None);
        };
        Ok(rx.await.ok().flatten())
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match serde_json::from_value::<UserConfig>(params.settings) {
            Ok(config) => {
                initialize_config(config);
                if let Err(e) = self.tx.send(CargoDocumentEvent::Configured).await {
                    error!("error sending configured event: {}", e);
                }
            }
            Err(e) => warn!("ignored configuration change: {}", e),
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    ///stdio transport. now only work with stdio transport
    #[arg(short, long, default_value = "true")]
    stdio: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _args = Args::parse();

    //logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("a rustls crypto provider is already installed");
    }
    let http_client = reqwest::Client::builder()
        .user_agent(concat!("crates-lens/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| {
        let render = InlayHintDecoration::new(client.clone());
        let render_tx = render.init();

        let state = Appraiser::new(client.clone(), render_tx, http_client);
        let tx = state.initialize();

        CratesLens {
            client,
            tx,
            render,
            edit_guard: EditGuard::new(),
        }
    });

    Server::new(stdin, stdout, socket).serve(service).await;
    Ok(())
}
