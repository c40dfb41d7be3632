use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, Sender};
use tower_lsp::{
    lsp_types::{InlayHint, InlayHintLabel, InlayHintTooltip, Uri},
    Client,
};
use tracing::error;

use crate::config::GLOBAL_CONFIG;

use super::{formatted_string, CompiledFormatter, DecorationEvent, DecorationItem, VersionDecorationKind};

type InlayHintDecorationState = HashMap<Uri, Vec<InlayHint>>;

mod inlay_hint_decoration_state {
    use super::*;

    pub fn new() -> Arc<RwLock<InlayHintDecorationState>> {
        Arc::new(RwLock::new(HashMap::new()))
    }

    pub fn update(state: &RwLock<InlayHintDecorationState>, uri: &Uri, hints: Vec<InlayHint>) {
        let mut state = state.write();
        state.insert(uri.clone(), hints);
    }

    pub fn reset(state: &RwLock<InlayHintDecorationState>, uri: &Uri) {
        let mut state = state.write();
        state.remove(uri);
    }

    pub fn list(state: &RwLock<InlayHintDecorationState>, uri: &Uri) -> Vec<InlayHint> {
        let state = state.read();
        state.get(uri).cloned().unwrap_or_default()
    }
}

/// Turn decoration items into inlay hints.
pub fn hints(items: &[DecorationItem], formatter: &CompiledFormatter) -> Vec<InlayHint> {
    items
        .iter()
        .filter_map(|item| {
            let (kind, text) = formatted_string(&item.dependency, formatter)?;
            let tooltip = match kind {
                VersionDecorationKind::Error => item
                    .dependency
                    .error()
                    .map(|e| InlayHintTooltip::String(e.to_string())),
                _ => None,
            };
            Some(InlayHint {
                position: item.position,
                label: InlayHintLabel::String(text),
                kind: None,
                text_edits: None,
                tooltip,
                padding_left: Some(true),
                padding_right: None,
                data: None,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct InlayHintDecoration {
    client: Client,
    hints: Arc<RwLock<InlayHintDecorationState>>,
}

impl InlayHintDecoration {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            hints: inlay_hint_decoration_state::new(),
        }
    }

    pub fn init(&self) -> Sender<DecorationEvent> {
        let (render_tx, mut render_rx) = mpsc::channel::<DecorationEvent>(64);
        let state = Arc::clone(&self.hints);
        let client = self.client.clone();

        tokio::spawn(async move {
            while let Some(event) = render_rx.recv().await {
                match event {
                    DecorationEvent::Reset(uri) => {
                        inlay_hint_decoration_state::reset(&state, &uri);
                    }
                    DecorationEvent::Update(uri, items) => {
                        let formatter = GLOBAL_CONFIG.read().decoration_formatter.clone();
                        inlay_hint_decoration_state::update(&state, &uri, hints(&items, &formatter));
                    }
                }
                if let Err(e) = client.inlay_hint_refresh().await {
                    error!("inlay hint refresh error: {}", e);
                }
            }
        });
        render_tx
    }

    pub fn list(&self, uri: &Uri) -> Vec<InlayHint> {
        inlay_hint_decoration_state::list(&self.hints, uri)
    }
}
