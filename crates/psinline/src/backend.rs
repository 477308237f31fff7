//
// backend.rs
//
// Copyright (C) 2022-2026 Posit Software, PBC. All rights reserved.
// Modifications copyright (C) 2026 Jonathan Marc Bearak
//

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::Client;
use tower_lsp::LanguageServer;
use tower_lsp::LspService;
use tower_lsp::Server;

use crate::config::{InlineValuesConfig, ScopePolicy};
use crate::handlers;
use crate::outline::OutlineSymbolSource;
use crate::scope::ScopeResolver;
use crate::state::WorldState;

/// Settings section read from `initializationOptions` and
/// `workspace/didChangeConfiguration`.
const SETTINGS_SECTION: &str = "powershellInlineValues";

/// Debugger type whose session end invalidates the function cache.
const POWERSHELL_DEBUG_TYPE: &str = "powershell";

/// Parameters for the powershellInlineValues/debugSessionTerminated notification
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugSessionTerminatedParams {
    #[serde(rename = "type")]
    session_type: String,
}

/// Parse inline values configuration from LSP settings.
///
/// Reads the `powershellInlineValues` section. Only fields present in the
/// JSON are applied; absent fields keep their defaults. Returns `None` when
/// the section is missing.
fn parse_inline_values_config(settings: &serde_json::Value) -> Option<InlineValuesConfig> {
    let section = settings.get(SETTINGS_SECTION)?;

    let mut config = InlineValuesConfig::default();

    if let Some(v) = section.get("startLocation") {
        config.start_location = match v.as_str() {
            Some(s) => ScopePolicy::from_setting(s),
            None => {
                log::warn!("startLocation is not a string: {}, using currentFunction", v);
                ScopePolicy::default()
            }
        };
    }

    log::info!("Inline values configuration:");
    log::info!("    start_location: {:?}", config.start_location);

    Some(config)
}

pub struct Backend {
    client: Client,
    state: Arc<RwLock<WorldState>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(WorldState::new())),
        }
    }

    /// Handle the powershellInlineValues/debugSessionTerminated notification
    async fn handle_debug_session_terminated(&self, params: DebugSessionTerminatedParams) {
        if !params.session_type.eq_ignore_ascii_case(POWERSHELL_DEBUG_TYPE) {
            log::trace!(
                "Ignoring termination of '{}' debug session",
                params.session_type
            );
            return;
        }

        // The cache has interior mutability, so a read lock is enough
        let state = self.state.read().await;
        let count = state.function_cache.clear();
        log::info!("Debug session terminated, cleared function cache ({} documents)", count);
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        log::info!("Initializing psinline");

        if let Some(config) = params
            .initialization_options
            .as_ref()
            .and_then(parse_inline_values_config)
        {
            self.state.write().await.config = config;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                document_symbol_provider: Some(OneOf::Left(true)),
                inline_value_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: String::from("psinline"),
                version: Some(String::from(env!("CARGO_PKG_VERSION"))),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        log::info!("psinline initialized");
        self.client
            .log_message(MessageType::INFO, "psinline initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        log::info!("psinline shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let mut state = self.state.write().await;
        state.open_document(doc.uri, &doc.text, Some(doc.version));
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let mut state = self.state.write().await;
        for change in params.content_changes {
            state.apply_change(&uri, change);
        }
        if let Some(doc) = state.documents.get_mut(&uri) {
            doc.version = Some(params.text_document.version);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let mut state = self.state.write().await;
        state.close_document(&params.text_document.uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        log::trace!("Configuration changed");

        let Some(config) = parse_inline_values_config(&params.settings) else {
            log::warn!("No {} section in settings, keeping existing configuration", SETTINGS_SECTION);
            return;
        };

        self.state.write().await.config = config;
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let state = self.state.read().await;
        Ok(handlers::document_symbol(&state, &params.text_document.uri))
    }

    async fn inline_value(&self, params: InlineValueParams) -> Result<Option<Vec<InlineValue>>> {
        let uri = params.text_document.uri;
        let stopped = params.context.stopped_location;

        // Snapshot under a brief read lock; the search runs without it
        let (doc, policy, cache) = {
            let state = self.state.read().await;
            let Some(doc) = state.get_document(&uri) else {
                return Ok(None);
            };
            (
                doc.clone(),
                state.config.start_location,
                state.function_cache.clone(),
            )
        };

        let source = OutlineSymbolSource::new(uri.clone(), doc.contents.clone());
        let resolver = ScopeResolver::new(source, cache);
        let references =
            handlers::provide_inline_values(&resolver, &uri, &doc, &stopped, policy).await;

        Ok(Some(references.into_iter().map(InlineValue::from).collect()))
    }
}

pub async fn start_lsp() -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(Backend::new)
        .custom_method(
            "powershellInlineValues/debugSessionTerminated",
            Backend::handle_debug_session_terminated,
        )
        .finish();
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
