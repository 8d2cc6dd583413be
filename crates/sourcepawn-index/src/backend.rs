//
// backend.rs
//
// tower-lsp language server wiring the completion index to the client
//

use std::sync::Arc;

use serde_json::json;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::{self, ErrorCode, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::Client;
use tower_lsp::LanguageServer;
use tower_lsp::LspService;
use tower_lsp::Server;

use crate::cross_file::IndexError;
use crate::handlers;
use crate::state::{scan_workspace, WorldState};

/// JSON-RPC code returned when a query fails on configuration
const CONFIGURATION_ERROR_CODE: i64 = -32001;

/// Map a fatal index error onto the JSON-RPC error returned to the client
fn index_error_response(err: &IndexError) -> jsonrpc::Error {
    jsonrpc::Error {
        code: ErrorCode::ServerError(CONFIGURATION_ERROR_CODE),
        message: err.to_string().into(),
        data: None,
    }
}

/// Settings may arrive wrapped in a `sourcepawn` section or as the bare
/// section itself.
fn settings_section(options: serde_json::Value) -> serde_json::Value {
    if options.get("sourcepawn").is_some() {
        options
    } else {
        json!({ "sourcepawn": options })
    }
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

    /// Surface a fatal index error to the user and turn it into a response
    async fn report_index_error(&self, err: IndexError) -> jsonrpc::Error {
        log::error!("{}", err);
        self.client
            .show_message(MessageType::ERROR, err.to_string())
            .await;
        index_error_response(&err)
    }

    async fn publish_diagnostics(&self, uri: &Url) {
        let (diagnostics, version) = {
            let state = self.state.read().await;
            let Some(doc) = state.documents.get(uri) else {
                return;
            };
            (handlers::diagnostics(&state, uri), doc.version)
        };
        self.client
            .publish_diagnostics(uri.clone(), diagnostics, version)
            .await;
    }

    /// Republish diagnostics for every open document, since include
    /// resolution may have changed for all of them.
    async fn publish_all_diagnostics(&self) {
        let open: Vec<Url> = {
            let state = self.state.read().await;
            state.documents.keys().cloned().collect()
        };
        for uri in &open {
            self.publish_diagnostics(uri).await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        log::info!("Initializing sourcepawn-index");

        let mut state = self.state.write().await;

        if let Some(folders) = params.workspace_folders {
            for folder in folders {
                log::info!("Adding workspace folder: {}", folder.uri);
                state.add_workspace_folder(folder.uri);
            }
        } else if let Some(root_uri) = params.root_uri {
            log::info!("Adding root URI as workspace folder: {}", root_uri);
            state.add_workspace_folder(root_uri);
        }

        if let Some(options) = params.initialization_options {
            if !state.apply_settings(&settings_section(options)) {
                log::warn!("Ignoring unusable initialization options");
            }
        }

        drop(state);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![String::from(".")]),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec![String::from("("), String::from(",")]),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: String::from("sourcepawn-index"),
                version: Some(String::from(env!("CARGO_PKG_VERSION"))),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        log::info!("sourcepawn-index initialized");

        let (folders, extractor) = {
            let state = self.state.read().await;
            (state.workspace_folders.clone(), state.extractor())
        };

        // Scan without holding the lock
        let scanned =
            tokio::task::spawn_blocking(move || scan_workspace(&folders, extractor.as_ref()))
                .await
                .unwrap_or_default();

        {
            let mut state = self.state.write().await;
            state.apply_workspace_scan(scanned);
        }

        self.publish_all_diagnostics().await;
        log::info!("Workspace initialization complete");
    }

    async fn shutdown(&self) -> Result<()> {
        log::info!("sourcepawn-index shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut state = self.state.write().await;
            state.open_document(
                uri.clone(),
                &params.text_document.text,
                Some(params.text_document.version),
            );
        }
        self.publish_diagnostics(&uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut state = self.state.write().await;
            state.apply_change(
                &uri,
                params.content_changes,
                Some(params.text_document.version),
            );
        }
        self.publish_diagnostics(&uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut state = self.state.write().await;
            state.close_document(&uri);
        }
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        log::trace!("Configuration changed");
        let applied = {
            let mut state = self.state.write().await;
            state.apply_settings(&params.settings)
        };
        if applied {
            self.publish_all_diagnostics().await;
        } else {
            log::warn!("No usable sourcepawn section in configuration, keeping current settings");
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let result = {
            let state = self.state.read().await;
            handlers::completion(
                &state,
                &params.text_document_position.text_document.uri,
                params.text_document_position.position,
            )
        };
        match result {
            Ok(response) => Ok(response),
            Err(err) => Err(self.report_index_error(err).await),
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let result = {
            let state = self.state.read().await;
            handlers::hover(
                &state,
                &params.text_document_position_params.text_document.uri,
                params.text_document_position_params.position,
            )
        };
        match result {
            Ok(response) => Ok(response),
            Err(err) => Err(self.report_index_error(err).await),
        }
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let result = {
            let state = self.state.read().await;
            handlers::signature_help(
                &state,
                &params.text_document_position_params.text_document.uri,
                params.text_document_position_params.position,
            )
        };
        match result {
            Ok(response) => Ok(response),
            Err(err) => Err(self.report_index_error(err).await),
        }
    }
}

pub async fn start_lsp() -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
