//! Command implementations for the `cite` CLI
//!
//! Each command module handles the CLI interface and delegates to
//! quarto-citation-sync for the actual work.

use std::future::Future;
use std::path::PathBuf;

use anyhow::Result;
use quarto_citation_client::{
    ClientSettings, HttpTransport, SettingsStore, load_document, save_document,
};
use quarto_citation_sync::{CitationSync, InMemoryDocument};
use tracing::debug;

pub mod aggregate;
pub mod config;
pub mod health;
pub mod insert;
pub mod refresh;
pub mod search;
pub mod styles;
pub mod validate;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub server: Option<String>,
    pub settings: Option<PathBuf>,
}

/// Options of commands that work on a document snapshot.
#[derive(Debug, Clone)]
pub struct DocArgs {
    pub path: PathBuf,
    pub title: Option<String>,
}

pub type DocumentSync = CitationSync<HttpTransport, InMemoryDocument>;

pub(crate) fn settings_store(global: &GlobalArgs) -> Result<SettingsStore> {
    Ok(SettingsStore::locate(global.settings.clone())?)
}

/// Persisted settings with the `--server` override applied.
pub(crate) fn effective_settings(global: &GlobalArgs) -> Result<ClientSettings> {
    let mut settings = settings_store(global)?.load()?;
    if let Some(server) = &global.server {
        settings.server_url = server.clone();
    }
    Ok(settings)
}

pub(crate) fn transport(global: &GlobalArgs) -> Result<HttpTransport> {
    let settings = effective_settings(global)?;
    let transport = HttpTransport::new(&settings)?;
    debug!(base_url = transport.base_url(), "Using citation service");
    Ok(transport)
}

pub(crate) fn open(global: &GlobalArgs, doc: &DocArgs) -> Result<DocumentSync> {
    let transport = transport(global)?;
    let document = load_document(&doc.path, doc.title.as_deref())?;
    Ok(CitationSync::new(transport, document))
}

/// Write the snapshot back, then surface the operation's outcome.
///
/// The snapshot is saved even when the operation failed: the fingerprint
/// may already have been written to it.
pub(crate) async fn finish<R>(
    sync: &DocumentSync,
    doc: &DocArgs,
    outcome: quarto_citation_sync::Result<R>,
) -> Result<R> {
    save_document(&doc.path, sync.document()).await?;
    Ok(outcome?)
}

pub(crate) fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(future)
}
