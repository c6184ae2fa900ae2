//! Document snapshots on disk
//!
//! The command-line front end has no word processor to talk to, so it works
//! on a JSON snapshot of an [`InMemoryDocument`].

use std::path::Path;

use quarto_citation_sync::{DocumentState, InMemoryDocument};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::settings::write_atomic;

/// Load a snapshot, or start an empty document titled `title` if the file
/// does not exist yet.
pub fn load_document(path: &Path, title: Option<&str>) -> Result<InMemoryDocument> {
    if !path.exists() {
        info!(path = %path.display(), "Starting new document snapshot");
        let state = match title {
            Some(title) => DocumentState::with_title(title),
            None => DocumentState::default(),
        };
        return Ok(InMemoryDocument::from_state(state));
    }

    let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let state: DocumentState = serde_json::from_str(&content).map_err(|e| Error::DocumentParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!(path = %path.display(), regions = state.regions.len(), "Loaded document snapshot");
    Ok(InMemoryDocument::from_state(state))
}

pub async fn save_document(path: &Path, document: &InMemoryDocument) -> Result<()> {
    let state = document.snapshot().await;
    let content = serde_json::to_string_pretty(&state).map_err(|e| Error::DocumentParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write_atomic(path, &content)?;
    debug!(path = %path.display(), "Saved document snapshot");
    Ok(())
}
