/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The citation synchronization engine: one host document, one remote service.
 */

//! Engine façade.
//!
//! [`CitationSync`] ties a host document to the remote service. The
//! operations are spread over the modules that implement them:
//! - [`crate::insert`]: `insert_citation`
//! - [`crate::reconcile`]: `refresh_all`
//! - [`crate::aggregate`]: `upsert_bibliography`, `upsert_sources_list`
//!
//! Every operation that needs a server-side document id registers the
//! document again. The id is never cached between calls.

use tracing::{debug, warn};

use crate::error::Result;
use crate::host::HostDocument;
use crate::identity::{DocumentIdentity, IdentityManager};
use crate::service::{
    DocumentRecord, DocumentUpsert, RemoteService, SourceSummary, StyleSummary, ValidationIssue,
};
use crate::transport::Transport;

/// Outcome of a connection check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    /// The service answered but did not report itself healthy.
    ServerError(String),
    NotConnected(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    /// Status line shown to the author.
    pub fn message(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::ServerError(_) => "Server error",
            ConnectionStatus::NotConnected(_) => "Not connected",
        }
    }
}

/// Citation synchronization for one host document.
pub struct CitationSync<T, D> {
    pub(crate) service: RemoteService<T>,
    pub(crate) document: D,
    identity: IdentityManager,
}

impl<T: Transport, D: HostDocument> CitationSync<T, D> {
    pub fn new(transport: T, document: D) -> Self {
        Self {
            service: RemoteService::new(transport),
            document,
            identity: IdentityManager::new(),
        }
    }

    pub fn service(&self) -> &RemoteService<T> {
        &self.service
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn into_document(self) -> D {
        self.document
    }

    /// Fingerprint and display name of the host document.
    pub async fn ensure_document(&self) -> Result<DocumentIdentity> {
        self.identity.ensure_document(&self.document).await
    }

    /// Register the document with the service and return its record.
    pub async fn register_document(&self) -> Result<DocumentRecord> {
        let identity = self.ensure_document().await?;
        let record = self
            .service
            .upsert_document(&DocumentUpsert {
                doc_fingerprint: identity.fingerprint,
                name: Some(identity.name),
                active_style_id: None,
            })
            .await?;
        debug!(doc_id = %record.id, "Registered document");
        Ok(record)
    }

    /// Probe the service. Failures are folded into the status.
    pub async fn check_connection(&self) -> ConnectionStatus {
        match self.service.health().await {
            Ok(health) if health.is_ok() => ConnectionStatus::Connected,
            Ok(health) => ConnectionStatus::ServerError(health.status),
            Err(e) => {
                warn!(error = %e, "Health check failed");
                ConnectionStatus::NotConnected(e.to_string())
            }
        }
    }

    pub async fn search_sources(&self, query: &str, limit: Option<u32>) -> Result<Vec<SourceSummary>> {
        self.service.search_sources(query, limit).await
    }

    pub async fn list_styles(&self) -> Result<Vec<StyleSummary>> {
        self.service.list_styles().await
    }

    /// Server-side consistency check of this document's citations.
    pub async fn validate_document(&self) -> Result<Vec<ValidationIssue>> {
        let record = self.register_document().await?;
        self.service.validate_document(&record.id).await
    }
}
