/*
 * service.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Typed operations of the remote citation service.
 */

//! Typed remote service.
//!
//! [`RemoteService`] turns the untyped [`Transport`] into one method per
//! remote operation. Payload shapes follow the service's JSON contract;
//! fields the engine does not use are ignored on decode.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;
use crate::runs::TextRun;
use crate::transport::{Endpoint, RequestError, Transport};

/// Result count used when a search does not ask for one.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Largest result count the service accepts.
pub const MAX_SEARCH_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StyleSummary {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Contributor {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub short_title: Option<String>,
    #[serde(default, rename = "type")]
    pub source_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: Option<String>,
    #[serde(default)]
    pub contributors: Vec<Contributor>,
}

impl SourceSummary {
    /// "Title (Year)" as shown in result lists.
    pub fn display_title(&self) -> String {
        match &self.year {
            Some(year) if !year.is_empty() => format!("{} ({})", self.title, year),
            _ => self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentUpsert {
    pub doc_fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_style_id: Option<String>,
}

/// The service's record of a document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    #[serde(default)]
    pub doc_fingerprint: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active_style_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationCreate {
    pub doc_id: String,
    pub source_id: String,
    pub locator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CitationRecord {
    pub citation_uuid: String,
    pub doc_id: String,
    pub source_id: String,
    #[serde(default)]
    pub locator: Option<String>,
    #[serde(default)]
    pub note_type: Option<String>,
    #[serde(default)]
    pub doc_order: Option<i64>,
}

/// Metadata the renderer attaches to each output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RenderMetadata {
    #[serde(default)]
    pub render_hash: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub template_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Rendered content for one citation or aggregate entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RenderedCitation {
    #[serde(default)]
    pub plain_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub runs: Vec<TextRun>,
    #[serde(default, deserialize_with = "null_as_default_metadata")]
    pub metadata: RenderMetadata,
}

impl RenderedCitation {
    pub fn render_hash(&self) -> Option<&str> {
        self.metadata.render_hash.as_deref()
    }

    pub fn plain_text(&self) -> &str {
        self.plain_text.as_deref().unwrap_or_default()
    }
}

/// Response to a single-citation render.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CitationRender {
    #[serde(flatten)]
    pub render: RenderedCitation,
    #[serde(default, deserialize_with = "string_or_number")]
    pub style_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefreshItem {
    pub citation_uuid: String,
    #[serde(flatten)]
    pub render: RenderedCitation,
}

/// Response to a batched render: one item per recognized uuid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub items: Vec<RefreshItem>,
    /// Style version stamp for the whole batch.
    #[serde(default, deserialize_with = "string_or_number")]
    pub style_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AggregateItem {
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(flatten)]
    pub render: RenderedCitation,
}

/// Response to a bibliography or sources-list render.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AggregateResponse {
    #[serde(default)]
    pub items: Vec<AggregateItem>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub style_version: Option<String>,
}

impl AggregateResponse {
    /// Entries' plain text, one per line.
    pub fn joined_text(&self) -> String {
        self.items
            .iter()
            .map(|item| item.render.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidationIssue {
    pub citation_uuid: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
struct DocRequest<'a> {
    doc_id: &'a str,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct RenderCitationRequest<'a> {
    citation_uuid: &'a str,
    doc_id: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    doc_id: &'a str,
    citation_uuids: &'a [String],
}

#[derive(Debug, Serialize)]
struct SourcesListRequest<'a> {
    doc_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    grouping: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct DocumentEnvelope {
    document: DocumentRecord,
}

#[derive(Debug, Deserialize)]
struct CitationEnvelope {
    citation: CitationRecord,
}

#[derive(Debug, Deserialize)]
struct ItemsEnvelope<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct IssuesEnvelope {
    #[serde(default)]
    issues: Vec<ValidationIssue>,
}

/// Typed client for the remote citation service.
#[derive(Debug, Clone)]
pub struct RemoteService<T> {
    transport: T,
}

impl<T: Transport> RemoteService<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn get<R: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<R> {
        let value = self.transport.call(endpoint, None).await?;
        decode(endpoint, value)
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, endpoint: Endpoint, body: &B) -> Result<R> {
        let payload = serde_json::to_value(body)?;
        debug!(endpoint = %endpoint, "Calling remote service");
        let value = self.transport.call(endpoint, Some(payload)).await?;
        decode(endpoint, value)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.get(Endpoint::Health).await
    }

    pub async fn list_styles(&self) -> Result<Vec<StyleSummary>> {
        let envelope: ItemsEnvelope<StyleSummary> = self.get(Endpoint::ListStyles).await?;
        Ok(envelope.items)
    }

    /// Search sources by title. `limit` defaults to 20 and is clamped to 1..=100.
    pub async fn search_sources(&self, query: &str, limit: Option<u32>) -> Result<Vec<SourceSummary>> {
        let limit = limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);
        let envelope: ItemsEnvelope<SourceSummary> = self
            .post(Endpoint::SearchSources, &SearchRequest { q: query, limit })
            .await?;
        Ok(envelope.items)
    }

    /// Register a document by fingerprint. Idempotent on the service side.
    pub async fn upsert_document(&self, request: &DocumentUpsert) -> Result<DocumentRecord> {
        let envelope: DocumentEnvelope = self.post(Endpoint::UpsertDocument, request).await?;
        Ok(envelope.document)
    }

    pub async fn create_citation(&self, request: &CitationCreate) -> Result<CitationRecord> {
        let envelope: CitationEnvelope = self.post(Endpoint::CreateCitation, request).await?;
        Ok(envelope.citation)
    }

    /// Render one citation with the document's active style.
    pub async fn render_citation(&self, citation_uuid: &str, doc_id: &str) -> Result<CitationRender> {
        self.post(
            Endpoint::RenderCitation,
            &RenderCitationRequest {
                citation_uuid,
                doc_id,
            },
        )
        .await
    }

    /// Render many citations in one call. `citation_uuids` order is the
    /// document order the service records for them.
    pub async fn render_refresh(&self, doc_id: &str, citation_uuids: &[String]) -> Result<RefreshResponse> {
        self.post(
            Endpoint::RenderRefresh,
            &RefreshRequest {
                doc_id,
                citation_uuids,
            },
        )
        .await
    }

    pub async fn render_bibliography(&self, doc_id: &str) -> Result<AggregateResponse> {
        self.post(Endpoint::RenderBibliography, &DocRequest { doc_id })
            .await
    }

    pub async fn render_sources_list(
        &self,
        doc_id: &str,
        grouping: Option<&str>,
    ) -> Result<AggregateResponse> {
        self.post(
            Endpoint::RenderSourcesList,
            &SourcesListRequest { doc_id, grouping },
        )
        .await
    }

    /// Citations of a document whose source no longer exists, and similar.
    pub async fn validate_document(&self, doc_id: &str) -> Result<Vec<ValidationIssue>> {
        let envelope: IssuesEnvelope = self
            .post(Endpoint::ValidateDocument, &DocRequest { doc_id })
            .await?;
        Ok(envelope.issues)
    }
}

fn decode<R: DeserializeOwned>(endpoint: Endpoint, value: Value) -> Result<R> {
    serde_json::from_value(value).map_err(|e| RequestError::decode(endpoint, e.to_string()).into())
}

/// Style versions and years arrive as strings or numbers depending on the
/// backing store.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<TextRun>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<TextRun>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_metadata<'de, D>(deserializer: D) -> std::result::Result<RenderMetadata, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RenderMetadata>::deserialize(deserializer)?.unwrap_or_default())
}
