//! Scripted stand-in for the remote citation service.
//!
//! `FakeTransport` answers every endpoint from a small in-memory model of the
//! service (documents by fingerprint, citations, sources, one active style)
//! and records each call so tests can count round trips.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use quarto_citation_sync::{
    Endpoint, InMemoryDocument, RegionId, RequestError, Transport,
};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct FakeSource {
    pub author: String,
    pub title: String,
    pub year: String,
    pub source_type: String,
}

#[derive(Debug, Clone)]
pub struct FakeCitation {
    pub uuid: String,
    pub doc_id: String,
    pub source_id: String,
    pub locator: Option<String>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub calls: Vec<(Endpoint, Option<Value>)>,
    pub documents: HashMap<String, String>,
    pub citations: Vec<FakeCitation>,
    pub sources: HashMap<String, FakeSource>,
    pub style_version: u64,
    pub failing: HashMap<Endpoint, (u16, String)>,
    /// Citations the service pretends not to know in refresh responses.
    pub forgotten: HashSet<String>,
    next_id: u64,
}

impl FakeState {
    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn render(&self, citation: &FakeCitation) -> Value {
        let source = &self.sources[&citation.source_id];
        let mut runs = vec![
            json!({"text": source.author, "italic": true}),
            json!({"text": format!(", {}", source.year)}),
        ];
        if let Some(locator) = &citation.locator {
            runs.push(json!({"text": format!(", {}", locator)}));
        }
        let plain: String = runs
            .iter()
            .map(|r| r["text"].as_str().unwrap_or_default())
            .collect();
        json!({
            "plain_text": plain,
            "runs": runs,
            "metadata": {
                "variant": "first",
                "template_key": "note_first",
                "render_hash": format!("{}:{}", self.style_version, plain),
            }
        })
    }

    fn cited_sources(&self, doc_id: &str) -> Vec<(String, FakeSource)> {
        let mut seen = HashSet::new();
        self.citations
            .iter()
            .filter(|c| c.doc_id == doc_id && seen.insert(c.source_id.clone()))
            .map(|c| (c.source_id.clone(), self.sources[&c.source_id].clone()))
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
    remove_on_refresh: Arc<Mutex<Option<(InMemoryDocument, RegionId)>>>,
}

impl FakeTransport {
    /// A service knowing sources S1 (secondary) and S2 (archive), style version 1.
    pub fn new() -> Self {
        let transport = Self::default();
        {
            let mut state = transport.state();
            state.style_version = 1;
            state.sources.insert(
                "S1".to_string(),
                FakeSource {
                    author: "Smith".to_string(),
                    title: "Roman Roads".to_string(),
                    year: "2020".to_string(),
                    source_type: "book".to_string(),
                },
            );
            state.sources.insert(
                "S2".to_string(),
                FakeSource {
                    author: "Archivio di Stato".to_string(),
                    title: "Fondo Notarile".to_string(),
                    year: "1750".to_string(),
                    source_type: "archive".to_string(),
                },
            );
        }
        transport
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<Option<Value>> {
        self.state()
            .calls
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub fn fail(&self, endpoint: Endpoint, status: u16, detail: &str) {
        self.state()
            .failing
            .insert(endpoint, (status, detail.to_string()));
    }

    pub fn forget(&self, citation_uuid: &str) {
        self.state().forgotten.insert(citation_uuid.to_string());
    }

    /// Delete `region` from `document` while the refresh request is in flight.
    pub fn remove_region_during_refresh(&self, document: InMemoryDocument, region: RegionId) {
        *self.remove_on_refresh.lock().unwrap() = Some((document, region));
    }

    fn respond(&self, endpoint: Endpoint, payload: Option<Value>) -> Result<Value, RequestError> {
        let mut state = self.state();
        state.calls.push((endpoint, payload.clone()));

        if let Some((status, detail)) = state.failing.get(&endpoint) {
            return Err(RequestError::status(endpoint, *status, detail.clone()));
        }

        let body = payload.unwrap_or(Value::Null);
        let str_field = |name: &str| body[name].as_str().unwrap_or_default().to_string();

        let response = match endpoint {
            Endpoint::Health => json!({"status": "ok"}),
            Endpoint::ListStyles => json!({"items": [
                {"id": "chicago", "name": "Chicago Notes", "version": state.style_version, "built_in": 1}
            ]}),
            Endpoint::SearchSources => {
                let q = str_field("q").to_lowercase();
                let mut items: Vec<Value> = state
                    .sources
                    .iter()
                    .filter(|(_, s)| s.title.to_lowercase().contains(&q))
                    .map(|(id, s)| json!({"id": id, "title": s.title, "type": s.source_type, "year": s.year}))
                    .collect();
                items.sort_by(|a, b| a["title"].as_str().cmp(&b["title"].as_str()));
                json!({ "items": items })
            }
            Endpoint::UpsertDocument => {
                let fingerprint = str_field("doc_fingerprint");
                let id = match state.documents.get(&fingerprint) {
                    Some(id) => id.clone(),
                    None => {
                        let id = state.next("doc");
                        state.documents.insert(fingerprint.clone(), id.clone());
                        id
                    }
                };
                json!({"document": {
                    "id": id,
                    "doc_fingerprint": fingerprint,
                    "name": body["name"],
                    "active_style_id": "chicago"
                }})
            }
            Endpoint::CreateCitation => {
                let citation = FakeCitation {
                    uuid: state.next("cit"),
                    doc_id: str_field("doc_id"),
                    source_id: str_field("source_id"),
                    locator: body["locator"].as_str().map(str::to_string),
                };
                state.citations.push(citation.clone());
                json!({"citation": {
                    "citation_uuid": citation.uuid,
                    "doc_id": citation.doc_id,
                    "source_id": citation.source_id,
                    "locator": citation.locator,
                    "note_type": null,
                    "doc_order": state.citations.len(),
                }})
            }
            Endpoint::RenderCitation => {
                let uuid = str_field("citation_uuid");
                let Some(citation) = state.citations.iter().find(|c| c.uuid == uuid) else {
                    return Err(RequestError::status(endpoint, 404, "citation_not_found"));
                };
                let mut render = state.render(citation);
                render["style_version"] = json!(state.style_version.to_string());
                render
            }
            Endpoint::RenderRefresh => {
                let wanted: Vec<String> = body["citation_uuids"]
                    .as_array()
                    .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                    .unwrap_or_default();
                let items: Vec<Value> = wanted
                    .iter()
                    .filter(|uuid| !state.forgotten.contains(*uuid))
                    .filter_map(|uuid| state.citations.iter().find(|c| &c.uuid == uuid))
                    .map(|citation| {
                        let mut item = state.render(citation);
                        item["citation_uuid"] = json!(citation.uuid);
                        item
                    })
                    .collect();
                json!({"items": items, "style_version": state.style_version})
            }
            Endpoint::RenderBibliography | Endpoint::RenderSourcesList => {
                let primary_only = endpoint == Endpoint::RenderSourcesList;
                let items: Vec<Value> = state
                    .cited_sources(&str_field("doc_id"))
                    .into_iter()
                    .filter(|(_, s)| !primary_only || s.source_type == "archive")
                    .map(|(id, s)| json!({
                        "source_id": id,
                        "plain_text": format!("{}. {}. {}.", s.author, s.title, s.year),
                        "runs": [],
                        "metadata": {"variant": "bibliography"}
                    }))
                    .collect();
                json!({"items": items, "style_version": state.style_version})
            }
            Endpoint::ValidateDocument => {
                let doc_id = str_field("doc_id");
                let issues: Vec<Value> = state
                    .citations
                    .iter()
                    .filter(|c| c.doc_id == doc_id && !state.sources.contains_key(&c.source_id))
                    .map(|c| json!({"citation_uuid": c.uuid, "error": "missing_source"}))
                    .collect();
                json!({ "issues": issues })
            }
        };
        Ok(response)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn call(&self, endpoint: Endpoint, payload: Option<Value>) -> Result<Value, RequestError> {
        if endpoint == Endpoint::RenderRefresh {
            let pending = self.remove_on_refresh.lock().unwrap().take();
            if let Some((document, region)) = pending {
                document.edit(|state| state.remove_region(&region)).await;
            }
        }
        self.respond(endpoint, payload)
    }
}
