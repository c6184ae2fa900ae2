/*
 * transport.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Transport contract for the remote citation service.
 */

//! Transport contract.
//!
//! A [`Transport`] moves one JSON payload to one [`Endpoint`] and returns the
//! JSON response. Timeouts, connection reuse and the server address belong to
//! the implementation; the engine only sees success or a [`RequestError`].

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Remote operations the engine can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Health,
    ListStyles,
    SearchSources,
    UpsertDocument,
    CreateCitation,
    RenderCitation,
    RenderRefresh,
    RenderBibliography,
    RenderSourcesList,
    ValidateDocument,
}

impl Endpoint {
    pub fn method(self) -> Method {
        match self {
            Endpoint::Health | Endpoint::ListStyles => Method::Get,
            _ => Method::Post,
        }
    }

    /// Path relative to the service base address.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Health => "/api/health",
            Endpoint::ListStyles => "/api/styles",
            Endpoint::SearchSources => "/api/sources/search",
            Endpoint::UpsertDocument => "/api/documents/upsert",
            Endpoint::CreateCitation => "/api/citations/create",
            Endpoint::RenderCitation => "/api/render/citation",
            Endpoint::RenderRefresh => "/api/render/refresh",
            Endpoint::RenderBibliography => "/api/render/bibliography",
            Endpoint::RenderSourcesList => "/api/render/sourceslist",
            Endpoint::ValidateDocument => "/api/validate/document",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Why a request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestErrorKind {
    /// The service could not be reached.
    Unreachable(String),
    /// The service answered with a non-success status.
    Status { status: u16, detail: String },
    /// The response did not have the expected shape.
    Decode(String),
}

/// A failed remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{endpoint}: {}", describe(.kind))]
pub struct RequestError {
    pub endpoint: Endpoint,
    pub kind: RequestErrorKind,
}

fn describe(kind: &RequestErrorKind) -> String {
    match kind {
        RequestErrorKind::Unreachable(msg) => format!("service unreachable: {}", msg),
        RequestErrorKind::Status { status, detail } => format!("HTTP {}: {}", status, detail),
        RequestErrorKind::Decode(msg) => format!("unexpected response: {}", msg),
    }
}

impl RequestError {
    pub fn unreachable(endpoint: Endpoint, msg: impl Into<String>) -> Self {
        Self {
            endpoint,
            kind: RequestErrorKind::Unreachable(msg.into()),
        }
    }

    /// Non-success response. An empty body becomes `request_failed`.
    pub fn status(endpoint: Endpoint, status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let detail = if detail.trim().is_empty() {
            "request_failed".to_string()
        } else {
            detail
        };
        Self {
            endpoint,
            kind: RequestErrorKind::Status { status, detail },
        }
    }

    pub fn decode(endpoint: Endpoint, msg: impl Into<String>) -> Self {
        Self {
            endpoint,
            kind: RequestErrorKind::Decode(msg.into()),
        }
    }

    /// Server-provided detail text, if the server answered.
    pub fn detail(&self) -> Option<&str> {
        match &self.kind {
            RequestErrorKind::Status { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

/// Carries JSON payloads to the remote service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Call `endpoint`. `payload` is `None` for bodiless requests.
    async fn call(&self, endpoint: Endpoint, payload: Option<Value>) -> Result<Value, RequestError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn call(&self, endpoint: Endpoint, payload: Option<Value>) -> Result<Value, RequestError> {
        (**self).call(endpoint, payload).await
    }
}
