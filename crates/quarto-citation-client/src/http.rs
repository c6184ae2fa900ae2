/*
 * http.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * reqwest-backed transport for the citation service.
 */

use std::time::Duration;

use async_trait::async_trait;
use quarto_citation_sync::{Endpoint, Method, RequestError, Transport};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::settings::ClientSettings;

/// Talks JSON over HTTP to the citation service.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let base_url = settings.base_url()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, endpoint: Endpoint, payload: Option<Value>) -> std::result::Result<Value, RequestError> {
        let url = self.url(endpoint);
        debug!(%endpoint, %url, "Calling citation service");

        let request = match endpoint.method() {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url).json(&payload.unwrap_or(Value::Null)),
        };

        let response = request
            .send()
            .await
            .map_err(|e| RequestError::unreachable(endpoint, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%endpoint, status = status.as_u16(), "Citation service returned an error");
            return Err(RequestError::status(endpoint, status.as_u16(), error_detail(&body)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| RequestError::decode(endpoint, e.to_string()))
    }
}

/// Extract `detail` from an error body, or fall back to the raw text.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => body.trim().to_string(),
        },
        _ => body.trim().to_string(),
    }
}
