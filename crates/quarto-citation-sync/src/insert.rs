//! Citation insertion pipeline.
//!
//! register document → create citation → render it → build token → embed.
//! Each step needs the previous step's result. Nothing touches the document
//! until the render has succeeded; a failure while embedding leaves a
//! server-side citation without a region, which is harmless.

use tracing::info;

use crate::engine::CitationSync;
use crate::error::Result;
use crate::host::{HostDocument, RegionId, RegionKind};
use crate::runs::write_runs;
use crate::service::CitationCreate;
use crate::token::{CitationToken, TokenFields, build_token, serialize_token};
use crate::transport::Transport;

/// A citation that was just embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedCitation {
    pub region: RegionId,
    pub token: CitationToken,
}

/// Optional settings for a new citation.
#[derive(Debug, Clone, Default)]
pub struct InsertOptions {
    pub locator: Option<String>,
    /// Passed through to the service (e.g. "footnote").
    pub note_type: Option<String>,
}

impl<T: Transport, D: HostDocument> CitationSync<T, D> {
    /// Cite `source_id` at the current selection.
    pub async fn insert_citation(&self, source_id: &str, locator: Option<&str>) -> Result<InsertedCitation> {
        self.insert_citation_with(
            source_id,
            InsertOptions {
                locator: locator.map(str::to_string),
                note_type: None,
            },
        )
        .await
    }

    pub async fn insert_citation_with(
        &self,
        source_id: &str,
        options: InsertOptions,
    ) -> Result<InsertedCitation> {
        let document = self.register_document().await?;
        let locator = options.locator.filter(|l| !l.is_empty());

        let citation = self
            .service
            .create_citation(&CitationCreate {
                doc_id: document.id.clone(),
                source_id: source_id.to_string(),
                locator: locator.clone(),
                note_type: options.note_type,
            })
            .await?;

        let rendered = self
            .service
            .render_citation(&citation.citation_uuid, &document.id)
            .await?;

        let mut token = build_token(TokenFields {
            citation_uuid: citation.citation_uuid,
            source_id: source_id.to_string(),
            doc_id: document.id,
            style_id: document.active_style_id.unwrap_or_default(),
            locator,
            ..Default::default()
        });
        token.update_with_render(&rendered.render, rendered.style_version.as_deref());

        let mut session = self.document.session().await?;
        let region = session.insert_note_region(RegionKind::Citation)?;
        session.set_region_tag(&region, &serialize_token(&token))?;
        write_runs(
            session.as_mut(),
            &region,
            &rendered.render.runs,
            rendered.render.plain_text(),
        )?;
        session.sync().await?;

        info!(
            citation_uuid = %token.citation_uuid,
            source_id = %token.source_id,
            region = %region,
            "Inserted citation"
        );
        Ok(InsertedCitation { region, token })
    }
}
