//! Aggregate list regions (bibliography, sources list).
//!
//! An aggregate region holds server-computed content that is replaced
//! wholesale on every update. The region is created at the end of the body
//! the first time and reused afterwards; there is never more than one region
//! of a kind created by this module.

use tracing::info;

use crate::engine::CitationSync;
use crate::error::Result;
use crate::host::{HostDocument, RegionId, RegionKind};
use crate::runs::write_text;
use crate::transport::Transport;

/// Which aggregate to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Bibliography,
    /// Primary sources only (classical texts, archival material).
    SourcesList,
}

impl AggregateKind {
    pub fn region_kind(self) -> RegionKind {
        match self {
            AggregateKind::Bibliography => RegionKind::Bibliography,
            AggregateKind::SourcesList => RegionKind::SourcesList,
        }
    }
}

/// What an aggregate upsert did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateReport {
    pub region: RegionId,
    /// True when the region did not exist before this call.
    pub created: bool,
    pub items: usize,
}

impl<T: Transport, D: HostDocument> CitationSync<T, D> {
    pub async fn upsert_bibliography(&self) -> Result<AggregateReport> {
        self.upsert_aggregate(AggregateKind::Bibliography).await
    }

    pub async fn upsert_sources_list(&self) -> Result<AggregateReport> {
        self.upsert_aggregate(AggregateKind::SourcesList).await
    }

    /// Render `kind` on the service and replace the document's region with it.
    pub async fn upsert_aggregate(&self, kind: AggregateKind) -> Result<AggregateReport> {
        let document = self.register_document().await?;
        let response = match kind {
            AggregateKind::Bibliography => self.service.render_bibliography(&document.id).await?,
            AggregateKind::SourcesList => {
                self.service
                    .render_sources_list(&document.id, None)
                    .await?
            }
        };
        let text = response.joined_text();

        let region_kind = kind.region_kind();
        let mut session = self.document.session().await?;
        let (region, created) = match session.first_region_of_kind(region_kind)? {
            Some(existing) => (existing, false),
            None => (session.append_body_region(region_kind)?, true),
        };
        write_text(session.as_mut(), &region, &text)?;
        session.sync().await?;

        info!(
            doc_id = %document.id,
            kind = ?kind,
            region = %region,
            created,
            items = response.items.len(),
            "Updated aggregate region"
        );
        Ok(AggregateReport {
            region,
            created,
            items: response.items.len(),
        })
    }
}
