/*
 * reconcile.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Batch reconciliation of every embedded citation against the service.
 */

//! Batch reconciliation.
//!
//! Brings every citation region up to date in one remote call:
//!
//! 1. Read pass: one session lists the citation regions and decodes their
//!    tags. Regions whose tag does not decode are skipped.
//! 2. One batched render request for all surviving uuids, in document order.
//!    No uuids means no request and no write session.
//! 3. Write pass: one session updates each region the response covers.
//!    Uuids the service no longer knows, and regions deleted since the read
//!    pass, are left alone.
//!
//! The style version reported for the batch is stamped on every region the
//! batch updates.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::engine::CitationSync;
use crate::error::{Error, Result};
use crate::host::{DocumentSession, HostDocument, RegionId, RegionKind};
use crate::runs::write_runs;
use crate::service::RefreshItem;
use crate::token::{CitationToken, RegionTag, decode_tag, serialize_token};
use crate::transport::Transport;

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Citation regions found in the document.
    pub scanned: usize,
    /// Regions skipped because their tag did not decode.
    pub skipped_undecodable: usize,
    /// Uuids sent in the batch request.
    pub requested: usize,
    /// Regions rewritten from the response.
    pub updated: usize,
    /// Uuids the service did not return.
    pub missing_on_server: Vec<String>,
    /// Updated regions whose cached style version changed.
    pub restyled: usize,
    /// Regions that disappeared between the read and write passes.
    pub vanished: Vec<RegionId>,
}

struct Snapshot {
    region: RegionId,
    token: CitationToken,
}

impl<T: Transport, D: HostDocument> CitationSync<T, D> {
    /// Re-render every embedded citation in one batched request.
    pub async fn refresh_all(&self) -> Result<RefreshReport> {
        let document = self.register_document().await?;
        let mut report = RefreshReport::default();

        let snapshots = self.scan_citations(&mut report).await?;
        if snapshots.is_empty() {
            debug!(doc_id = %document.id, "No citation regions to refresh");
            return Ok(report);
        }

        let uuids: Vec<String> = snapshots
            .iter()
            .map(|s| s.token.citation_uuid.clone())
            .collect();
        report.requested = uuids.len();

        let response = self.service.render_refresh(&document.id, &uuids).await?;
        let style_version = response.style_version.as_deref();
        let by_uuid: HashMap<&str, &RefreshItem> = response
            .items
            .iter()
            .map(|item| (item.citation_uuid.as_str(), item))
            .collect();

        let mut session = self.document.session().await?;
        for snapshot in snapshots {
            let Snapshot { region, mut token } = snapshot;

            let Some(item) = by_uuid.get(token.citation_uuid.as_str()) else {
                warn!(
                    citation_uuid = %token.citation_uuid,
                    region = %region,
                    "Service did not return citation, leaving region unchanged"
                );
                report.missing_on_server.push(token.citation_uuid);
                continue;
            };

            let previous_version = token.cached_style_version.clone();
            token.update_with_render(&item.render, style_version);

            match apply_refresh(session.as_mut(), &region, &token, item) {
                Ok(()) => {}
                Err(Error::RegionNotFound(id)) => {
                    warn!(region = %id, "Citation region was removed during refresh");
                    report.vanished.push(id);
                    continue;
                }
                Err(e) => return Err(e),
            }

            if token.cached_style_version != previous_version {
                report.restyled += 1;
            }
            report.updated += 1;
            debug!(citation_uuid = %token.citation_uuid, region = %region, "Refreshed citation");
        }
        session.sync().await?;

        info!(
            doc_id = %document.id,
            scanned = report.scanned,
            updated = report.updated,
            missing = report.missing_on_server.len(),
            skipped = report.skipped_undecodable,
            "Refreshed citations"
        );
        Ok(report)
    }

    /// Read pass: decode every citation region's tag.
    async fn scan_citations(&self, report: &mut RefreshReport) -> Result<Vec<Snapshot>> {
        let mut session = self.document.session().await?;
        let regions = session.regions_of_kind(RegionKind::Citation)?;
        session.sync().await?;

        report.scanned = regions.len();
        let mut snapshots = Vec::with_capacity(regions.len());
        for info in regions {
            match decode_tag(info.tag.as_deref()) {
                RegionTag::Citation(token) => snapshots.push(Snapshot {
                    region: info.id,
                    token,
                }),
                other => {
                    warn!(region = %info.id, tag = ?other, "Skipping citation region with unusable tag");
                    report.skipped_undecodable += 1;
                }
            }
        }
        Ok(snapshots)
    }
}

fn apply_refresh(
    session: &mut dyn DocumentSession,
    region: &RegionId,
    token: &CitationToken,
    item: &RefreshItem,
) -> Result<()> {
    session.set_region_tag(region, &serialize_token(token))?;
    write_runs(session, region, &item.render.runs, item.render.plain_text())
}
