//! Search command - find sources by text

use anyhow::Result;
use quarto_citation_sync::RemoteService;

use super::{GlobalArgs, block_on, transport};

pub fn execute(global: GlobalArgs, query: String, limit: Option<u32>) -> Result<()> {
    block_on(async move {
        let service = RemoteService::new(transport(&global)?);
        let hits = service.search_sources(&query, limit).await?;
        if hits.is_empty() {
            println!("No sources match '{}'", query);
        }
        for hit in hits {
            let kind = hit.source_type.as_deref().unwrap_or("source");
            println!("{}\t{}\t{}", hit.id, kind, hit.display_title());
        }
        Ok(())
    })
}
