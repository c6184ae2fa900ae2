//! Refresh command - re-render every citation in a document

use anyhow::Result;

use super::{DocArgs, GlobalArgs, block_on, finish, open};

pub fn execute(global: GlobalArgs, doc: DocArgs) -> Result<()> {
    block_on(async move {
        let sync = open(&global, &doc)?;
        let outcome = sync.refresh_all().await;
        let report = finish(&sync, &doc, outcome).await?;

        println!(
            "scanned {}, updated {}, restyled {}, skipped {}",
            report.scanned, report.updated, report.restyled, report.skipped_undecodable
        );
        for uuid in &report.missing_on_server {
            println!("missing on server: {}", uuid);
        }
        for region in &report.vanished {
            println!("removed during refresh: {}", region);
        }
        Ok(())
    })
}
