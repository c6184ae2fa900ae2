//! Bibliography and sources commands - rebuild aggregate regions

use anyhow::Result;
use quarto_citation_sync::AggregateKind;

use super::{DocArgs, GlobalArgs, block_on, finish, open};

pub fn execute(global: GlobalArgs, doc: DocArgs, kind: AggregateKind) -> Result<()> {
    block_on(async move {
        let sync = open(&global, &doc)?;
        let outcome = sync.upsert_aggregate(kind).await;
        let report = finish(&sync, &doc, outcome).await?;

        let verb = if report.created { "created" } else { "updated" };
        println!("{} {} ({} entries)", verb, report.region, report.items);
        Ok(())
    })
}
