//! Validate command - ask the service to check a document's citations

use anyhow::{Result, bail};

use super::{DocArgs, GlobalArgs, block_on, finish, open};

pub fn execute(global: GlobalArgs, doc: DocArgs) -> Result<()> {
    block_on(async move {
        let sync = open(&global, &doc)?;
        let outcome = sync.validate_document().await;
        let issues = finish(&sync, &doc, outcome).await?;

        if issues.is_empty() {
            println!("No issues found");
            return Ok(());
        }
        for issue in &issues {
            println!("{}\t{}", issue.citation_uuid, issue.error);
        }
        bail!("{} citation(s) failed validation", issues.len());
    })
}
