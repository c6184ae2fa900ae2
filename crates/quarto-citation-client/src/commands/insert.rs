//! Insert command - cite a source at the document's selection

use anyhow::Result;
use quarto_citation_sync::InsertOptions;

use super::{DocArgs, GlobalArgs, block_on, finish, open};

pub struct InsertArgs {
    pub doc: DocArgs,
    pub source_id: String,
    pub locator: Option<String>,
    pub note_type: Option<String>,
}

pub fn execute(global: GlobalArgs, args: InsertArgs) -> Result<()> {
    block_on(async move {
        let sync = open(&global, &args.doc)?;
        let options = InsertOptions {
            locator: args.locator,
            note_type: args.note_type,
        };
        let outcome = sync.insert_citation_with(&args.source_id, options).await;
        let inserted = finish(&sync, &args.doc, outcome).await?;

        println!(
            "{}\t{}\t{}",
            inserted.region, inserted.token.citation_uuid, inserted.token.cached_text
        );
        Ok(())
    })
}
