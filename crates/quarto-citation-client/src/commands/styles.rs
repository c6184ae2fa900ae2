//! Styles command - list citation styles known to the service

use anyhow::Result;
use quarto_citation_sync::RemoteService;

use super::{GlobalArgs, block_on, transport};

pub fn execute(global: GlobalArgs) -> Result<()> {
    block_on(async move {
        let service = RemoteService::new(transport(&global)?);
        for style in service.list_styles().await? {
            match &style.version {
                Some(version) => println!("{}\t{} (v{})", style.id, style.name, version),
                None => println!("{}\t{}", style.id, style.name),
            }
        }
        Ok(())
    })
}
