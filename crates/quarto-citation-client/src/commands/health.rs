//! Health command - check the citation service

use anyhow::{Result, bail};
use quarto_citation_sync::{CitationSync, ConnectionStatus, InMemoryDocument};

use super::{GlobalArgs, block_on, transport};

pub fn execute(global: GlobalArgs) -> Result<()> {
    block_on(async move {
        let transport = transport(&global)?;
        let base_url = transport.base_url().to_string();
        let sync = CitationSync::new(transport, InMemoryDocument::new());

        let status = sync.check_connection().await;
        match &status {
            ConnectionStatus::Connected => println!("{} ({})", status.message(), base_url),
            ConnectionStatus::ServerError(detail) | ConnectionStatus::NotConnected(detail) => {
                println!("{} ({}): {}", status.message(), base_url, detail)
            }
        }

        if !status.is_connected() {
            bail!("citation service at {} is not available", base_url);
        }
        Ok(())
    })
}
