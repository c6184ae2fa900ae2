//! Config command - show or change client settings

use anyhow::Result;
use tracing::info;

use super::{GlobalArgs, effective_settings, settings_store};

pub fn show(global: GlobalArgs) -> Result<()> {
    let store = settings_store(&global)?;
    let settings = effective_settings(&global)?;

    println!("settings file: {}", store.path().display());
    println!("server_url:    {}", settings.base_url()?);
    println!("timeout_secs:  {}", settings.timeout_secs);
    Ok(())
}

pub fn set_server(global: GlobalArgs, url: String) -> Result<()> {
    let store = settings_store(&global)?;
    let settings = store.set_server_url(&url)?;

    info!(server_url = %settings.server_url, path = %store.path().display(), "Updated server URL");
    println!("server_url: {}", settings.server_url);
    Ok(())
}
