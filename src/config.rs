use anyhow::Result;
use std::path::PathBuf;

/// Default directory for persisted workspace trees
pub fn default_state_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine user data directory"))?;
    Ok(data_dir.join("write-assistant").join("workspaces"))
}
