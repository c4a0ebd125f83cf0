//! Environment/runtime helpers
//!
//! Sanity checks run once at startup, before the store is opened.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the directory holding the backing file exists.
///
/// A bare file name (the default `rest.json`) lives in the working directory,
/// which always exists, so nothing is created in that case.
pub async fn ensure_env(database_file: &Path) -> anyhow::Result<()> {
    let Some(parent) = database_file.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if tokio::fs::metadata(parent).await.is_err() {
        info!(dir = %parent.display(), "creating data directory");
    }
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    if tokio::fs::metadata(database_file).await.is_err() {
        warn!(path = %database_file.display(), "database file not found; starting with an empty store");
    }
    Ok(())
}
