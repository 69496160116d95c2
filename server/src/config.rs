//! Config load/reload, following the teacher's `lobby::reload_config`
//! pattern exactly: plain `serde_json::from_str` over a file on disk,
//! replacing the whole in-memory value rather than merging field by field.

use crate::error::ServerError;
use protocol::Config;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

pub async fn load_config(path: &str) -> Result<Config, ServerError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|source| ServerError::ConfigRead {
            path: path.to_string(),
            source,
        })?;
    Config::from_json(&text).map_err(|source| ServerError::ConfigParse {
        path: path.to_string(),
        source,
    })
}

/// Re-reads `path` and swaps the whole config value behind the lock. Used
/// both at startup and by the `/reload` route.
pub async fn reload_config(config: &RwLock<Config>, path: &str) -> Result<(), ServerError> {
    let fresh = load_config(path).await?;
    let mut guard = config.write().await;
    *guard = fresh;
    Ok(())
}

pub fn shared(config: Config) -> Arc<RwLock<Config>> {
    Arc::new(RwLock::new(config))
}
