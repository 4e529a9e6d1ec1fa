use std::path::Path;
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::{Error, Result};

pub const TOKEN_ENV_VAR: &str = "PHOTO_ORGANIZER_TOKEN";

/// Resolve the bearer token: `remote.access_token`, then
/// `PHOTO_ORGANIZER_TOKEN`, then the token file at `remote.token_path`.
pub fn load_access_token(config: &RemoteConfig) -> Result<String> {
    resolve_token(
        config.access_token.as_deref(),
        std::env::var(TOKEN_ENV_VAR).ok(),
        &config.token_path,
    )
}

fn resolve_token(configured: Option<&str>, env: Option<String>, token_path: &Path) -> Result<String> {
    if let Some(token) = configured.filter(|t| !t.trim().is_empty()) {
        debug!("Using access token from config");
        return Ok(token.trim().to_string());
    }
    if let Some(token) = env.filter(|t| !t.trim().is_empty()) {
        debug!("Using access token from {}", TOKEN_ENV_VAR);
        return Ok(token.trim().to_string());
    }
    read_token_file(token_path)
}

/// Token files hold the token under `token` (installed-app flow) or
/// `access_token` (raw OAuth response).
fn read_token_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::MissingCredentials(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;

    ["token", "access_token"]
        .iter()
        .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(|t| {
            debug!("Using access token from {}", path.display());
            t.to_string()
        })
        .ok_or_else(|| Error::MissingCredentials(path.to_path_buf()))
}
