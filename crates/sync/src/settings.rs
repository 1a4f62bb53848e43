//! Per-user settings persisted as JSON in the platform config directory.

use crate::error::Result;
use metahint_protocol::ActiveScopeSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const CONFIG_DIR_ENV: &str = "METAHINT_CONFIG_DIR";
pub const TOKEN_ENV: &str = "METAHINT_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Write token for the contents API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub active_scopes: ActiveScopeSet,
}

impl Settings {
    /// Missing file means defaults. An unreadable file is logged and also
    /// read as defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        match fs::read(path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(settings) => Ok(settings),
                Err(err) => {
                    log::warn!("Ignoring malformed settings {}: {err}", path.display());
                    Ok(Self::default())
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// `METAHINT_CONFIG_DIR`, else `<config dir>/metahint`.
#[must_use]
pub fn settings_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var(CONFIG_DIR_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::config_dir().map(|dir| dir.join("metahint"))
}

#[must_use]
pub fn settings_path() -> Option<PathBuf> {
    settings_dir().map(|dir| dir.join(SETTINGS_FILE_NAME))
}

/// First non-blank of: explicit flag, environment, settings file.
#[must_use]
pub fn resolve_token(
    flag: Option<&str>,
    env: Option<&str>,
    settings: &Settings,
) -> Option<String> {
    [flag, env, settings.token.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|token| !token.is_empty())
        .map(str::to_string)
}
