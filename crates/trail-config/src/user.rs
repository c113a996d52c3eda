//! Per-user config (`config.json`): the active session pointer and the auth token.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::atomic::atomic_write;

/// Environment variable that overrides the stored token.
pub const TOKEN_ENV: &str = "TRAIL_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl UserConfig {
    /// Load from the default location, creating an empty file on first access.
    pub fn load() -> Result<Self> {
        Self::load_from(&crate::paths::user_config_path()?)
    }

    /// Load from `path`, creating an empty config there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::debug!(path = %path.display(), "Created user config");
            return Ok(config);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read user config: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse user config: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&crate::paths::user_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize user config")?;
        atomic_write(path, contents.as_bytes())
    }

    /// Token to authenticate with: `TRAIL_TOKEN` wins over the stored one.
    pub fn resolve_token(&self) -> Option<String> {
        pick_token(std::env::var(TOKEN_ENV).ok(), self.token.as_deref())
    }
}

fn pick_token(env_token: Option<String>, stored: Option<&str>) -> Option<String> {
    env_token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            stored
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToOwned::to_owned)
        })
}
