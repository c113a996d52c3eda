//! Optional tool settings (`settings.toml` next to `config.json`).
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! `TRAIL_API_URL` overrides `remote.api_url`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const API_URL_ENV: &str = "TRAIL_API_URL";
pub const DEBUG_ENV: &str = "TRAIL_DEBUG";

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NETWORK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;
const MAX_DEFAULT_PARALLEL: usize = 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub detection: DetectionSettings,
    #[serde(default)]
    pub remote: RemoteSettings,
    #[serde(default)]
    pub ai: AiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Lint executable, invoked as `<lint_program> --format json <file>`.
    pub lint_program: String,
    /// Syntax checker, invoked as `<syntax_program> --check <file>`.
    pub syntax_program: String,
    pub timeout_secs: u64,
    /// Concurrent files when scanning the working tree. None = min(cores, 4).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<usize>,
    /// File extensions considered when scanning the working tree.
    pub extensions: Vec<String>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            lint_program: "eslint".to_string(),
            syntax_program: "node".to_string(),
            timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
            max_parallel: None,
            extensions: ["js", "mjs", "cjs", "jsx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl DetectionSettings {
    pub fn parallelism(&self) -> usize {
        self.max_parallel.filter(|n| *n > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(MAX_DEFAULT_PARALLEL)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub api_url: String,
    pub timeout_secs: u64,
    /// Timeout for cloud AI suggestions, which are slower than lookups.
    pub ai_timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_NETWORK_TIMEOUT_SECS,
            ai_timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// Local AI backend executable, invoked as `<local_program> run <model> <prompt>`.
    pub local_program: String,
    pub default_model: String,
    pub timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            local_program: "ollama".to_string(),
            default_model: "llama3".to_string(),
            timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Load from the default location with environment overrides applied.
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&crate::paths::settings_path()?)?;
        settings.apply_env_overrides(std::env::var(API_URL_ENV).ok());
        Ok(settings)
    }

    /// Load from `path`; `Default` if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))
    }

    fn apply_env_overrides(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            self.remote.api_url = url;
        }
    }

    /// Generate default settings TOML with comments as a template.
    pub fn default_template() -> String {
        r#"# trail settings
# Every key is optional; defaults are shown.

[detection]
lint_program = "eslint"     # run as: eslint --format json <file>
syntax_program = "node"     # run as: node --check <file>
timeout_secs = 10
# max_parallel = 4          # default: min(cores, 4)
extensions = ["js", "mjs", "cjs", "jsx"]

[remote]
api_url = "http://localhost:3000"   # TRAIL_API_URL overrides
timeout_secs = 30
ai_timeout_secs = 60

[ai]
local_program = "ollama"
default_model = "llama3"
timeout_secs = 60
"#
        .to_string()
    }
}

/// Whether verbose diagnostics were requested via `TRAIL_DEBUG`.
pub fn debug_enabled() -> bool {
    parse_debug_flag(std::env::var(DEBUG_ENV).ok().as_deref())
}

fn parse_debug_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
