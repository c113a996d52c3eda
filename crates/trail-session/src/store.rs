//! On-disk session storage: one JSON file per session.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use trail_config::{UserConfig, atomic_write};
use trail_core::AppError;

use crate::state::Session;
use crate::validate::validate_session_id;

const SESSION_EXT: &str = "json";

/// Owns `<sessions-dir>/<id>.json`.
///
/// Every write is an atomic replace, so readers only ever see the previous
/// or the new complete file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the default sessions directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(trail_config::paths::sessions_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{SESSION_EXT}"))
    }

    /// Whether a local file exists for `id`. Invalid ids never exist.
    pub fn exists(&self, id: &str) -> bool {
        validate_session_id(id).is_ok() && self.path_for(id).is_file()
    }

    pub fn load(&self, id: &str) -> Result<Session> {
        validate_session_id(id)?;
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(AppError::SessionNotFound(id.to_string()).into());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        let session: Session = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session file: {}", path.display()))?;

        if session.id != id {
            tracing::warn!(
                file_id = %id,
                stored_id = %session.id,
                "Session file name and stored id differ"
            );
        }
        Ok(session)
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        validate_session_id(&session.id)?;
        let path = self.path_for(&session.id);
        let contents =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;
        atomic_write(&path, contents.as_bytes())?;
        tracing::debug!(session_id = %session.id, path = %path.display(), "Saved session");
        Ok(())
    }

    /// All readable sessions, oldest first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<Session>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).with_context(|| {
            format!("Failed to read sessions directory: {}", self.dir.display())
        })?;

        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SESSION_EXT) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.load(id) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable session");
                }
            }
        }

        sessions.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        Ok(sessions)
    }

    /// The active session id, held in the user config rather than in any session file.
    pub fn active_id(config: &UserConfig) -> Option<&str> {
        config
            .active_session
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
