//! Lifecycle transitions of the active session.
//!
//! ```text
//! start ──► Created ──record start──► Recording ◄──record start── Stopped
//!                                        │                          ▲
//!                                        └────────record stop───────┘
//! end: any state with a file ──► Ended (pointer cleared)
//! ```
//!
//! `Created` has no file on disk; the first `record start` writes it.

use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;
use trail_config::UserConfig;
use trail_core::AppError;

use crate::state::{CommandEntry, DiffEntry, GitContext, LifecycleState, Session};
use crate::store::SessionStore;
use crate::validate::{new_session_id, validate_session_id};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordStartOutcome {
    /// First recording: the session file was created.
    Started(String),
    /// A stopped session resumed recording; history is kept.
    Resumed(String),
    AlreadyRecording(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordStopOutcome {
    Stopped { id: String, commands: usize },
    /// Informational: nothing changed.
    AlreadyStopped(String),
}

/// Drives transitions on the session named by the user config's active pointer.
///
/// Holds the config loaded once for this invocation and writes it back
/// whenever the pointer changes.
#[derive(Debug)]
pub struct SessionLifecycle {
    store: SessionStore,
    config: UserConfig,
    config_path: PathBuf,
}

impl SessionLifecycle {
    pub fn new(store: SessionStore, config: UserConfig, config_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            config,
            config_path: config_path.into(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn config(&self) -> &UserConfig {
        &self.config
    }

    pub fn active_id(&self) -> Option<&str> {
        SessionStore::active_id(&self.config)
    }

    fn require_active(&self) -> Result<String> {
        self.active_id()
            .map(ToOwned::to_owned)
            .ok_or_else(|| AppError::NoActiveSession.into())
    }

    fn set_pointer(&mut self, id: Option<String>) -> Result<()> {
        self.config.active_session = id;
        self.config.save_to(&self.config_path)
    }

    /// State of `id`: `Created` when the id has no file yet.
    pub fn state_of(&self, id: &str) -> Result<LifecycleState> {
        if !self.store.exists(id) {
            return Ok(LifecycleState::Created);
        }
        Ok(self.store.load(id)?.state())
    }

    /// The session `id`, or the active one when `id` is `None`.
    pub fn session(&self, id: Option<&str>) -> Result<Session> {
        let id = match id {
            Some(id) => id.to_string(),
            None => self.require_active()?,
        };
        self.store.load(&id)
    }

    /// Begin a new session and make it active.
    ///
    /// Refuses to replace an active session that has a file and has not ended,
    /// unless `force` is set.
    pub fn start(&mut self, force: bool) -> Result<String> {
        if let Some(active) = self.active_id().map(ToOwned::to_owned)
            && !force
            && self.store.exists(&active)
            && self.store.load(&active)?.state() != LifecycleState::Ended
        {
            return Err(AppError::AlreadyActive(active).into());
        }

        let id = new_session_id();
        self.set_pointer(Some(id.clone()))?;
        tracing::info!(session_id = %id, "Started session");
        Ok(id)
    }

    pub fn record_start(&mut self) -> Result<RecordStartOutcome> {
        let id = self.require_active()?;
        if !self.store.exists(&id) {
            self.store.save(&Session::new(id.as_str(), Utc::now()))?;
            return Ok(RecordStartOutcome::Started(id));
        }

        let mut session = self.store.load(&id)?;
        match session.state() {
            LifecycleState::Recording => Ok(RecordStartOutcome::AlreadyRecording(id)),
            LifecycleState::Stopped | LifecycleState::Created => {
                session.is_recording = true;
                self.store.save(&session)?;
                Ok(RecordStartOutcome::Resumed(id))
            }
            state @ LifecycleState::Ended => Err(AppError::InvalidTransition {
                action: "start recording".into(),
                state: state.to_string(),
            }
            .into()),
        }
    }

    /// Append a command to the active session. Only valid while recording.
    pub fn record_command(
        &self,
        command: &str,
        output: Option<String>,
        exit_code: Option<i32>,
    ) -> Result<Session> {
        let id = self.require_active()?;
        let state = self.state_of(&id)?;
        if state != LifecycleState::Recording {
            return Err(AppError::InvalidTransition {
                action: "record a command in".into(),
                state: state.to_string(),
            }
            .into());
        }

        let mut session = self.store.load(&id)?;
        session.commands.push(CommandEntry {
            command: command.to_string(),
            output,
            exit_code,
            recorded_at: Some(Utc::now()),
        });
        self.store.save(&session)?;
        Ok(session)
    }

    /// Stop recording, appending the working-tree diffs captured by the caller.
    pub fn record_stop(&self, diffs: Vec<DiffEntry>) -> Result<RecordStopOutcome> {
        let id = self.require_active()?;
        let mut session = self.store.load(&id)?;
        if session.state() != LifecycleState::Recording {
            return Ok(RecordStopOutcome::AlreadyStopped(id));
        }

        session.is_recording = false;
        session.diffs.extend(diffs);
        self.store.save(&session)?;
        Ok(RecordStopOutcome::Stopped {
            id,
            commands: session.commands.len(),
        })
    }

    pub fn resolve(&self, message: &str) -> Result<Session> {
        let id = self.require_active()?;
        let mut session = self.store.load(&id)?;
        session.resolution = Some(message.trim().to_string());
        self.store.save(&session)?;
        Ok(session)
    }

    /// End the active session and clear the pointer.
    pub fn end(&mut self) -> Result<Session> {
        let id = self.require_active()?;
        let mut session = self.store.load(&id)?;
        session.is_recording = false;
        if session.end_time.is_none() {
            session.end_time = Some(Utc::now());
        }
        self.store.save(&session)?;
        self.set_pointer(None)?;
        tracing::info!(session_id = %id, "Ended session");
        Ok(session)
    }

    /// Make `id` active. The caller fetches remote sessions beforehand.
    pub fn checkout(&mut self, id: &str) -> Result<()> {
        validate_session_id(id)?;
        if !self.store.exists(id) {
            return Err(AppError::SessionNotFound(id.to_string()).into());
        }
        self.set_pointer(Some(id.to_string()))
    }

    /// The active session ready for upload, with git context and refreshed
    /// metadata. Nothing is written; save after a successful push.
    pub fn prepare_push(&self, git: Option<GitContext>) -> Result<Session> {
        let id = self.require_active()?;
        let mut session = self.store.load(&id)?;
        if session.commands.is_empty() {
            return Err(AppError::EmptySession(id).into());
        }
        if git.is_some() {
            session.git_context = git;
        }
        session.refresh_metadata(Utc::now());
        Ok(session)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
