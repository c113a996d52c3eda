//! Session model types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One debugging investigation as persisted in `<sessions-dir>/<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Filesystem- and URL-safe identifier (a ULID for locally created sessions)
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// Set once by `end`. Never set while recording.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_recording: bool,

    /// Append-only while recording.
    #[serde(default)]
    pub commands: Vec<CommandEntry>,

    #[serde(default)]
    pub diffs: Vec<DiffEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    /// Present only once the session has been prepared for push.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SessionMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_context: Option<GitContext>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEntry {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub file_path: String,
    pub diff: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Resolved,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

/// Repository state captured at push time. Every field is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

impl GitContext {
    pub fn is_empty(&self) -> bool {
        self.branch.is_none() && self.commit.is_none() && self.remote.is_none()
    }
}

/// Where a session is in its lifecycle.
///
/// `Created` has no file yet: the id exists only as the active pointer.
/// Whether a session was pushed is orthogonal; see [`Session::is_pushed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Recording,
    Stopped,
    Ended,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "not yet recording"),
            Self::Recording => write!(f, "recording"),
            Self::Stopped => write!(f, "stopped"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

impl Session {
    /// A freshly recorded session: recording, no history.
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            start_time: Some(now),
            end_time: None,
            is_recording: true,
            commands: Vec::new(),
            diffs: Vec::new(),
            resolution: None,
            metadata: None,
            git_context: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        if self.end_time.is_some() {
            LifecycleState::Ended
        } else if self.is_recording {
            LifecycleState::Recording
        } else {
            LifecycleState::Stopped
        }
    }

    pub fn is_pushed(&self) -> bool {
        self.metadata.is_some()
    }

    /// Status reported to the remote: resolved once a resolution is recorded.
    pub fn derived_status(&self) -> SessionStatus {
        match self.resolution.as_deref().map(str::trim) {
            Some(r) if !r.is_empty() => SessionStatus::Resolved,
            _ => SessionStatus::Active,
        }
    }

    /// Create or refresh push metadata. `createdAt` survives refreshes.
    pub fn refresh_metadata(&mut self, now: DateTime<Utc>) {
        let status = self.derived_status();
        match &mut self.metadata {
            Some(meta) => {
                meta.updated_at = now;
                meta.status = status;
            }
            None => {
                self.metadata = Some(SessionMetadata {
                    created_at: now,
                    updated_at: now,
                    status,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_state_derivation() {
        let mut session = Session::new("abc", at(0));
        assert_eq!(session.state(), LifecycleState::Recording);
        session.is_recording = false;
        assert_eq!(session.state(), LifecycleState::Stopped);
        session.end_time = Some(at(10));
        assert_eq!(session.state(), LifecycleState::Ended);
        assert!(!session.is_pushed());
    }

    #[test]
    fn test_serializes_camel_case_and_omits_absent_fields() {
        let mut session = Session::new("abc", at(0));
        session.commands.push(CommandEntry {
            command: "npm test".into(),
            output: Some("1 failing".into()),
            exit_code: Some(1),
            recorded_at: None,
        });

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["isRecording"], true);
        assert_eq!(value["commands"][0]["exitCode"], 1);
        assert!(value["commands"][0].get("recordedAt").is_none());
        assert!(value.get("endTime").is_none());
        assert!(value.get("metadata").is_none());
        assert!(value.get("startTime").is_some());
    }

    #[test]
    fn test_loads_minimal_and_unknown_keys() {
        let raw = r#"{
            "id": "remote-1",
            "commands": [{"command": "node app.js"}],
            "extra": {"ignored": true}
        }"#;
        let session: Session = serde_json::from_str(raw).unwrap();
        assert_eq!(session.id, "remote-1");
        assert!(!session.is_recording);
        assert_eq!(session.commands[0].output, None);
        assert_eq!(session.state(), LifecycleState::Stopped);
    }

    #[test]
    fn test_refresh_metadata_preserves_created_at() {
        let mut session = Session::new("abc", at(0));
        session.refresh_metadata(at(5));
        assert_eq!(
            session.metadata.as_ref().unwrap().status,
            SessionStatus::Active
        );

        session.resolution = Some("missing await".into());
        session.refresh_metadata(at(20));
        let meta = session.metadata.as_ref().unwrap();
        assert_eq!(meta.created_at, at(5));
        assert_eq!(meta.updated_at, at(20));
        assert_eq!(meta.status, SessionStatus::Resolved);
        assert_eq!(serde_json::to_value(meta).unwrap()["status"], "resolved");
    }

    #[test]
    fn test_blank_resolution_is_still_active() {
        let mut session = Session::new("abc", at(0));
        session.resolution = Some("   ".into());
        assert_eq!(session.derived_status(), SessionStatus::Active);
    }
}
