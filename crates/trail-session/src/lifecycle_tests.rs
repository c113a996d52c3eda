use super::*;
use crate::state::SessionStatus;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    config_path: PathBuf,
    lifecycle: SessionLifecycle,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    let store = SessionStore::new(dir.path().join("sessions"));
    let config = UserConfig::load_from(&config_path).unwrap();
    let lifecycle = SessionLifecycle::new(store, config, &config_path);
    Fixture {
        _dir: dir,
        config_path,
        lifecycle,
    }
}

fn app_error(err: &anyhow::Error) -> &AppError {
    err.downcast_ref::<AppError>()
        .unwrap_or_else(|| panic!("expected AppError, got {err:#}"))
}

#[test]
fn test_start_sets_pointer_without_file() {
    let mut fx = fixture();
    let id = fx.lifecycle.start(false).unwrap();

    let on_disk = UserConfig::load_from(&fx.config_path).unwrap();
    assert_eq!(on_disk.active_session.as_deref(), Some(id.as_str()));
    assert!(!fx.lifecycle.store().exists(&id));
    assert_eq!(fx.lifecycle.state_of(&id).unwrap(), LifecycleState::Created);
}

#[test]
fn test_start_refuses_unended_active_session() {
    let mut fx = fixture();
    let first = fx.lifecycle.start(false).unwrap();
    fx.lifecycle.record_start().unwrap();

    let err = fx.lifecycle.start(false).unwrap_err();
    assert!(matches!(app_error(&err), AppError::AlreadyActive(id) if *id == first));

    let second = fx.lifecycle.start(true).unwrap();
    assert_ne!(first, second);
    assert_eq!(fx.lifecycle.active_id(), Some(second.as_str()));
}

#[test]
fn test_start_replaces_pointer_without_file() {
    let mut fx = fixture();
    let first = fx.lifecycle.start(false).unwrap();
    let second = fx.lifecycle.start(false).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_record_start_requires_active_session() {
    let mut fx = fixture();
    let err = fx.lifecycle.record_start().unwrap_err();
    assert!(matches!(app_error(&err), AppError::NoActiveSession));
}

#[test]
fn test_record_start_creates_file_then_signals() {
    let mut fx = fixture();
    let id = fx.lifecycle.start(false).unwrap();

    assert_eq!(
        fx.lifecycle.record_start().unwrap(),
        RecordStartOutcome::Started(id.clone())
    );
    let session = fx.lifecycle.store().load(&id).unwrap();
    assert!(session.is_recording);
    assert!(session.commands.is_empty());
    assert!(session.start_time.is_some());

    assert_eq!(
        fx.lifecycle.record_start().unwrap(),
        RecordStartOutcome::AlreadyRecording(id)
    );
}

#[test]
fn test_record_command_appends_in_order() {
    let mut fx = fixture();
    fx.lifecycle.start(false).unwrap();
    fx.lifecycle.record_start().unwrap();

    fx.lifecycle
        .record_command("npm test", Some("1 failing".into()), Some(1))
        .unwrap();
    let session = fx
        .lifecycle
        .record_command("node app.js", None, Some(0))
        .unwrap();

    let commands: Vec<&str> = session.commands.iter().map(|c| c.command.as_str()).collect();
    assert_eq!(commands, ["npm test", "node app.js"]);
    assert_eq!(session.commands[0].output.as_deref(), Some("1 failing"));
    assert!(session.commands[1].recorded_at.is_some());
}

#[test]
fn test_record_command_rejected_when_not_recording() {
    let mut fx = fixture();
    fx.lifecycle.start(false).unwrap();
    let err = fx.lifecycle.record_command("ls", None, None).unwrap_err();
    assert!(matches!(app_error(&err), AppError::InvalidTransition { .. }));

    fx.lifecycle.record_start().unwrap();
    fx.lifecycle.record_stop(Vec::new()).unwrap();
    let err = fx.lifecycle.record_command("ls", None, None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot record a command in a session that is stopped"
    );
}

#[test]
fn test_stop_is_idempotent() {
    let mut fx = fixture();
    let id = fx.lifecycle.start(false).unwrap();
    fx.lifecycle.record_start().unwrap();
    fx.lifecycle
        .record_command("npm test", Some("1 failing".into()), Some(1))
        .unwrap();

    let diffs = vec![DiffEntry {
        file_path: "src/a.js".into(),
        diff: "+fix".into(),
    }];
    assert_eq!(
        fx.lifecycle.record_stop(diffs).unwrap(),
        RecordStopOutcome::Stopped {
            id: id.clone(),
            commands: 1
        }
    );
    let after_first = fx.lifecycle.store().load(&id).unwrap();
    assert!(!after_first.is_recording);
    assert_eq!(after_first.diffs.len(), 1);

    assert_eq!(
        fx.lifecycle.record_stop(Vec::new()).unwrap(),
        RecordStopOutcome::AlreadyStopped(id.clone())
    );
    assert_eq!(fx.lifecycle.store().load(&id).unwrap(), after_first);
}

#[test]
fn test_stop_without_file_is_not_found() {
    let mut fx = fixture();
    fx.lifecycle.start(false).unwrap();
    let err = fx.lifecycle.record_stop(Vec::new()).unwrap_err();
    assert!(matches!(app_error(&err), AppError::SessionNotFound(_)));
}

#[test]
fn test_resume_keeps_history() {
    let mut fx = fixture();
    let id = fx.lifecycle.start(false).unwrap();
    fx.lifecycle.record_start().unwrap();
    fx.lifecycle.record_command("npm test", None, Some(1)).unwrap();
    fx.lifecycle.record_stop(Vec::new()).unwrap();

    assert_eq!(
        fx.lifecycle.record_start().unwrap(),
        RecordStartOutcome::Resumed(id.clone())
    );
    let session = fx.lifecycle.store().load(&id).unwrap();
    assert!(session.is_recording);
    assert_eq!(session.commands.len(), 1);
}

#[test]
fn test_resolve_keeps_recording_state() {
    let mut fx = fixture();
    fx.lifecycle.start(false).unwrap();
    fx.lifecycle.record_start().unwrap();
    let session = fx.lifecycle.resolve("  pinned the dependency  ").unwrap();
    assert_eq!(session.resolution.as_deref(), Some("pinned the dependency"));
    assert!(session.is_recording);
}

#[test]
fn test_end_clears_pointer_and_blocks_recording() {
    let mut fx = fixture();
    let id = fx.lifecycle.start(false).unwrap();
    fx.lifecycle.record_start().unwrap();

    let ended = fx.lifecycle.end().unwrap();
    assert!(!ended.is_recording);
    assert!(ended.end_time.is_some());
    assert_eq!(fx.lifecycle.active_id(), None);
    assert_eq!(
        UserConfig::load_from(&fx.config_path).unwrap().active_session,
        None
    );

    let err = fx.lifecycle.end().unwrap_err();
    assert!(matches!(app_error(&err), AppError::NoActiveSession));

    fx.lifecycle.checkout(&id).unwrap();
    let err = fx.lifecycle.record_start().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot start recording a session that is ended"
    );
}

#[test]
fn test_start_allowed_after_checkout_of_ended_session() {
    let mut fx = fixture();
    let id = fx.lifecycle.start(false).unwrap();
    fx.lifecycle.record_start().unwrap();
    fx.lifecycle.end().unwrap();
    fx.lifecycle.checkout(&id).unwrap();
    assert!(fx.lifecycle.start(false).is_ok());
}

#[test]
fn test_end_without_file_is_not_found() {
    let mut fx = fixture();
    fx.lifecycle.start(false).unwrap();
    let err = fx.lifecycle.end().unwrap_err();
    assert!(matches!(app_error(&err), AppError::SessionNotFound(_)));
}

#[test]
fn test_checkout_requires_local_file() {
    let mut fx = fixture();
    let err = fx.lifecycle.checkout("01HY7ABCDEFGHJKMNPQRSTVWXY").unwrap_err();
    assert!(matches!(app_error(&err), AppError::SessionNotFound(_)));
    assert_eq!(fx.lifecycle.active_id(), None);

    let err = fx.lifecycle.checkout("../../etc").unwrap_err();
    assert!(matches!(app_error(&err), AppError::InvalidSessionId(_)));
}

#[test]
fn test_checkout_switches_pointer() {
    let mut fx = fixture();
    let first = fx.lifecycle.start(false).unwrap();
    fx.lifecycle.record_start().unwrap();
    let second = fx.lifecycle.start(true).unwrap();
    assert_eq!(fx.lifecycle.active_id(), Some(second.as_str()));

    fx.lifecycle.checkout(&first).unwrap();
    assert_eq!(fx.lifecycle.active_id(), Some(first.as_str()));
    assert_eq!(fx.lifecycle.session(None).unwrap().id, first);
}

#[test]
fn test_prepare_push_rejects_empty_session() {
    let mut fx = fixture();
    let id = fx.lifecycle.start(false).unwrap();
    fx.lifecycle.record_start().unwrap();
    let err = fx.lifecycle.prepare_push(None).unwrap_err();
    assert!(matches!(app_error(&err), AppError::EmptySession(e) if *e == id));
}

#[test]
fn test_prepare_push_attaches_context_without_saving() {
    let mut fx = fixture();
    let id = fx.lifecycle.start(false).unwrap();
    fx.lifecycle.record_start().unwrap();
    fx.lifecycle
        .record_command("npm test", Some("1 failing".into()), Some(1))
        .unwrap();

    let git = GitContext {
        branch: Some("main".into()),
        commit: Some("abc123".into()),
        remote: None,
    };
    let prepared = fx.lifecycle.prepare_push(Some(git.clone())).unwrap();
    assert_eq!(prepared.git_context, Some(git));
    assert_eq!(
        prepared.metadata.as_ref().map(|m| m.status),
        Some(SessionStatus::Active)
    );

    let stored = fx.lifecycle.store().load(&id).unwrap();
    assert!(stored.metadata.is_none());
    assert!(stored.git_context.is_none());
}

#[test]
fn test_prepare_push_marks_resolved() {
    let mut fx = fixture();
    fx.lifecycle.start(false).unwrap();
    fx.lifecycle.record_start().unwrap();
    fx.lifecycle.record_command("npm test", None, Some(1)).unwrap();
    fx.lifecycle.resolve("fixed import path").unwrap();

    let prepared = fx.lifecycle.prepare_push(None).unwrap();
    assert_eq!(
        prepared.metadata.map(|m| m.status),
        Some(SessionStatus::Resolved)
    );
}
