// End-to-end tests for the trail binary.
// Each test gets its own TRAIL_HOME; the remote points at a closed port.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

struct Env {
    home: TempDir,
    work: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("tempdir"),
            work: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn trail(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_trail"))
            .args(args)
            .current_dir(self.work.path())
            .env("TRAIL_HOME", self.home.path())
            .env("TRAIL_API_URL", "http://127.0.0.1:9")
            .env_remove("TRAIL_TOKEN")
            .env_remove("TRAIL_DEBUG")
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to run trail")
    }

    fn session_file(&self, id: &str) -> std::path::PathBuf {
        self.home.path().join("sessions").join(format!("{id}.json"))
    }

    fn start(&self) -> String {
        let output = self.trail(&["start", "--format", "json"]);
        assert!(output.status.success(), "{}", stderr(&output));
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
        value["id"].as_str().expect("id").to_string()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn read_session(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).expect("session file")).expect("json")
}

#[test]
fn cli_help_displays_correctly() {
    let output = Command::new(env!("CARGO_BIN_EXE_trail"))
        .arg("--help")
        .output()
        .expect("failed to run trail --help");

    assert!(output.status.success());
    let stdout = stdout(&output);
    for command in ["start", "which", "lookup", "checkout", "resolve", "record", "replay", "push", "exec"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn start_then_which_reports_active_session() {
    let env = Env::new();
    let id = env.start();

    let output = env.trail(&["which"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), id);
}

#[test]
fn which_without_session_fails() {
    let env = Env::new();
    let output = env.trail(&["which"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("trail start"));
}

#[test]
fn second_start_requires_force() {
    let env = Env::new();
    let first = env.start();
    env.trail(&["record", "start"]);

    let output = env.trail(&["start"]);
    assert_eq!(output.status.code(), Some(1));

    let second = {
        let output = env.trail(&["start", "--force", "--format", "json"]);
        assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        value["id"].as_str().unwrap().to_string()
    };
    assert_ne!(first, second);
}

#[test]
fn record_exec_stop_replay_flow() {
    let env = Env::new();
    let id = env.start();

    assert!(env.trail(&["record", "start"]).status.success());

    let output = env.trail(&["exec", "--", "sh", "-c", "echo 1 failing; exit 3"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stdout(&output).contains("1 failing"));

    let output = env.trail(&["record", "stop"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let session = read_session(&env.session_file(&id));
    let commands = session["commands"].as_array().unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0]["command"], "sh -c 'echo 1 failing; exit 3'");
    assert_eq!(commands[0]["exitCode"], 3);
    assert!(commands[0]["output"].as_str().unwrap().contains("1 failing"));
    assert_eq!(session["isRecording"], false);

    let output = env.trail(&["replay"]);
    assert!(output.status.success());
    let replay = stdout(&output);
    assert!(replay.contains(&id));
    assert!(replay.contains("$ sh -c 'echo 1 failing; exit 3'"));
}

#[test]
fn exec_requires_recording() {
    let env = Env::new();
    env.start();
    let output = env.trail(&["exec", "--", "true"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn end_without_active_session_fails() {
    let env = Env::new();
    let output = env.trail(&["end"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn end_clears_active_session() {
    let env = Env::new();
    let id = env.start();
    env.trail(&["record", "start"]);

    assert!(env.trail(&["end"]).status.success());
    assert_eq!(env.trail(&["which"]).status.code(), Some(1));
    assert!(read_session(&env.session_file(&id))["endTime"].is_string());
}

#[test]
fn push_empty_session_fails() {
    let env = Env::new();
    env.start();
    env.trail(&["record", "start"]);

    let output = env.trail(&["push"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn push_without_token_reports_and_exits_zero() {
    let env = Env::new();
    let id = env.start();
    env.trail(&["record", "start"]);
    env.trail(&["exec", "--", "true"]);
    env.trail(&["record", "stop"]);

    let output = env.trail(&["push"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stderr(&output).contains("TRAIL_TOKEN"));
    assert!(read_session(&env.session_file(&id)).get("metadata").is_none());
}

#[test]
fn checkout_unknown_session_fails() {
    let env = Env::new();
    let output = env.trail(&["checkout", "does-not-exist"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn checkout_rejects_path_like_id() {
    let env = Env::new();
    let output = env.trail(&["checkout", "../escape"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn resolve_marks_session() {
    let env = Env::new();
    let id = env.start();
    env.trail(&["record", "start"]);

    let output = env.trail(&["resolve", "-m", "bumped the lockfile"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(read_session(&env.session_file(&id))["resolution"], "bumped the lockfile");
}

#[test]
fn list_json_includes_sessions() {
    let env = Env::new();
    let id = env.start();
    env.trail(&["record", "start"]);

    let output = env.trail(&["list", "--format", "json"]);
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], id.as_str());
}

#[test]
fn lookup_with_error_and_no_token_exits_zero() {
    let env = Env::new();
    let output = env.trail(&["lookup", "--error", "TypeError: x is undefined"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
}

#[test]
fn config_init_writes_settings_template() {
    let env = Env::new();
    assert!(env.trail(&["config", "init"]).status.success());
    assert!(env.home.path().join("settings.toml").exists());

    let output = env.trail(&["config", "show"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("not set"));
}
