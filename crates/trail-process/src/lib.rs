//! Process management: spawning with a deadline, process-group cleanup, and output capture.

use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

mod output_helpers;

pub use output_helpers::{extract_summary, failure_summary};

/// Result of executing a command.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Captured stdout output.
    pub output: String,
    /// Captured stderr output.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr_output: String,
    /// Last non-empty line or truncated output (max 200 chars).
    pub summary: String,
    /// Exit code (1 if signal-killed).
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, the way a terminal would show them.
    pub fn combined_output(&self) -> String {
        match (self.output.is_empty(), self.stderr_output.is_empty()) {
            (_, true) => self.output.clone(),
            (true, false) => self.stderr_output.clone(),
            (false, false) => {
                let mut combined = self.output.clone();
                if !combined.ends_with('\n') {
                    combined.push('\n');
                }
                combined.push_str(&self.stderr_output);
                combined
            }
        }
    }
}

/// Why a tool run produced no result.
#[derive(thiserror::Error, Debug)]
pub enum ToolFailure {
    #[error("'{0}' is not installed or not in PATH")]
    NotInstalled(String),

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// How child output is surfaced while it is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Capture only.
    BufferOnly,
    /// Capture and echo stdout/stderr to the parent's stdout/stderr as lines arrive.
    Tee,
}

/// Kills the child's whole process group when dropped, unless disarmed.
///
/// Dropping the future that owns a running child (timeout, Ctrl-C in the
/// caller's `select!`) therefore never leaves grandchildren behind.
struct ProcessGroupGuard {
    pgid: Option<i32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.map(|p| p as i32),
        }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            debug!(pgid, "Killing abandoned process group");
            kill_process_group(pgid);
        }
    }
}

fn kill_process_group(pgid: i32) {
    #[cfg(unix)]
    {
        // SAFETY: kill() has no memory-safety preconditions. Negative PID targets
        // the process group created by setsid() in spawn_tool.
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    {
        let _ = pgid;
    }
}

fn program_name(cmd: &Command) -> String {
    cmd.as_std().get_program().to_string_lossy().to_string()
}

/// Spawn a tool process without waiting for it to complete.
///
/// - Stdin is null, stdout and stderr are piped
/// - Isolates child in its own process group (via setsid)
/// - Enables kill_on_drop as safety net
pub fn spawn_tool(mut cmd: Command) -> Result<tokio::process::Child, ToolFailure> {
    let program = program_name(&cmd);
    cmd.stdin(std::process::Stdio::null());
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    cmd.kill_on_drop(true);

    // SAFETY: setsid() is async-signal-safe and we call it before exec,
    // so no Rust runtime state exists in the child yet.
    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    cmd.spawn().map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ToolFailure::NotInstalled(program.clone())
        } else {
            ToolFailure::Spawn { program, source }
        }
    })
}

/// Wait for a spawned child process and capture its output.
///
/// Reads stdout and stderr concurrently until EOF, then waits for exit.
/// Invalid UTF-8 is replaced rather than aborting the capture.
pub async fn wait_and_capture(
    mut child: tokio::process::Child,
    stream_mode: StreamMode,
) -> std::io::Result<ExecutionResult> {
    let mut output = String::new();
    let mut stderr_output = String::new();

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("stderr was not piped"))?;

    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_reader = BufReader::new(stderr);
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    let mut stdout_done = false;
    let mut stderr_done = false;

    while !stdout_done || !stderr_done {
        tokio::select! {
            result = stdout_reader.read_until(b'\n', &mut stdout_buf), if !stdout_done => {
                match result {
                    Ok(0) | Err(_) => stdout_done = true,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&stdout_buf);
                        if stream_mode == StreamMode::Tee {
                            print!("{line}");
                        }
                        output.push_str(&line);
                        stdout_buf.clear();
                    }
                }
            }
            result = stderr_reader.read_until(b'\n', &mut stderr_buf), if !stderr_done => {
                match result {
                    Ok(0) | Err(_) => stderr_done = true,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&stderr_buf);
                        if stream_mode == StreamMode::Tee {
                            eprint!("{line}");
                        }
                        stderr_output.push_str(&line);
                        stderr_buf.clear();
                    }
                }
            }
        }
    }

    let status = child.wait().await?;

    let exit_code = status.code().unwrap_or_else(|| {
        warn!("Process terminated by signal, using exit code 1");
        1
    });

    let summary = if exit_code == 0 {
        extract_summary(&output)
    } else {
        failure_summary(&output, &stderr_output, exit_code)
    };

    Ok(ExecutionResult {
        output,
        stderr_output,
        summary,
        exit_code,
    })
}

/// Run a command to completion, bounded by `timeout`.
///
/// On timeout the whole process group is killed and `ToolFailure::TimedOut`
/// is returned. If the returned future is dropped early, the group is killed too.
pub async fn run_with_timeout(
    cmd: Command,
    timeout: Duration,
    stream_mode: StreamMode,
) -> Result<ExecutionResult, ToolFailure> {
    let program = program_name(&cmd);
    let child = spawn_tool(cmd)?;
    let mut guard = ProcessGroupGuard::new(child.id());

    match tokio::time::timeout(timeout, wait_and_capture(child, stream_mode)).await {
        Ok(Ok(result)) => {
            guard.disarm();
            debug!(program = %program, exit_code = result.exit_code, "Tool finished");
            Ok(result)
        }
        Ok(Err(source)) => Err(ToolFailure::Wait { program, source }),
        Err(_) => {
            // guard drop kills the group; kill_on_drop already reaped the direct child.
            warn!(program = %program, timeout_secs = timeout.as_secs(), "Tool timed out");
            Err(ToolFailure::TimedOut { program, timeout })
        }
    }
}

/// Run a command with no deadline, e.g. a user command being recorded.
///
/// The process group is still killed if the returned future is dropped.
pub async fn run_to_completion(
    cmd: Command,
    stream_mode: StreamMode,
) -> Result<ExecutionResult, ToolFailure> {
    let program = program_name(&cmd);
    let child = spawn_tool(cmd)?;
    let mut guard = ProcessGroupGuard::new(child.id());

    let result = wait_and_capture(child, stream_mode)
        .await
        .map_err(|source| ToolFailure::Wait {
            program: program.clone(),
            source,
        })?;
    guard.disarm();
    debug!(program = %program, exit_code = result.exit_code, "Command finished");
    Ok(result)
}

/// Stdout of `git <args>` run in `dir`, or `None` if git is missing, times
/// out, or exits non-zero.
pub async fn git_output(dir: &Path, args: &[&str], timeout: Duration) -> Option<String> {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(dir);
    match run_with_timeout(cmd, timeout, StreamMode::BufferOnly).await {
        Ok(result) if result.success() => Some(result.output),
        Ok(result) => {
            debug!(
                args = ?args,
                exit_code = result.exit_code,
                summary = %result.summary,
                "git query failed"
            );
            None
        }
        Err(e) => {
            debug!(args = ?args, error = %e, "git unavailable");
            None
        }
    }
}

/// Check if a tool is installed by locating it on PATH.
pub fn check_tool_installed(executable: &str) -> bool {
    which::which(executable).is_ok()
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
