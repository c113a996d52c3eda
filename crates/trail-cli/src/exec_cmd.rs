//! `trail exec -- <cmd…>`: run a command with its output streamed and record
//! it in the active session.

use anyhow::Result;
use std::path::Path;
use tokio::process::Command;
use trail_core::{AppError, ErrorRecord, ErrorSource, render_error_record};
use trail_detect::extract_from_text;
use trail_process::{StreamMode, run_to_completion};
use trail_session::LifecycleState;

use crate::context::AppContext;

/// Returns the command's exit code.
pub(crate) async fn handle_exec(ctx: &AppContext, argv: Vec<String>) -> Result<i32> {
    let id = ctx
        .lifecycle
        .active_id()
        .ok_or(AppError::NoActiveSession)?
        .to_string();
    let state = ctx.lifecycle.state_of(&id)?;
    if state != LifecycleState::Recording {
        return Err(AppError::InvalidTransition {
            action: "record a command in".into(),
            state: state.to_string(),
        }
        .into());
    }

    let Some((program, args)) = argv.split_first() else {
        anyhow::bail!("No command given");
    };
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(&ctx.root);

    let line = shell_join(&argv);
    let (output, exit_code) = match run_to_completion(cmd, StreamMode::Tee).await {
        Ok(result) => (result.combined_output(), result.exit_code),
        Err(failure) => {
            eprintln!("{failure}");
            (failure.to_string(), 127)
        }
    };

    ctx.lifecycle
        .record_command(&line, Some(output.clone()), Some(exit_code))?;
    tracing::debug!(session_id = %id, exit_code, "Recorded command");

    if exit_code != 0 {
        let record = failure_record(&output, &ctx.root);
        eprintln!("\n{}", render_error_record(&record));
        eprintln!("Run 'trail lookup --error \"{}\"' for known resolutions.", record.message);
    }
    Ok(exit_code)
}

/// Normalized record for a failed command. Without a location in the
/// output the record points at the invocation root.
fn failure_record(output: &str, root: &Path) -> ErrorRecord {
    extract_from_text(output, root, root, ErrorSource::RuntimeTrace)
}

/// Display form of an argv, quoting arguments that need it.
fn shell_join(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            let plain = !arg.is_empty()
                && arg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c));
            if plain {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', r"'\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
