use anyhow::Result;
use serde_json::json;
use trail_core::{AppError, OutputFormat};
use trail_session::git::working_tree_diffs;
use trail_session::{LifecycleState, RecordStartOutcome, RecordStopOutcome, Session};

use crate::context::AppContext;

const DEFAULT_RESOLUTION: &str = "Resolved";

pub(crate) fn handle_start(ctx: &mut AppContext, force: bool, format: OutputFormat) -> Result<()> {
    let id = ctx.lifecycle.start(force)?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "id": id })),
        OutputFormat::Text => {
            println!("Started session {id}");
            eprintln!("Run 'trail record start' to begin recording.");
        }
    }
    Ok(())
}

pub(crate) fn handle_which(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let id = ctx
        .lifecycle
        .active_id()
        .ok_or(AppError::NoActiveSession)?
        .to_string();
    let session = ctx.store().exists(&id).then(|| ctx.store().load(&id)).transpose()?;
    let state = session
        .as_ref()
        .map_or(LifecycleState::Created, Session::state);

    match format {
        OutputFormat::Json => {
            let value = json!({
                "id": id,
                "state": state.to_string(),
                "commands": session.as_ref().map_or(0, |s| s.commands.len()),
                "pushed": session.as_ref().is_some_and(Session::is_pushed),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            println!("{id}");
            eprintln!("  state:    {state}");
            if let Some(session) = &session {
                if let Some(start) = session.start_time {
                    eprintln!("  started:  {}", start.format("%Y-%m-%d %H:%M:%S UTC"));
                }
                eprintln!("  commands: {}", session.commands.len());
                if session.is_pushed() {
                    eprintln!("  pushed:   yes");
                }
            }
        }
    }
    Ok(())
}

pub(crate) async fn handle_checkout(ctx: &mut AppContext, id: String) -> Result<()> {
    if !ctx.store().exists(&id)
        && let Some(token) = ctx.token()
    {
        match ctx.remote()?.fetch_session_if_missing(ctx.store(), &id, Some(&token)).await {
            Ok(_) => eprintln!("Fetched session {id} from remote."),
            Err(e) => tracing::warn!(session_id = %id, error = %format!("{e:#}"), "Remote fetch failed"),
        }
    }
    ctx.lifecycle.checkout(&id)?;
    println!("Switched to session {id}");
    Ok(())
}

pub(crate) fn handle_resolve(ctx: &AppContext, message: Option<String>) -> Result<()> {
    let message = message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_RESOLUTION.to_string());
    let session = ctx.lifecycle.resolve(&message)?;
    println!("Marked session {} as resolved: {message}", session.id);
    Ok(())
}

pub(crate) fn handle_record_start(ctx: &mut AppContext) -> Result<()> {
    match ctx.lifecycle.record_start()? {
        RecordStartOutcome::Started(id) => println!("Recording session {id}"),
        RecordStartOutcome::Resumed(id) => println!("Resumed recording session {id}"),
        RecordStartOutcome::AlreadyRecording(id) => {
            eprintln!("Session {id} is already recording.");
        }
    }
    Ok(())
}

pub(crate) async fn handle_record_stop(ctx: &AppContext) -> Result<()> {
    let recording = match ctx.lifecycle.active_id() {
        Some(id) => ctx.lifecycle.state_of(id)? == LifecycleState::Recording,
        None => false,
    };
    let diffs = if recording {
        working_tree_diffs(&ctx.root, ctx.tool_timeout()).await
    } else {
        Vec::new()
    };

    match ctx.lifecycle.record_stop(diffs)? {
        RecordStopOutcome::Stopped { id, commands } => {
            println!("Stopped recording session {id} ({commands} command(s) recorded)");
        }
        RecordStopOutcome::AlreadyStopped(id) => {
            eprintln!("Session {id} is not recording; nothing to stop.");
        }
    }
    Ok(())
}

pub(crate) fn handle_replay(ctx: &AppContext, id: Option<String>, format: OutputFormat) -> Result<()> {
    let session = ctx.lifecycle.session(id.as_deref())?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&session)?),
        OutputFormat::Text => print!("{}", render_replay(&session)),
    }
    Ok(())
}

fn render_replay(session: &Session) -> String {
    let mut out = format!("Session {} ({})\n", session.id, session.state());
    if let Some(start) = session.start_time {
        out.push_str(&format!("Started: {}\n", start.to_rfc3339()));
    }
    if let Some(end) = session.end_time {
        out.push_str(&format!("Ended:   {}\n", end.to_rfc3339()));
    }

    if session.commands.is_empty() {
        out.push_str("\nNo commands recorded.\n");
    }
    for (index, entry) in session.commands.iter().enumerate() {
        out.push_str(&format!("\n[{}] $ {}\n", index + 1, entry.command));
        if let Some(output) = entry.output.as_deref().filter(|o| !o.trim().is_empty()) {
            for line in output.lines() {
                out.push_str(&format!("    {line}\n"));
            }
        }
        if let Some(code) = entry.exit_code {
            out.push_str(&format!("    (exit {code})\n"));
        }
    }

    if !session.diffs.is_empty() {
        out.push_str("\nChanged files:\n");
        for diff in &session.diffs {
            out.push_str(&format!("  {}\n", diff.file_path));
        }
    }
    if let Some(resolution) = &session.resolution {
        out.push_str(&format!("\nResolution: {resolution}\n"));
    }
    out
}

pub(crate) fn handle_end(ctx: &mut AppContext) -> Result<()> {
    let session = ctx.lifecycle.end()?;
    println!(
        "Ended session {} ({} command(s) recorded)",
        session.id,
        session.commands.len()
    );
    Ok(())
}

pub(crate) fn handle_list(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let sessions = ctx.store().list()?;
    let active = ctx.lifecycle.active_id();

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = sessions
                .iter()
                .map(|s| {
                    json!({
                        "id": s.id,
                        "state": s.state().to_string(),
                        "active": active == Some(s.id.as_str()),
                        "startTime": s.start_time,
                        "commands": s.commands.len(),
                        "pushed": s.is_pushed(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            if sessions.is_empty() {
                eprintln!("No sessions found.");
                return Ok(());
            }
            println!("  {:<26}  {:<17}  {:>8}  STARTED", "ID", "STATE", "COMMANDS");
            for s in &sessions {
                let marker = if active == Some(s.id.as_str()) { "*" } else { " " };
                let started = s
                    .start_time
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{marker} {:<26}  {:<17}  {:>8}  {started}",
                    s.id,
                    s.state().to_string(),
                    s.commands.len()
                );
            }
        }
    }
    Ok(())
}
