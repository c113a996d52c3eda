use anyhow::Result;
use serde_json::json;
use trail_core::OutputFormat;
use trail_session::git::git_context;

use crate::context::AppContext;

pub(crate) async fn handle_push(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let git = git_context(&ctx.root, ctx.tool_timeout()).await;
    let session = ctx.lifecycle.prepare_push(git)?;
    let status = session
        .metadata
        .as_ref()
        .map(|m| m.status.to_string())
        .unwrap_or_default();

    let id = ctx
        .remote()?
        .push(ctx.store(), &session, ctx.token().as_deref())
        .await?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "id": id, "status": status, "commands": session.commands.len() })
        ),
        OutputFormat::Text => println!(
            "Pushed session {id} ({} command(s), status: {status})",
            session.commands.len()
        ),
    }
    Ok(())
}
