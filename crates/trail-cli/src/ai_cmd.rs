use anyhow::Result;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use trail_core::{ErrorRecord, OutputFormat, render_error_record};
use trail_process::{StreamMode, check_tool_installed, run_with_timeout};

use crate::context::AppContext;
use crate::lookup_cmd::collect_errors;

pub(crate) async fn handle_ai(
    ctx: &AppContext,
    error: Option<String>,
    file: Option<PathBuf>,
    model: Option<String>,
    cloud: bool,
    format: OutputFormat,
) -> Result<()> {
    if error.is_none() && file.is_none() {
        eprintln!("Nothing to analyze: pass --error <message> and/or --file <path>.");
        return Ok(());
    }

    let records = collect_errors(ctx, file.as_ref(), error.as_deref()).await;
    if records.is_empty() {
        eprintln!("No errors detected.");
        return Ok(());
    }
    let prompt = build_prompt(&records);

    let ai = &ctx.settings.ai;
    if !cloud && check_tool_installed(&ai.local_program) {
        let model = model.as_deref().unwrap_or(&ai.default_model);
        match run_local(&ai.local_program, model, &prompt, Duration::from_secs(ai.timeout_secs)).await {
            Some(answer) => {
                print_answer("local", &answer, &[], format);
                return Ok(());
            }
            None => eprintln!("Local AI backend failed; asking the remote service."),
        }
    }

    let error_text = error.as_deref().or(Some(records[0].message.as_str()));
    let suggestion = ctx
        .remote()?
        .suggest(&prompt, error_text, ctx.token().as_deref())
        .await?;
    print_answer("remote", &suggestion.suggestion, &suggestion.related_lines(), format);
    Ok(())
}

/// `<program> run <model> <prompt>`; `None` on any failure or empty answer.
async fn run_local(program: &str, model: &str, prompt: &str, timeout: Duration) -> Option<String> {
    let mut cmd = Command::new(program);
    cmd.args(["run", model, prompt]);
    match run_with_timeout(cmd, timeout, StreamMode::BufferOnly).await {
        Ok(result) if result.success() && !result.output.trim().is_empty() => {
            Some(result.output.trim().to_string())
        }
        Ok(result) => {
            tracing::warn!(program, exit_code = result.exit_code, summary = %result.summary, "Local AI run failed");
            None
        }
        Err(e) => {
            tracing::warn!(program, error = %e, "Local AI backend unavailable");
            None
        }
    }
}

fn build_prompt(records: &[ErrorRecord]) -> String {
    let mut prompt =
        String::from("Explain the cause of the following error(s) and suggest a concrete fix.\n\n");
    for record in records {
        prompt.push_str(&format!("- {}\n", render_error_record(record)));
        if let Some(snippet) = &record.snippet {
            prompt.push_str(&format!("  code: {snippet}\n"));
        }
    }
    prompt
}

fn print_answer(backend: &str, answer: &str, related: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "backend": backend, "suggestion": answer, "relatedIssues": related })
        ),
        OutputFormat::Text => {
            println!("{answer}");
            if !related.is_empty() {
                println!("\nRelated issues:");
                for issue in related {
                    println!("  - {issue}");
                }
            }
        }
    }
}
