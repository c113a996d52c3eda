use anyhow::Result;
use serde_json::json;
use std::path::PathBuf;
use trail_core::{ErrorRecord, ErrorSource, OutputFormat, render_error_record};
use trail_detect::{modified_files, user_provided_fallback};
use trail_remote::Resolution;

use crate::context::AppContext;

/// Resolutions shown per error; the remote's order is kept.
const MAX_RESOLUTIONS: usize = 3;
/// Errors looked up per invocation.
const MAX_LOOKUPS: usize = 5;

/// Errors for `file`, or for every modified file when none is given, with
/// the user-provided fallback applied.
pub(crate) async fn collect_errors(
    ctx: &AppContext,
    file: Option<&PathBuf>,
    error: Option<&str>,
) -> Vec<ErrorRecord> {
    let pipeline = ctx.pipeline();
    let records = match file {
        Some(file) => pipeline.detect(file).await,
        None if error.is_some() => Vec::new(),
        None => {
            let files = modified_files(
                &ctx.root,
                &ctx.settings.detection.extensions,
                ctx.tool_timeout(),
            )
            .await;
            tracing::debug!(count = files.len(), "Scanning modified files");
            pipeline
                .detect_many(&files)
                .await
                .into_iter()
                .flat_map(|(_, records)| records)
                .collect()
        }
    };
    let shown_file = file.map(|f| f.to_string_lossy().to_string());
    user_provided_fallback(records, error, shown_file.as_deref())
}

pub(crate) async fn handle_lookup(
    ctx: &AppContext,
    file: Option<PathBuf>,
    error: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let records = collect_errors(ctx, file.as_ref(), error.as_deref()).await;
    if records.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Text => eprintln!("No errors detected."),
        }
        return Ok(());
    }

    let sync = ctx.remote()?;
    let token = ctx.token();
    let mut report = Vec::new();
    for record in records.iter().take(MAX_LOOKUPS) {
        let lookup = sync.lookup_resolutions(record, token.as_deref()).await;
        if let Err(e) = &lookup {
            tracing::debug!(error = %format!("{e:#}"), "Resolution lookup failed");
        }
        report.push((record, lookup));
    }
    if records.len() > MAX_LOOKUPS {
        eprintln!(
            "Looked up the first {MAX_LOOKUPS} of {} errors.",
            records.len()
        );
    }

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = report
                .iter()
                .map(|(record, lookup)| match lookup {
                    Ok(resolutions) => json!({
                        "error": record,
                        "resolutions": top(resolutions),
                    }),
                    Err(e) => json!({
                        "error": record,
                        "resolutions": [],
                        "lookupError": format!("{e:#}"),
                        "guidance": generic_guidance(&record.source),
                    }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            for (record, lookup) in &report {
                println!("{}", render_error_record(record));
                if let Some(snippet) = &record.snippet {
                    println!("    | {snippet}");
                }
                match lookup {
                    Ok(resolutions) if !resolutions.is_empty() => {
                        for (i, r) in top(resolutions).iter().enumerate() {
                            print!("{}", render_resolution(i + 1, r));
                        }
                    }
                    Ok(_) => {
                        println!("  No known resolutions.");
                        print_guidance(&record.source);
                    }
                    Err(e) => {
                        eprintln!("warning: resolution lookup failed: {e:#}");
                        if let Some(hint) = crate::error_hints::suggest_fix(e) {
                            eprintln!("{hint}");
                        }
                        print_guidance(&record.source);
                    }
                }
                println!();
            }
        }
    }
    Ok(())
}

fn top(resolutions: &[Resolution]) -> &[Resolution] {
    &resolutions[..resolutions.len().min(MAX_RESOLUTIONS)]
}

fn render_resolution(rank: usize, resolution: &Resolution) -> String {
    let mut out = format!("  {rank}. {}\n", resolution.solution.trim());
    if let Some(code) = &resolution.code_snippet {
        for line in code.lines() {
            out.push_str(&format!("       {line}\n"));
        }
    }
    if let Some(session) = &resolution.source_session {
        out.push_str(&format!("     (from session {session})\n"));
    }
    out
}

fn print_guidance(source: &ErrorSource) {
    println!("  General guidance:");
    for line in generic_guidance(source) {
        println!("    - {line}");
    }
}

/// Offline advice used when no resolution is available.
pub(crate) fn generic_guidance(source: &ErrorSource) -> Vec<&'static str> {
    match source {
        ErrorSource::Lint { .. } => vec![
            "Read the rule documentation for the reported rule id",
            "Try the linter's --fix option for auto-fixable rules",
        ],
        ErrorSource::SyntaxCheck => vec![
            "Check for unbalanced brackets, quotes or a missing comma near the reported line",
            "Look at the line before the reported one; parsers often fail late",
        ],
        ErrorSource::RuntimeTrace => vec![
            "Start from the first stack frame inside your own code",
            "Log the values involved just before the failing line",
        ],
        ErrorSource::UserProvided => vec![
            "Search the exact error message in your issue tracker",
            "Reproduce with the smallest input and record it with 'trail exec'",
        ],
    }
}
