//! Best-effort git queries against the project working tree.
//!
//! Nothing here fails: a missing git binary, a directory outside any
//! repository, or a timeout all yield an empty answer.

use std::path::Path;
use std::time::Duration;
use trail_process::git_output;

use crate::state::{DiffEntry, GitContext};

async fn git_value(root: &Path, args: &[&str], timeout: Duration) -> Option<String> {
    git_output(root, args, timeout)
        .await
        .map(|out| out.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Branch, commit and `origin` URL of the repository at `root`.
///
/// Returns `None` when none of them could be determined.
pub async fn git_context(root: &Path, timeout: Duration) -> Option<GitContext> {
    let branch = git_value(root, &["rev-parse", "--abbrev-ref", "HEAD"], timeout)
        .await
        .filter(|b| b != "HEAD");
    let commit = git_value(root, &["rev-parse", "HEAD"], timeout).await;
    let remote = git_value(root, &["remote", "get-url", "origin"], timeout).await;

    let context = GitContext {
        branch,
        commit,
        remote,
    };
    (!context.is_empty()).then_some(context)
}

/// Uncommitted changes against `HEAD`, one entry per file.
pub async fn working_tree_diffs(root: &Path, timeout: Duration) -> Vec<DiffEntry> {
    match git_output(root, &["diff", "--no-color", "HEAD"], timeout).await {
        Some(text) => split_diff(&text),
        None => Vec::new(),
    }
}

/// Split unified `git diff` output at each `diff --git` header.
fn split_diff(text: &str) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in text.lines() {
        if let Some(header) = line.strip_prefix("diff --git ") {
            if let Some((file_path, body)) = current.take() {
                entries.push(DiffEntry {
                    file_path,
                    diff: body,
                });
            }
            let file_path = header
                .rsplit_once(" b/")
                .map(|(_, b)| b.to_string())
                .unwrap_or_else(|| header.to_string());
            current = Some((file_path, format!("{line}\n")));
        } else if let Some((_, body)) = current.as_mut() {
            body.push_str(line);
            body.push('\n');
        }
    }

    if let Some((file_path, body)) = current {
        entries.push(DiffEntry {
            file_path,
            diff: body,
        });
    }
    entries
}
