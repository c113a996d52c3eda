//! Discovery of changed source files in a git working tree.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use trail_process::git_output;

/// Files changed relative to `HEAD` plus untracked, non-ignored files,
/// restricted to `extensions`.
///
/// Only files under `root` are listed and both listings are taken relative
/// to it, so `root` may be any directory inside the work tree. Outside a git
/// repository, or when git is missing, the result is empty.
pub async fn modified_files(root: &Path, extensions: &[String], timeout: Duration) -> Vec<PathBuf> {
    let mut listing = String::new();
    for args in [
        &["diff", "--name-only", "--relative", "HEAD"][..],
        &["ls-files", "--others", "--exclude-standard"][..],
    ] {
        if let Some(out) = git_output(root, args, timeout).await {
            listing.push_str(&out);
            listing.push('\n');
        }
    }

    select_sources(&listing, extensions)
        .into_iter()
        .map(|rel| root.join(rel))
        .collect()
}

/// Keep lines whose extension is in `extensions`, first occurrence wins.
fn select_sources(listing: &str, extensions: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            Path::new(line)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
        })
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn js() -> Vec<String> {
        ["js", "mjs", "cjs", "jsx"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_filters_and_dedupes() {
        let listing = "src/a.js\nREADME.md\nsrc/b.JSX\n\nsrc/a.js\nlib/c.mjs\nMakefile\n";
        assert_eq!(
            select_sources(listing, &js()),
            vec!["src/a.js", "src/b.JSX", "lib/c.mjs"]
        );
    }

    #[test]
    fn test_select_empty_extensions_matches_nothing() {
        assert!(select_sources("a.js\n", &[]).is_empty());
    }

    #[tokio::test]
    async fn test_outside_repo_is_empty() {
        let td = tempdir().unwrap();
        std::fs::write(td.path().join("a.js"), "x").unwrap();
        let files = modified_files(td.path(), &js(), Duration::from_secs(10)).await;
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_untracked_files_in_fresh_repo() {
        if !trail_process::check_tool_installed("git") {
            return;
        }
        let td = tempdir().unwrap();
        let status = std::process::Command::new("git")
            .args(["init", "-q"])
            .current_dir(td.path())
            .status()
            .unwrap();
        assert!(status.success());
        std::fs::write(td.path().join("app.js"), "x").unwrap();
        std::fs::write(td.path().join("notes.txt"), "x").unwrap();

        // `diff HEAD` fails without a commit; untracked listing still works.
        let files = modified_files(td.path(), &js(), Duration::from_secs(10)).await;
        assert_eq!(files, vec![td.path().join("app.js")]);
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = std::process::Command::new("git")
            .args(["-c", "user.name=trail", "-c", "user.email=trail@localhost", "-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    #[tokio::test]
    async fn test_paths_resolve_from_subdirectory() {
        if !trail_process::check_tool_installed("git") {
            return;
        }
        let td = tempdir().unwrap();
        let repo = td.path();
        let sub = repo.join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("app.js"), "let a = 1;\n").unwrap();
        std::fs::write(repo.join("top.js"), "let b = 1;\n").unwrap();
        git(repo, &["init", "-q"]);
        git(repo, &["add", "."]);
        git(repo, &["commit", "-q", "-m", "init"]);

        std::fs::write(sub.join("app.js"), "let a = ;\n").unwrap();
        std::fs::write(repo.join("top.js"), "let b = ;\n").unwrap();
        std::fs::write(sub.join("new.js"), "x\n").unwrap();

        let files = modified_files(&sub, &js(), Duration::from_secs(10)).await;
        assert_eq!(files, vec![sub.join("app.js"), sub.join("new.js")]);
        assert!(files.iter().all(|f| f.exists()));

        let from_top = modified_files(repo, &js(), Duration::from_secs(10)).await;
        assert!(from_top.contains(&sub.join("app.js")));
        assert!(from_top.contains(&repo.join("top.js")));
        assert!(from_top.contains(&sub.join("new.js")));
    }
}
