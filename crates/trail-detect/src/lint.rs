//! Static-analysis strategy: eslint-compatible JSON reports.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use trail_core::{ErrorRecord, ErrorSource, Location};
use trail_process::{StreamMode, run_with_timeout};

use crate::snippet::{display_path, read_snippet, resolve_path};
use crate::strategy::{Strategy, StrategyOutcome, build_command};

/// eslint severity for errors (1 = warning).
const SEVERITY_ERROR: u8 = 2;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileReport {
    file_path: String,
    #[serde(default)]
    messages: Vec<LintMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LintMessage {
    #[serde(default)]
    rule_id: Option<String>,
    #[serde(default)]
    severity: u8,
    #[serde(default)]
    fatal: bool,
    message: String,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    column: Option<u32>,
}

/// Parse an eslint `--format json` report, keeping only errors.
pub fn parse_lint_report(raw: &str, root: &Path) -> Result<Vec<ErrorRecord>, serde_json::Error> {
    let reports: Vec<FileReport> = serde_json::from_str(raw.trim())?;

    let mut records = Vec::new();
    for report in reports {
        let file = resolve_path(root, &report.file_path);
        let shown = display_path(root, &file);
        for msg in report
            .messages
            .into_iter()
            .filter(|m| m.severity >= SEVERITY_ERROR || m.fatal)
        {
            let location = Location::new(shown.clone(), msg.line, msg.column);
            let snippet = read_snippet(&file, location.line);
            records.push(
                ErrorRecord::new(&msg.message, location, ErrorSource::lint(msg.rule_id.as_deref()))
                    .with_snippet(snippet),
            );
        }
    }
    Ok(records)
}

/// Runs `<program> --format json <file>`.
///
/// Exit 0 (clean) and 1 (problems found) are expected; any other exit code is
/// a tool failure and makes the strategy unavailable.
#[derive(Debug, Clone)]
pub struct LintStrategy {
    program: String,
    root: PathBuf,
    timeout: Duration,
}

impl LintStrategy {
    pub fn new(program: impl Into<String>, root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            root: root.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Strategy for LintStrategy {
    fn name(&self) -> &str {
        "lint"
    }

    async fn run(&self, target: &Path) -> StrategyOutcome {
        let Some(mut cmd) = build_command(&self.program, &self.root) else {
            return StrategyOutcome::Unavailable("no lint program configured".to_string());
        };
        cmd.args(["--format", "json"]).arg(target);

        let result = match run_with_timeout(cmd, self.timeout, StreamMode::BufferOnly).await {
            Ok(result) => result,
            Err(failure) => return StrategyOutcome::Unavailable(failure.to_string()),
        };

        if !matches!(result.exit_code, 0 | 1) {
            return StrategyOutcome::Unavailable(format!(
                "lint exited with code {}: {}",
                result.exit_code, result.summary
            ));
        }

        match parse_lint_report(&result.output, &self.root) {
            Ok(records) if records.is_empty() => StrategyOutcome::NoResult,
            Ok(records) => StrategyOutcome::Found(records),
            Err(e) => StrategyOutcome::Unavailable(format!("unparsable lint output: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn report_for(file: &Path) -> String {
        serde_json::json!([{
            "filePath": file.to_string_lossy(),
            "messages": [
                {"ruleId": "no-undef", "severity": 2, "message": "'x' is not defined.", "line": 2, "column": 8},
                {"ruleId": "semi", "severity": 1, "message": "Missing semicolon.", "line": 1, "column": 10},
                {"ruleId": null, "severity": 2, "fatal": true, "message": "Parsing error: Unexpected token", "line": 3}
            ],
            "errorCount": 2,
            "warningCount": 1
        }])
        .to_string()
    }

    #[test]
    fn test_parse_keeps_only_errors() {
        let td = tempdir().unwrap();
        let file = td.path().join("app.js");
        std::fs::write(&file, "let a = 1\nconsole.log(x);\nlet = ;\n").unwrap();

        let records = parse_lint_report(&report_for(&file), td.path()).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].source.to_string(), "lint:no-undef");
        assert_eq!(records[0].message, "'x' is not defined.");
        assert_eq!(records[0].location.file_path, "app.js");
        assert_eq!((records[0].location.line, records[0].location.column), (2, 8));
        assert_eq!(records[0].snippet.as_deref(), Some("console.log(x);"));

        assert_eq!(records[1].source.to_string(), "lint:unknown");
        assert_eq!(records[1].location.column, 1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_lint_report("Oops! Something went wrong", Path::new("/")).is_err());
    }

    #[test]
    fn test_parse_empty_report() {
        let records = parse_lint_report("[]", Path::new("/")).unwrap();
        assert!(records.is_empty());
    }

    fn fake_tool(dir: &Path, name: &str, body: &str) -> String {
        let script = dir.join(name);
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        format!("sh {}", script.display())
    }

    #[tokio::test]
    async fn test_strategy_found() {
        let td = tempdir().unwrap();
        let file = td.path().join("app.js");
        std::fs::write(&file, "let a = 1\nconsole.log(x);\n").unwrap();
        let report = td.path().join("report.json");
        std::fs::write(&report, report_for(&file)).unwrap();

        let program = fake_tool(td.path(), "eslint.sh", &format!("cat {}\nexit 1", report.display()));
        let strategy = LintStrategy::new(program, td.path(), Duration::from_secs(10));
        match strategy.run(&file).await {
            StrategyOutcome::Found(records) => assert_eq!(records.len(), 2),
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_strategy_unexpected_exit_is_unavailable() {
        let td = tempdir().unwrap();
        let program = fake_tool(td.path(), "eslint.sh", "echo 'config error' >&2\nexit 2");
        let strategy = LintStrategy::new(program, td.path(), Duration::from_secs(10));
        assert!(matches!(
            strategy.run(Path::new("a.js")).await,
            StrategyOutcome::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_strategy_missing_tool_is_unavailable() {
        let td = tempdir().unwrap();
        let strategy = LintStrategy::new(
            "trail-no-such-linter",
            td.path(),
            Duration::from_secs(10),
        );
        match strategy.run(Path::new("a.js")).await {
            StrategyOutcome::Unavailable(reason) => assert!(reason.contains("not installed")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_strategy_clean_report_is_no_result() {
        let td = tempdir().unwrap();
        let program = fake_tool(td.path(), "eslint.sh", "echo '[]'");
        let strategy = LintStrategy::new(program, td.path(), Duration::from_secs(10));
        assert_eq!(strategy.run(Path::new("a.js")).await, StrategyOutcome::NoResult);
    }
}
