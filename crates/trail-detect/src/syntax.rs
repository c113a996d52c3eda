//! Syntax-check strategy: `<program> --check <file>`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use trail_core::ErrorSource;
use trail_process::{StreamMode, run_with_timeout};

use crate::matchers::extract_from_text;
use crate::strategy::{Strategy, StrategyOutcome, build_command};

/// A passing check ends detection with no errors; a failing one yields
/// exactly one record built from the checker's combined output.
#[derive(Debug, Clone)]
pub struct SyntaxStrategy {
    program: String,
    root: PathBuf,
    timeout: Duration,
}

impl SyntaxStrategy {
    pub fn new(program: impl Into<String>, root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            root: root.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Strategy for SyntaxStrategy {
    fn name(&self) -> &str {
        "syntax-check"
    }

    async fn run(&self, target: &Path) -> StrategyOutcome {
        let Some(mut cmd) = build_command(&self.program, &self.root) else {
            return StrategyOutcome::Unavailable("no syntax checker configured".to_string());
        };
        cmd.arg("--check").arg(target);

        let result = match run_with_timeout(cmd, self.timeout, StreamMode::BufferOnly).await {
            Ok(result) => result,
            Err(failure) => return StrategyOutcome::Unavailable(failure.to_string()),
        };

        if result.success() {
            return StrategyOutcome::Clean;
        }

        let text = result.combined_output();
        let record = extract_from_text(&text, &self.root, target, ErrorSource::SyntaxCheck);
        StrategyOutcome::Found(vec![record])
    }
}
