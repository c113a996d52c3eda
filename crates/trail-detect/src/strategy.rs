use async_trait::async_trait;
use std::path::Path;
use trail_core::ErrorRecord;

/// Outcome of one detection strategy against one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// One or more problems; the pipeline stops here.
    Found(Vec<ErrorRecord>),
    /// The strategy positively verified the file; the pipeline stops with no errors.
    Clean,
    /// Ran, but had nothing to say; try the next strategy.
    NoResult,
    /// Could not run (missing binary, timeout, unexpected exit, garbled output).
    Unavailable(String),
}

/// One independent method of discovering errors in a file.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    async fn run(&self, target: &Path) -> StrategyOutcome;
}

/// Build a command from a configured program string such as `npx eslint`.
///
/// Returns `None` for an empty program string.
pub(crate) fn build_command(program: &str, root: &Path) -> Option<tokio::process::Command> {
    let mut parts = program.split_whitespace();
    let mut cmd = tokio::process::Command::new(parts.next()?);
    cmd.args(parts).current_dir(root);
    Some(cmd)
}
