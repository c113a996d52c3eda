use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use trail_config::DetectionSettings;
use trail_core::ErrorRecord;

use crate::lint::LintStrategy;
use crate::strategy::{Strategy, StrategyOutcome};
use crate::syntax::SyntaxStrategy;

/// Ordered chain of detection strategies.
///
/// Strategies run strictly one after another. The first one that finds
/// anything wins and later ones are never consulted; a strategy reporting
/// `Clean` ends detection with no errors.
#[derive(Clone)]
pub struct DetectionPipeline {
    strategies: Vec<Arc<dyn Strategy>>,
    debug: bool,
    max_parallel: usize,
}

impl DetectionPipeline {
    pub fn new(strategies: Vec<Arc<dyn Strategy>>) -> Self {
        Self {
            strategies,
            debug: false,
            max_parallel: 1,
        }
    }

    /// Lint first, then syntax check, with tools and limits from settings.
    pub fn from_settings(settings: &DetectionSettings, root: &Path) -> Self {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let strategies: Vec<Arc<dyn Strategy>> = vec![
            Arc::new(LintStrategy::new(&settings.lint_program, root, timeout)),
            Arc::new(SyntaxStrategy::new(&settings.syntax_program, root, timeout)),
        ];
        Self::new(strategies).with_max_parallel(settings.parallelism())
    }

    /// Surface strategy failures as warnings instead of debug logs.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Detect errors in one file. Never fails; an empty result means no errors
    /// were found or nothing could run.
    pub async fn detect(&self, target: &Path) -> Vec<ErrorRecord> {
        for strategy in &self.strategies {
            match strategy.run(target).await {
                StrategyOutcome::Found(records) if !records.is_empty() => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        target = %target.display(),
                        count = records.len(),
                        "Strategy reported errors"
                    );
                    return records;
                }
                StrategyOutcome::Found(_) | StrategyOutcome::NoResult => {}
                StrategyOutcome::Clean => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        target = %target.display(),
                        "Strategy verified file"
                    );
                    return Vec::new();
                }
                StrategyOutcome::Unavailable(reason) => {
                    if self.debug {
                        tracing::warn!(
                            strategy = strategy.name(),
                            target = %target.display(),
                            %reason,
                            "Detection strategy unavailable"
                        );
                    } else {
                        tracing::debug!(strategy = strategy.name(), %reason, "Strategy unavailable");
                    }
                }
            }
        }
        Vec::new()
    }

    /// Detect errors in several files with bounded concurrency.
    ///
    /// Results are returned in input order regardless of completion order.
    pub async fn detect_many(&self, files: &[PathBuf]) -> Vec<(PathBuf, Vec<ErrorRecord>)> {
        if files.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut tasks = JoinSet::new();
        for (index, file) in files.iter().cloned().enumerate() {
            let pipeline = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // The semaphore is never closed, so acquire only fails if it were.
                let _permit = semaphore.acquire_owned().await.ok();
                let records = pipeline.detect(&file).await;
                (index, records)
            });
        }

        let mut slots: Vec<Vec<ErrorRecord>> = vec![Vec::new(); files.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, records)) => slots[index] = records,
                Err(e) => tracing::warn!(error = %e, "Detection task failed"),
            }
        }

        files.iter().cloned().zip(slots).collect()
    }
}

/// Append a `user-provided` record when detection found nothing and the
/// caller supplied an error string.
pub fn user_provided_fallback(
    records: Vec<ErrorRecord>,
    error: Option<&str>,
    file: Option<&str>,
) -> Vec<ErrorRecord> {
    if !records.is_empty() {
        return records;
    }
    match error.map(str::trim).filter(|e| !e.is_empty()) {
        Some(message) => vec![ErrorRecord::user_provided(message, file)],
        None => records,
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
