//! Analysis entry point
//!
//! Runs the structural side (walk, classify, count) and the historical side (git log) at
//! the same time and joins them in the [`ReportAggregator`].

use crate::aggregator::ReportAggregator;
use crate::classifier::LanguageClassifier;
use crate::git_cli::GitCliBackend;
use crate::history::{HistoryData, HistoryMiner};
use crate::scanner::{scan_repository, StructuralScan};
use reposcope_core::{
    log_operation_error, log_operation_start, log_operation_success, not_found_error,
    performance::measure_async, with_optional_timeout, AnalysisOptions, AnalysisReport,
    CancellationSignal, HistoryBackend, ReposcopeResult, RepositoryIdentity,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Analyze the repository at `repository_root` with the default git backend
pub async fn analyze<P: AsRef<Path>>(
    repository_root: P,
    options: AnalysisOptions,
) -> ReposcopeResult<AnalysisReport> {
    Analyzer::new(options)?.analyze(repository_root).await
}

/// Configurable analysis runner
pub struct Analyzer {
    options: Arc<AnalysisOptions>,
    classifier: Arc<LanguageClassifier>,
    backend: Arc<dyn HistoryBackend>,
    cancel: CancellationSignal,
}

impl Analyzer {
    /// Validates the options up front so a bad configuration never starts any work
    pub fn new(options: AnalysisOptions) -> ReposcopeResult<Self> {
        options.validate()?;
        Ok(Self {
            options: Arc::new(options),
            classifier: Arc::new(LanguageClassifier::new()?),
            backend: Arc::new(GitCliBackend::new()),
            cancel: CancellationSignal::new(),
        })
    }

    /// Swap the version-control backend
    pub fn with_backend(mut self, backend: Arc<dyn HistoryBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Use an externally owned stop signal
    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancel = signal;
        self
    }

    /// Handle for stopping a running analysis
    pub fn cancellation(&self) -> CancellationSignal {
        self.cancel.clone()
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub async fn analyze<P: AsRef<Path>>(
        &self,
        repository_root: P,
    ) -> ReposcopeResult<AnalysisReport> {
        let root = resolve_root(repository_root.as_ref()).await?;
        log_operation_start!("analyze", root = %root.display());

        let result = self.run(&root).await;
        match &result {
            Ok(report) => {
                log_operation_success!(
                    "analyze",
                    files = report.totals.files,
                    partial = report.is_partial()
                );
            }
            Err(err) => {
                log_operation_error!("analyze", err);
            }
        }
        result
    }

    async fn run(&self, root: &Path) -> ReposcopeResult<AnalysisReport> {
        self.cancel.check("analyze")?;

        // Work is driven by a run-local signal so a timed-out side can be told to stop
        // without touching the caller's signal
        let run_signal = CancellationSignal::new();
        let forward = {
            let caller = self.cancel.clone();
            let run = run_signal.clone();
            tokio::spawn(async move {
                caller.cancelled().await;
                run.cancel();
            })
        };

        let (structural, history) = tokio::join!(
            self.structural(root, &run_signal),
            self.history(root, &run_signal)
        );

        forward.abort();
        run_signal.cancel();

        self.cancel.check("analyze")?;
        let structural = structural?;

        info!("🧮 Aggregating report");
        ReportAggregator::new(&self.options).build(repository_identity(root), structural, history)
    }

    async fn structural(
        &self,
        root: &Path,
        cancel: &CancellationSignal,
    ) -> ReposcopeResult<StructuralScan> {
        with_optional_timeout(
            measure_async(
                "structural_scan",
                scan_repository(root, &self.options, self.classifier.clone(), cancel.clone()),
            ),
            self.options.timeout_ms,
            "structural_scan",
        )
        .await
    }

    async fn history(
        &self,
        root: &Path,
        cancel: &CancellationSignal,
    ) -> ReposcopeResult<HistoryData> {
        let miner = HistoryMiner::new(self.backend.clone());
        with_optional_timeout(
            measure_async("history_mining", miner.mine(root, cancel)),
            self.options.timeout_ms,
            "history_mining",
        )
        .await
    }
}

async fn resolve_root(path: &Path) -> ReposcopeResult<PathBuf> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(tokio::fs::canonicalize(path).await?),
        _ => Err(not_found_error!(path.display(), "analyzer")),
    }
}

fn repository_identity(root: &Path) -> RepositoryIdentity {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    RepositoryIdentity {
        path: root.to_path_buf(),
        name,
    }
}
