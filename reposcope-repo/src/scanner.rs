//! Structural side of an analysis: walk, classify and count every file

use crate::classifier::{Classification, LanguageClassifier};
use crate::counter::{decode, Decoded, LineCounter, LineCounts};
use crate::filter::IgnorePolicy;
use crate::walker::{CandidateFile, FileWalker, WalkItem};
use reposcope_core::{
    performance::measure_sync, process_concurrently, AnalysisOptions, CancellationSignal,
    CommentRules, ErrorContext, FileKind, FileRecord, FileWarning, ReposcopeError,
    ReposcopeResult, SkipReason, WarningKind,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Files and warnings collected from the working tree, both sorted by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralScan {
    pub files: Vec<FileRecord>,
    pub warnings: Vec<FileWarning>,
}

/// Outcome of scanning one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub record: FileRecord,
    pub warning: Option<FileWarning>,
}

/// Reads, classifies and counts single files. Blocking; run it off the async runtime.
#[derive(Debug, Clone)]
pub struct FileScanner {
    classifier: Arc<LanguageClassifier>,
    max_file_size: Option<u64>,
}

impl FileScanner {
    pub fn new(classifier: Arc<LanguageClassifier>, max_file_size: Option<u64>) -> Self {
        Self {
            classifier,
            max_file_size,
        }
    }

    pub fn scan_file(&self, candidate: &CandidateFile) -> ScannedFile {
        let relative = Path::new(&candidate.relative_path);

        if self
            .max_file_size
            .is_some_and(|limit| candidate.size_bytes > limit)
        {
            debug!(
                path = %candidate.relative_path,
                size = candidate.size_bytes,
                "Skipping oversized file"
            );
            let classification = self.classifier.classify(relative, None);
            return ScannedFile {
                record: record(
                    candidate,
                    classification,
                    Some(SkipReason::TooLarge),
                    LineCounts::default(),
                ),
                warning: None,
            };
        }

        let bytes = match std::fs::read(&candidate.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let kind = if e.kind() == std::io::ErrorKind::PermissionDenied {
                    WarningKind::PermissionDenied
                } else {
                    WarningKind::Unreadable
                };
                return unreadable(candidate, self.classifier.classify(relative, None), kind, &e);
            }
        };

        let text = match decode(&bytes) {
            Decoded::Text(text) => text,
            Decoded::Binary => {
                return ScannedFile {
                    record: FileRecord {
                        path: candidate.relative_path.clone(),
                        size_bytes: bytes.len() as u64,
                        language: None,
                        kind: FileKind::Binary,
                        skipped: None,
                        code_lines: 0,
                        comment_lines: 0,
                        blank_lines: 0,
                    },
                    warning: None,
                };
            }
        };

        let classification = self.classifier.classify(relative, Some(&text));
        let rules = classification
            .language()
            .map(|language| language.rules())
            .unwrap_or(CommentRules::NONE);
        let counts = LineCounter::count(rules, &text);

        let mut record = record(candidate, classification, None, counts);
        record.size_bytes = bytes.len() as u64;
        ScannedFile {
            record,
            warning: None,
        }
    }
}

fn record(
    candidate: &CandidateFile,
    classification: Classification,
    skipped: Option<SkipReason>,
    counts: LineCounts,
) -> FileRecord {
    let kind = match classification {
        Classification::Source(_) => FileKind::Source,
        Classification::Prose => FileKind::Prose,
        Classification::Unknown => FileKind::Unknown,
    };
    FileRecord {
        path: candidate.relative_path.clone(),
        size_bytes: candidate.size_bytes,
        language: classification.language(),
        kind,
        skipped,
        code_lines: counts.code,
        comment_lines: counts.comment,
        blank_lines: counts.blank,
    }
}

fn unreadable(
    candidate: &CandidateFile,
    classification: Classification,
    kind: WarningKind,
    error: &dyn std::fmt::Display,
) -> ScannedFile {
    warn!(path = %candidate.relative_path, error = %error, "Failed to read file");
    ScannedFile {
        record: record(
            candidate,
            classification,
            Some(SkipReason::Unreadable),
            LineCounts::default(),
        ),
        warning: Some(FileWarning {
            path: candidate.relative_path.clone(),
            kind,
            message: error.to_string(),
        }),
    }
}

/// Walk the tree and scan every candidate with at most `max_concurrency` reads in flight.
///
/// Per-file failures end up as warnings; only cancellation aborts the scan.
pub async fn scan_repository(
    root: &Path,
    options: &AnalysisOptions,
    classifier: Arc<LanguageClassifier>,
    cancel: CancellationSignal,
) -> ReposcopeResult<StructuralScan> {
    let policy = IgnorePolicy::from_options(options)?;
    let walker = FileWalker::new(root, policy);

    info!("🔍 Walking repository tree: {}", root.display());

    let walk_cancel = cancel.clone();
    let items = tokio::task::spawn_blocking(move || {
        measure_sync("walk_tree", || {
            walker
                .walk(walk_cancel)
                .collect::<ReposcopeResult<Vec<WalkItem>>>()
        })
    })
    .await
    .map_err(|e| join_error("walk", e))??;

    let mut candidates = Vec::new();
    let mut warnings = Vec::new();
    for item in items {
        match item {
            WalkItem::File(file) => candidates.push(file),
            WalkItem::Warning(warning) => warnings.push(warning),
        }
    }

    info!("📄 Scanning {} files", candidates.len());

    let scanner = FileScanner::new(classifier, options.max_file_size);
    let results = process_concurrently(candidates, options.max_concurrency, move |candidate| {
        let scanner = scanner.clone();
        let cancel = cancel.clone();
        async move {
            cancel.check("scan_file")?;
            let fallback = candidate.clone();
            match tokio::task::spawn_blocking(move || scanner.scan_file(&candidate)).await {
                Ok(scanned) => Ok(scanned),
                Err(e) => Ok(unreadable(
                    &fallback,
                    Classification::Unknown,
                    WarningKind::Unreadable,
                    &e,
                )),
            }
        }
    })
    .await;

    let mut files = Vec::with_capacity(results.len());
    for result in results {
        let scanned = result?;
        files.push(scanned.record);
        warnings.extend(scanned.warning);
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    warnings.sort_by(|a, b| a.path.cmp(&b.path));

    info!(
        "✅ Structural scan complete: {} files, {} warnings",
        files.len(),
        warnings.len()
    );

    Ok(StructuralScan { files, warnings })
}

fn join_error(operation: &str, error: tokio::task::JoinError) -> ReposcopeError {
    ReposcopeError::Internal {
        message: format!("Task join error: {}", error),
        source: Some(Box::new(error)),
        context: ErrorContext::new("scanner").with_operation(operation),
    }
}
