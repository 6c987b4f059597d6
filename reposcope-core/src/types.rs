//! Core data type definitions
//!
//! Every value here is created fresh for a single analysis run and is immutable once the
//! [`AnalysisReport`] has been built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::language::Language;

/// How a file was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Source in a recognised language; contributes to language rollups
    Source,
    /// Markdown, plain text and similar; lines are counted but never rolled up
    Prose,
    /// Null bytes or undecodable content; no line counts
    Binary,
    /// Unrecognised extension and no content match
    Unknown,
}

/// Why a file has no line counts despite being text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Larger than the configured `max_file_size`
    TooLarge,
    /// The read failed; a [`FileWarning`] was recorded
    Unreadable,
}

/// Per-file statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    pub size_bytes: u64,
    /// `None` means "unknown" for rollup purposes
    pub language: Option<Language>,
    pub kind: FileKind,
    pub skipped: Option<SkipReason>,
    pub code_lines: u64,
    pub comment_lines: u64,
    pub blank_lines: u64,
}

impl FileRecord {
    pub fn total_lines(&self) -> u64 {
        self.code_lines + self.comment_lines + self.blank_lines
    }

    pub fn is_binary(&self) -> bool {
        self.kind == FileKind::Binary
    }
}

/// Per-language rollup, recomputed wholesale for each report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageStat {
    pub language: Language,
    pub file_count: u64,
    pub code_lines: u64,
    pub comment_lines: u64,
    pub blank_lines: u64,
    /// Share of the report's total lines of code, 0-100
    pub percentage: f64,
}

/// Commit author; identities differing only in email are distinct contributors
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AuthorIdentity {
    pub name: String,
    pub email: String,
}

impl AuthorIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// One file touched by a commit, as reported by the history backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path after the commit
    pub path: String,
    /// Path before the commit when the change is a rename
    pub previous_path: Option<String>,
    /// `None` for binary diffs
    pub insertions: Option<u64>,
    pub deletions: Option<u64>,
}

impl FileChange {
    pub fn volume(&self) -> u64 {
        self.insertions.unwrap_or(0) + self.deletions.unwrap_or(0)
    }
}

/// A commit as streamed by a [`HistoryBackend`](crate::traits::HistoryBackend)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommit {
    pub hash: String,
    pub author: AuthorIdentity,
    pub timestamp: DateTime<Utc>,
    pub parent_count: u32,
    /// Merge commits list their first-parent diff only
    pub changes: Vec<FileChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: String,
    pub author: AuthorIdentity,
    pub timestamp: DateTime<Utc>,
    pub parent_count: u32,
    pub files_touched: u64,
    pub insertions: u64,
    pub deletions: u64,
}

impl CommitRecord {
    pub fn is_merge(&self) -> bool {
        self.parent_count > 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorStat {
    pub author: AuthorIdentity,
    pub commit_count: u64,
    pub insertions: u64,
    pub deletions: u64,
    pub first_commit: DateTime<Utc>,
    pub last_commit: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnEntry {
    /// Final path of the file; earlier names are folded into it
    pub path: String,
    pub commit_count: u64,
    /// Insertions plus deletions across history
    pub change_volume: u64,
}

/// Repository-level history summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSummary {
    pub total_commits: u64,
    pub merge_commits: u64,
    pub contributor_count: u64,
    /// Absent when the repository has no commits
    pub first_commit: Option<DateTime<Utc>>,
    pub last_commit: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHistory {
    pub summary: GitSummary,
    pub contributors: Vec<ContributorStat>,
    /// Top-N files by churn
    pub churn: Vec<ChurnEntry>,
    /// Commits per UTC day, `YYYY-MM-DD`
    pub commit_activity: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryFailureKind {
    NotAGitRepository,
    GitBackend,
    Timeout,
}

/// The historical side's error, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFailure {
    pub kind: HistoryFailureKind,
    pub message: String,
}

/// History metrics, or the reason they are absent. Absent is not the same as zero commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HistorySection {
    Available(GitHistory),
    Unavailable(HistoryFailure),
}

impl HistorySection {
    pub fn summary(&self) -> Option<&GitSummary> {
        match self {
            HistorySection::Available(history) => Some(&history.summary),
            HistorySection::Unavailable(_) => None,
        }
    }

    pub fn contributors(&self) -> &[ContributorStat] {
        match self {
            HistorySection::Available(history) => &history.contributors,
            HistorySection::Unavailable(_) => &[],
        }
    }

    pub fn churn(&self) -> &[ChurnEntry] {
        match self {
            HistorySection::Available(history) => &history.churn,
            HistorySection::Unavailable(_) => &[],
        }
    }

    pub fn failure(&self) -> Option<&HistoryFailure> {
        match self {
            HistorySection::Available(_) => None,
            HistorySection::Unavailable(failure) => Some(failure),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    PermissionDenied,
    Unreadable,
    /// The directory walk itself reported an error
    Walk,
}

/// Non-fatal problem with a single path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileWarning {
    pub path: String,
    pub kind: WarningKind,
    pub message: String,
}

/// Report totals. Line totals cover source files only, so they equal the sums over the
/// language rollups; file and size totals cover every file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub files: u64,
    pub size_bytes: u64,
    pub lines_of_code: u64,
    pub comment_lines: u64,
    pub blank_lines: u64,
    pub source_files: u64,
    pub prose_files: u64,
    pub binary_files: u64,
    pub unknown_files: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    pub path: PathBuf,
    pub name: String,
}

/// Complete analysis result, owned by the caller that requested it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub repository: RepositoryIdentity,
    pub analyzed_at: DateTime<Utc>,
    pub totals: Totals,
    /// Sorted by descending lines of code, then language name
    pub languages: Vec<LanguageStat>,
    /// Sorted by path
    pub files: Vec<FileRecord>,
    /// Rankings of at most `top_n_files` entries, ties broken by path
    pub largest_files: Vec<FileRecord>,
    pub smallest_files: Vec<FileRecord>,
    pub files_by_code: Vec<FileRecord>,
    /// Directory to number of files beneath it
    pub directory_structure: BTreeMap<String, u64>,
    pub history: HistorySection,
    pub warnings: Vec<FileWarning>,
}

impl AnalysisReport {
    /// True when the historical side failed and only structural data is present
    pub fn is_partial(&self) -> bool {
        matches!(self.history, HistorySection::Unavailable(_))
    }

    pub fn language(&self, language: Language) -> Option<&LanguageStat> {
        self.languages.iter().find(|stat| stat.language == language)
    }

    pub fn file(&self, path: &str) -> Option<&FileRecord> {
        self.files
            .binary_search_by(|record| record.path.as_str().cmp(path))
            .ok()
            .map(|index| &self.files[index])
    }
}
