//! Report assembly from the structural scan and the mined history

use crate::history::HistoryData;
use crate::scanner::StructuralScan;
use chrono::Utc;
use reposcope_core::{
    validation_error, AnalysisOptions, AnalysisReport, AuthorIdentity, ChurnEntry, CommitRecord,
    ContributorStat, FileKind, FileRecord, GitHistory, GitSummary, HistoryFailure,
    HistoryFailureKind, HistorySection, Language, LanguageStat, ReposcopeError,
    ReposcopeResult, RepositoryIdentity, Totals,
};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Builds an [`AnalysisReport`]. Every derived figure is recomputed from the inputs.
pub struct ReportAggregator<'a> {
    options: &'a AnalysisOptions,
}

impl<'a> ReportAggregator<'a> {
    pub fn new(options: &'a AnalysisOptions) -> Self {
        Self { options }
    }

    /// Combine both sides. A failed history becomes an `Unavailable` section; only a
    /// cancelled history fails the whole build.
    pub fn build(
        &self,
        repository: RepositoryIdentity,
        structural: StructuralScan,
        history: ReposcopeResult<HistoryData>,
    ) -> ReposcopeResult<AnalysisReport> {
        if self.options.top_n_churn == 0 {
            return Err(validation_error!(
                "top_n_churn must be a positive integer",
                "top_n_churn",
                "report_aggregator"
            ));
        }

        let history = match history {
            Ok(data) => HistorySection::Available(self.git_history(&data)),
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => {
                err.log();
                HistorySection::Unavailable(history_failure(&err))
            }
        };

        let StructuralScan { files, warnings } = structural;
        let languages = language_rollup(&files);
        let totals = compute_totals(&files, &languages);
        let top_n = self.options.top_n_files;

        let report = AnalysisReport {
            repository,
            analyzed_at: Utc::now(),
            totals,
            languages,
            largest_files: rank_files(&files, top_n, |a, b| b.size_bytes.cmp(&a.size_bytes)),
            smallest_files: rank_files(&files, top_n, |a, b| a.size_bytes.cmp(&b.size_bytes)),
            files_by_code: rank_files(&files, top_n, |a, b| b.code_lines.cmp(&a.code_lines)),
            directory_structure: directory_structure(&files),
            files,
            history,
            warnings,
        };

        info!(
            files = report.totals.files,
            languages = report.languages.len(),
            partial = report.is_partial(),
            "📊 Report assembled"
        );

        Ok(report)
    }

    fn git_history(&self, data: &HistoryData) -> GitHistory {
        let contributors = contributor_stats(&data.commits);
        GitHistory {
            summary: GitSummary {
                total_commits: data.commits.len() as u64,
                merge_commits: data.commits.iter().filter(|c| c.is_merge()).count() as u64,
                contributor_count: contributors.len() as u64,
                first_commit: data.commits.iter().map(|c| c.timestamp).min(),
                last_commit: data.commits.iter().map(|c| c.timestamp).max(),
            },
            contributors,
            churn: rank_churn(&data.file_churn, self.options.top_n_churn),
            commit_activity: commit_activity(&data.commits),
        }
    }
}

fn history_failure(err: &ReposcopeError) -> HistoryFailure {
    let kind = match err {
        ReposcopeError::NotAGitRepository { .. } => HistoryFailureKind::NotAGitRepository,
        ReposcopeError::Timeout { .. } => HistoryFailureKind::Timeout,
        _ => HistoryFailureKind::GitBackend,
    };
    warn!(?kind, error = %err, "History unavailable, keeping structural results");
    HistoryFailure {
        kind,
        message: err.to_string(),
    }
}

/// Group source files by language. Percentages use the final total so they never drift.
///
/// With no code lines at all every percentage is 0, so they sum to 0 rather than 100.
pub fn language_rollup(files: &[FileRecord]) -> Vec<LanguageStat> {
    let mut groups: BTreeMap<Language, (u64, u64, u64, u64)> = BTreeMap::new();
    for file in files.iter().filter(|f| f.kind == FileKind::Source) {
        let Some(language) = file.language else {
            continue;
        };
        let entry = groups.entry(language).or_default();
        entry.0 += 1;
        entry.1 += file.code_lines;
        entry.2 += file.comment_lines;
        entry.3 += file.blank_lines;
    }

    let total_code: u64 = groups.values().map(|g| g.1).sum();

    let mut stats: Vec<LanguageStat> = groups
        .into_iter()
        .map(|(language, (file_count, code, comment, blank))| LanguageStat {
            language,
            file_count,
            code_lines: code,
            comment_lines: comment,
            blank_lines: blank,
            percentage: if total_code == 0 {
                0.0
            } else {
                code as f64 * 100.0 / total_code as f64
            },
        })
        .collect();

    stats.sort_by(|a, b| {
        b.code_lines
            .cmp(&a.code_lines)
            .then_with(|| a.language.name().cmp(b.language.name()))
    });
    stats
}

/// Line totals are the sums over the rollups; file and size totals cover everything
pub fn compute_totals(files: &[FileRecord], languages: &[LanguageStat]) -> Totals {
    let mut totals = Totals {
        files: files.len() as u64,
        size_bytes: files.iter().map(|f| f.size_bytes).sum(),
        lines_of_code: languages.iter().map(|l| l.code_lines).sum(),
        comment_lines: languages.iter().map(|l| l.comment_lines).sum(),
        blank_lines: languages.iter().map(|l| l.blank_lines).sum(),
        ..Totals::default()
    };

    for file in files {
        match file.kind {
            FileKind::Source => totals.source_files += 1,
            FileKind::Prose => totals.prose_files += 1,
            FileKind::Binary => totals.binary_files += 1,
            FileKind::Unknown => totals.unknown_files += 1,
        }
    }

    totals
}

/// First `n` files under `order`, ties broken by path
fn rank_files<F>(files: &[FileRecord], n: usize, order: F) -> Vec<FileRecord>
where
    F: Fn(&FileRecord, &FileRecord) -> Ordering,
{
    let mut ranked: Vec<&FileRecord> = files.iter().collect();
    ranked.sort_by(|a, b| order(a, b).then_with(|| a.path.cmp(&b.path)));
    ranked.into_iter().take(n).cloned().collect()
}

/// Every proper ancestor directory of a file mapped to the number of files below it
pub fn directory_structure(files: &[FileRecord]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for file in files {
        let mut end = 0;
        while let Some(offset) = file.path[end..].find('/') {
            end += offset;
            *counts.entry(file.path[..end].to_string()).or_insert(0) += 1;
            end += 1;
        }
    }
    counts
}

/// Contributors ordered by commit count, then earliest first commit
pub fn contributor_stats(commits: &[CommitRecord]) -> Vec<ContributorStat> {
    let mut by_author: HashMap<&AuthorIdentity, ContributorStat> = HashMap::new();

    for commit in commits {
        by_author
            .entry(&commit.author)
            .and_modify(|stat| {
                stat.commit_count += 1;
                stat.insertions += commit.insertions;
                stat.deletions += commit.deletions;
                stat.first_commit = stat.first_commit.min(commit.timestamp);
                stat.last_commit = stat.last_commit.max(commit.timestamp);
            })
            .or_insert_with(|| ContributorStat {
                author: commit.author.clone(),
                commit_count: 1,
                insertions: commit.insertions,
                deletions: commit.deletions,
                first_commit: commit.timestamp,
                last_commit: commit.timestamp,
            });
    }

    let mut stats: Vec<ContributorStat> = by_author.into_values().collect();
    stats.sort_by(|a, b| {
        b.commit_count
            .cmp(&a.commit_count)
            .then_with(|| a.first_commit.cmp(&b.first_commit))
            .then_with(|| a.author.cmp(&b.author))
    });
    stats
}

/// Top `n` entries by commit count, then change volume, then path
pub fn rank_churn(entries: &[ChurnEntry], n: usize) -> Vec<ChurnEntry> {
    let mut ranked = entries.to_vec();
    ranked.sort_by(|a, b| {
        (Reverse(a.commit_count), Reverse(a.change_volume), &a.path).cmp(&(
            Reverse(b.commit_count),
            Reverse(b.change_volume),
            &b.path,
        ))
    });
    ranked.truncate(n);
    ranked
}

/// Commits per UTC calendar day
pub fn commit_activity(commits: &[CommitRecord]) -> BTreeMap<String, u64> {
    let mut activity = BTreeMap::new();
    for commit in commits {
        *activity
            .entry(commit.timestamp.format("%Y-%m-%d").to_string())
            .or_insert(0) += 1;
    }
    activity
}
