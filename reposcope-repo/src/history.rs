//! Historical side of an analysis: commit records and per-file churn

use reposcope_core::{
    CancellationSignal, ChurnEntry, CommitRecord, ErrorContext, HistoryBackend, RawCommit,
    ReposcopeError, ReposcopeResult,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Commits in chronological order plus unranked churn keyed by final path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryData {
    pub commits: Vec<CommitRecord>,
    /// Sorted by path
    pub file_churn: Vec<ChurnEntry>,
}

pub struct HistoryMiner {
    backend: Arc<dyn HistoryBackend>,
}

impl HistoryMiner {
    pub fn new(backend: Arc<dyn HistoryBackend>) -> Self {
        Self { backend }
    }

    /// Read the full history reachable from HEAD.
    ///
    /// A repository without commits yields empty data, not an error.
    pub async fn mine(
        &self,
        root: &Path,
        cancel: &CancellationSignal,
    ) -> ReposcopeResult<HistoryData> {
        cancel.check("mine_history")?;

        if !self.backend.is_repository_root(root).await? {
            return Err(ReposcopeError::NotAGitRepository {
                path: root.display().to_string(),
                context: ErrorContext::new("history_miner")
                    .with_operation("mine")
                    .with_suggestion("Point the analysis at the directory containing .git"),
            });
        }

        if !self.backend.has_commits(root).await? {
            info!("📭 Repository has no commits yet");
            return Ok(HistoryData::default());
        }

        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ReposcopeError::Cancelled {
                    operation: "commit_log".to_string(),
                    context: ErrorContext::new("history_miner").with_operation("mine"),
                });
            }
            log = self.backend.commit_log(root) => log?,
        };

        info!("📜 Read {} commits from history", raw.len());
        Ok(build_history(raw))
    }
}

/// Build commit records and rename-aware churn from a newest-first log.
///
/// Walking newest to oldest lets every change be attributed to the name its file has at
/// HEAD: once a rename `old -> new` is seen, older changes to `old` count for the final
/// path of `new`.
pub fn build_history(newest_first: Vec<RawCommit>) -> HistoryData {
    let mut final_name: HashMap<String, String> = HashMap::new();
    let mut churn: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    let mut commits = Vec::with_capacity(newest_first.len());

    for raw in newest_first {
        let mut touched = HashSet::new();
        let mut insertions = 0;
        let mut deletions = 0;

        for change in &raw.changes {
            insertions += change.insertions.unwrap_or(0);
            deletions += change.deletions.unwrap_or(0);

            let resolved = final_name
                .get(&change.path)
                .cloned()
                .unwrap_or_else(|| change.path.clone());

            let entry = churn.entry(resolved.clone()).or_insert((0, 0));
            if touched.insert(resolved) {
                entry.0 += 1;
            }
            entry.1 += change.volume();
        }

        // Resolved against the map as it stood before this commit, so renames within one
        // commit (a swap, say) never see each other
        let renames: Vec<(String, String)> = raw
            .changes
            .iter()
            .filter_map(|change| {
                let previous = change.previous_path.clone()?;
                let resolved = final_name
                    .get(&change.path)
                    .cloned()
                    .unwrap_or_else(|| change.path.clone());
                Some((previous, resolved))
            })
            .collect();
        final_name.extend(renames);

        commits.push(CommitRecord {
            hash: raw.hash,
            author: raw.author,
            timestamp: raw.timestamp,
            parent_count: raw.parent_count,
            files_touched: raw.changes.len() as u64,
            insertions,
            deletions,
        });
    }

    commits.reverse();
    commits.sort_by_key(|commit| commit.timestamp);

    HistoryData {
        commits,
        file_churn: churn
            .into_iter()
            .map(|(path, (commit_count, change_volume))| ChurnEntry {
                path,
                commit_count,
                change_volume,
            })
            .collect(),
    }
}
