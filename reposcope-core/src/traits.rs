//! Core trait definitions

use crate::error::ReposcopeResult;
use crate::types::RawCommit;
use async_trait::async_trait;
use std::path::Path;

/// Version-control backend consumed by the history miner.
///
/// Implementations own the transport (subprocess, library bindings) and the parsing of
/// its output; the miner only sees [`RawCommit`] values.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Whether `path` is the root of a repository (version-control metadata present)
    async fn is_repository_root(&self, path: &Path) -> ReposcopeResult<bool>;

    /// Whether the repository has at least one commit reachable from HEAD
    async fn has_commits(&self, path: &Path) -> ReposcopeResult<bool>;

    /// Full commit log, newest first, with first-parent diffs for merges and renames
    /// detected
    async fn commit_log(&self, path: &Path) -> ReposcopeResult<Vec<RawCommit>>;
}
