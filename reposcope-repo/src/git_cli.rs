//! History backend driven by the `git` command line

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reposcope_core::{
    git_backend_error, AuthorIdentity, ErrorContext, FileChange, HistoryBackend, RawCommit,
    ReposcopeError, ReposcopeResult,
};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

const RECORD_START: char = '\u{1e}';
const FIELD_SEPARATOR: char = '\u{1f}';
const LOG_FORMAT: &str = "--format=%x1e%H%x1f%P%x1f%an%x1f%ae%x1f%at";

/// Runs `git` as a child process. The child is killed when the future is dropped, so a
/// timeout or cancellation never leaves a stray process behind.
///
/// Needs git 2.31 or newer for `--diff-merges=first-parent`.
#[derive(Debug, Clone)]
pub struct GitCliBackend {
    git_binary: PathBuf,
}

impl Default for GitCliBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCliBackend {
    pub fn new() -> Self {
        Self {
            git_binary: PathBuf::from("git"),
        }
    }

    /// Use a specific git executable instead of the one on `PATH`
    pub fn with_binary<P: Into<PathBuf>>(git_binary: P) -> Self {
        Self {
            git_binary: git_binary.into(),
        }
    }

    async fn run_git(
        &self,
        repo: &Path,
        args: &[&str],
        operation: &str,
    ) -> ReposcopeResult<Output> {
        debug!(repo = %repo.display(), ?args, "Running git");

        Command::new(&self.git_binary)
            .args(args)
            .current_dir(repo)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ReposcopeError::GitBackend {
                message: format!("Failed to execute git: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("git_cli")
                    .with_operation(operation)
                    .with_metadata("repo", &repo.display().to_string())
                    .with_suggestion("Ensure git is installed and accessible"),
            })
    }
}

#[async_trait]
impl HistoryBackend for GitCliBackend {
    async fn is_repository_root(&self, path: &Path) -> ReposcopeResult<bool> {
        Ok(tokio::fs::metadata(path.join(".git")).await.is_ok())
    }

    async fn has_commits(&self, path: &Path) -> ReposcopeResult<bool> {
        let output = self
            .run_git(
                path,
                &["rev-parse", "--verify", "--quiet", "HEAD^{commit}"],
                "has_commits",
            )
            .await?;

        if output.status.success() {
            return Ok(true);
        }
        // An unborn HEAD exits 1 without output
        if output.status.code() == Some(1) && output.stderr.is_empty() {
            return Ok(false);
        }

        Err(git_backend_error!(
            format!(
                "git rev-parse failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            "git_cli"
        ))
    }

    async fn commit_log(&self, path: &Path) -> ReposcopeResult<Vec<RawCommit>> {
        let output = self
            .run_git(
                path,
                &[
                    "-c",
                    "core.quotePath=false",
                    "log",
                    "--no-color",
                    "--numstat",
                    "-M",
                    "--diff-merges=first-parent",
                    "--date-order",
                    LOG_FORMAT,
                    "HEAD",
                ],
                "commit_log",
            )
            .await?;

        if !output.status.success() {
            return Err(git_backend_error!(
                format!(
                    "git log failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                "git_cli"
            ));
        }

        parse_log(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the `--numstat` log produced by [`GitCliBackend::commit_log`], newest commit first
pub fn parse_log(raw_log: &str) -> ReposcopeResult<Vec<RawCommit>> {
    let mut commits = Vec::new();
    let mut current: Option<RawCommit> = None;

    for line in raw_log.lines() {
        if let Some(header) = line.strip_prefix(RECORD_START) {
            commits.extend(current.take());
            current = Some(parse_header(header)?);
        } else if !line.trim().is_empty() {
            if let Some(commit) = current.as_mut() {
                commit.changes.extend(parse_numstat_line(line));
            }
        }
    }

    commits.extend(current);
    Ok(commits)
}

fn parse_header(header: &str) -> ReposcopeResult<RawCommit> {
    let fields: Vec<&str> = header.split(FIELD_SEPARATOR).collect();
    let [hash, parents, name, email, author_time] = fields[..] else {
        return Err(git_backend_error!(
            format!("Malformed commit header: {:?}", header),
            "git_cli"
        ));
    };

    let timestamp = author_time
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or_else(|| {
            git_backend_error!(
                format!("Invalid author timestamp {:?} in commit {}", author_time, hash),
                "git_cli"
            )
        })?;

    Ok(RawCommit {
        hash: hash.to_string(),
        author: AuthorIdentity::new(name, email),
        timestamp,
        parent_count: parents.split_whitespace().count() as u32,
        changes: Vec::new(),
    })
}

/// Parse one `insertions<TAB>deletions<TAB>path` line; binary entries use `-` for both counts
pub fn parse_numstat_line(line: &str) -> Option<FileChange> {
    let mut parts = line.splitn(3, '\t');
    let insertions = parse_count(parts.next()?)?;
    let deletions = parse_count(parts.next()?)?;
    let (previous_path, path) = parse_rename_path(parts.next()?);

    Some(FileChange {
        path,
        previous_path,
        insertions,
        deletions,
    })
}

fn parse_count(field: &str) -> Option<Option<u64>> {
    match field {
        "-" => Some(None),
        digits => digits.parse().ok().map(Some),
    }
}

/// Split a numstat path into `(previous, current)`. Handles `old => new` and the compact
/// `dir/{old => new}/file` form.
pub fn parse_rename_path(raw: &str) -> (Option<String>, String) {
    let raw = unquote(raw);

    if let (Some(open), Some(close)) = (raw.find('{'), raw.rfind('}')) {
        if open < close {
            let inner = &raw[open + 1..close];
            if let Some((old, new)) = inner.split_once(" => ") {
                let prefix = &raw[..open];
                let suffix = &raw[close + 1..];
                return (
                    Some(join_rename_part(prefix, old, suffix)),
                    join_rename_part(prefix, new, suffix),
                );
            }
        }
    }

    match raw.split_once(" => ") {
        Some((old, new)) => (Some(old.to_string()), new.to_string()),
        None => (None, raw),
    }
}

fn join_rename_part(prefix: &str, middle: &str, suffix: &str) -> String {
    let joined = format!("{}{}{}", prefix, middle, suffix);
    joined.replace("//", "/").trim_start_matches('/').to_string()
}

/// Undo git's C-style quoting of unusual paths
fn unquote(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return raw.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some('"') => bytes.push(b'"'),
            Some('\\') => bytes.push(b'\\'),
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(next) => {
                            value = value * 8 + next;
                            chars.next();
                        }
                        None => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => {
                bytes.push(b'\\');
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => bytes.push(b'\\'),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}
