//! Repository tree traversal
//!
//! The walk is lazy and single-pass: iterate a [`FileWalk`] once, or call
//! [`FileWalker::walk`] again to start over.

use crate::filter::IgnorePolicy;
use ignore::{DirEntry, WalkBuilder};
use reposcope_core::{
    CancellationSignal, ErrorContext, FileWarning, ReposcopeError, ReposcopeResult, WarningKind,
};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A regular file that survived the ignore policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Absolute path used for reading
    pub path: PathBuf,
    /// Path relative to the walk root, `/`-separated
    pub relative_path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkItem {
    File(CandidateFile),
    Warning(FileWarning),
}

#[derive(Debug, Clone)]
pub struct FileWalker {
    root: PathBuf,
    policy: IgnorePolicy,
}

impl FileWalker {
    pub fn new<P: AsRef<Path>>(root: P, policy: IgnorePolicy) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            policy,
        }
    }

    pub fn walk(&self, cancel: CancellationSignal) -> FileWalk {
        let mut builder = WalkBuilder::new(&self.root);

        // Hidden files are counted; VCS metadata is pruned by the deny-list instead
        builder
            .hidden(false)
            .parents(false)
            .ignore(self.policy.use_gitignore)
            .git_ignore(self.policy.use_gitignore)
            .git_exclude(self.policy.use_gitignore)
            .git_global(self.policy.use_gitignore)
            .require_git(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        let root = self.root.clone();
        let policy = self.policy.clone();
        builder.filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            if !is_dir {
                return true;
            }
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            let keep = policy.should_traverse_directory(relative);
            if !keep {
                debug!(directory = %relative.display(), "Pruning ignored directory");
            }
            keep
        });

        FileWalk {
            root: self.root.clone(),
            policy: self.policy.clone(),
            inner: builder.build(),
            cancel,
            finished: false,
        }
    }
}

/// Lazy sequence of walk results
pub struct FileWalk {
    root: PathBuf,
    policy: IgnorePolicy,
    inner: ignore::Walk,
    cancel: CancellationSignal,
    finished: bool,
}

impl FileWalk {
    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn entry_item(&self, entry: DirEntry) -> Option<WalkItem> {
        if entry.depth() == 0 {
            return None;
        }

        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            debug!(path = %entry.path().display(), "Skipping symbolic link");
            return None;
        }
        if !file_type.is_file() {
            return None;
        }

        let relative_path = self.relative(entry.path());
        if !self.policy.should_include_file(Path::new(&relative_path)) {
            return None;
        }

        match entry.metadata() {
            Ok(metadata) => Some(WalkItem::File(CandidateFile {
                path: entry.path().to_path_buf(),
                relative_path,
                size_bytes: metadata.len(),
            })),
            Err(err) => Some(WalkItem::Warning(self.warning_for(&err, Some(relative_path)))),
        }
    }

    fn warning_for(&self, err: &ignore::Error, fallback_path: Option<String>) -> FileWarning {
        let path = error_path(err)
            .map(|p| self.relative(&p))
            .or(fallback_path)
            .unwrap_or_default();
        let kind = match err.io_error().map(|io| io.kind()) {
            Some(std::io::ErrorKind::PermissionDenied) => WarningKind::PermissionDenied,
            Some(_) => WarningKind::Unreadable,
            None => WarningKind::Walk,
        };
        warn!(path = %path, error = %err, "Skipping unreadable path");
        FileWarning {
            path,
            kind,
            message: err.to_string(),
        }
    }
}

impl Iterator for FileWalk {
    type Item = ReposcopeResult<WalkItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            if self.cancel.is_cancelled() {
                self.finished = true;
                return Some(Err(ReposcopeError::Cancelled {
                    operation: "walk".to_string(),
                    context: ErrorContext::new("file_walker")
                        .with_operation("walk")
                        .with_metadata("root", &self.root.display().to_string()),
                }));
            }

            let item = match self.inner.next() {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Ok(entry)) => self.entry_item(entry),
                Some(Err(err)) => Some(WalkItem::Warning(self.warning_for(&err, None))),
            };

            if let Some(item) = item {
                return Some(Ok(item));
            }
        }
    }
}

fn error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Partial(errors) => errors.iter().find_map(error_path),
        ignore::Error::Loop { child, .. } => Some(child.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reposcope_core::AnalysisOptions;
    use std::fs;

    fn collect(root: &Path, options: &AnalysisOptions) -> Vec<WalkItem> {
        let policy = IgnorePolicy::from_options(options).unwrap();
        FileWalker::new(root, policy)
            .walk(CancellationSignal::new())
            .map(|item| item.unwrap())
            .collect()
    }

    fn file_paths(items: &[WalkItem]) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| match item {
                WalkItem::File(file) => Some(file.relative_path.clone()),
                WalkItem::Warning(_) => None,
            })
            .collect()
    }

    #[test]
    fn walks_files_with_sizes_and_prunes_deny_listed_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/lib")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();
        fs::write(dir.path().join("node_modules/lib/index.js"), "x").unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        fs::write(dir.path().join(".env.example"), "A=1\n").unwrap();

        let items = collect(dir.path(), &AnalysisOptions::new(10));
        assert_eq!(file_paths(&items), vec![".env.example", "src/main.rs"]);

        let main = items
            .iter()
            .find_map(|item| match item {
                WalkItem::File(file) if file.relative_path == "src/main.rs" => Some(file),
                _ => None,
            })
            .unwrap();
        assert_eq!(main.size_bytes, 13);
    }

    #[test]
    fn skips_git_file_of_a_worktree_checkout() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join(".git"), "gitdir: /nowhere\n").unwrap();
        fs::write(dir.path().join("sub/.git"), "gitdir: ../.git/modules/sub\n").unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("sub/b.py"), "y = 2\n").unwrap();

        let items = collect(dir.path(), &AnalysisOptions::new(10));
        assert_eq!(file_paths(&items), vec!["a.py", "sub/b.py"]);
    }

    #[test]
    fn honours_gitignore_and_extra_patterns() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("generated")).unwrap();
        fs::write(dir.path().join(".gitignore"), "generated/\n").unwrap();
        fs::write(dir.path().join("generated/out.rs"), "x").unwrap();
        fs::write(dir.path().join("app.min.js"), "x").unwrap();
        fs::write(dir.path().join("app.js"), "x").unwrap();

        let options =
            AnalysisOptions::new(10).with_ignore_patterns(vec!["*.min.js".to_string()]);
        let items = collect(dir.path(), &options);
        assert_eq!(file_paths(&items), vec![".gitignore", "app.js"]);
    }

    #[cfg(unix)]
    #[test]
    fn does_not_follow_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("real")).unwrap();
        fs::write(dir.path().join("real/a.py"), "x = 1\n").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("real/loop")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real/a.py"), dir.path().join("b.py"))
            .unwrap();

        let items = collect(dir.path(), &AnalysisOptions::new(10));
        assert_eq!(file_paths(&items), vec!["real/a.py"]);
    }

    #[test]
    fn cancelled_walk_yields_error_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let signal = CancellationSignal::new();
        signal.cancel();
        let policy = IgnorePolicy::from_options(&AnalysisOptions::new(10)).unwrap();
        let mut walk = FileWalker::new(dir.path(), policy).walk(signal);

        assert!(matches!(walk.next(), Some(Err(ReposcopeError::Cancelled { .. }))));
        assert!(walk.next().is_none());
    }
}
