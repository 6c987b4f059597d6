//! File filtering utilities for repository walks

use glob::Pattern;
use reposcope_core::{config_error, AnalysisOptions, ReposcopeResult};
use std::path::Path;

/// Version-control metadata names. Worktrees and submodules have a `.git` file rather than
/// a directory, so these are skipped as files too.
pub const VCS_METADATA: &[&str] = &[".git", ".hg", ".svn", ".bzr"];

/// Ignore policy applied while walking: VCS ignore files, a fixed directory deny-list,
/// and caller-supplied glob patterns.
#[derive(Debug, Clone)]
pub struct IgnorePolicy {
    /// Whether to use .gitignore files (default true)
    pub use_gitignore: bool,
    excluded_dirs: Vec<String>,
    /// Compiled excluded-file and additional patterns
    compiled_patterns: Vec<Pattern>,
}

impl IgnorePolicy {
    pub fn new(
        use_gitignore: bool,
        excluded_dirs: Vec<String>,
        patterns: &[String],
    ) -> ReposcopeResult<Self> {
        let mut compiled_patterns = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            match Pattern::new(pattern) {
                Ok(compiled) => compiled_patterns.push(compiled),
                Err(e) => {
                    return Err(config_error!(
                        format!("Invalid glob pattern '{}': {}", pattern, e),
                        "ignore_policy",
                        e
                    ));
                }
            }
        }

        Ok(Self {
            use_gitignore,
            excluded_dirs,
            compiled_patterns,
        })
    }

    pub fn from_options(options: &AnalysisOptions) -> ReposcopeResult<Self> {
        let patterns: Vec<String> = options
            .excluded_files
            .iter()
            .chain(&options.ignore_patterns)
            .cloned()
            .collect();
        Self::new(options.use_gitignore, options.excluded_dirs.clone(), &patterns)
    }

    /// Check if a directory should be traversed
    pub fn should_traverse_directory(&self, relative_path: &Path) -> bool {
        let deny_listed = relative_path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| self.excluded_dirs.iter().any(|dir| dir == name))
            .unwrap_or(false);

        !deny_listed && !self.matches_patterns(relative_path)
    }

    /// Check if a file should be included in the analysis
    pub fn should_include_file(&self, relative_path: &Path) -> bool {
        let vcs_metadata = relative_path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| VCS_METADATA.contains(&name));

        !vcs_metadata && !self.matches_patterns(relative_path)
    }

    /// Patterns are tried against the full relative path and the bare file name, so both
    /// `docs/generated/*` and `*.min.js` work
    fn matches_patterns(&self, relative_path: &Path) -> bool {
        if self.compiled_patterns.is_empty() {
            return false;
        }

        let path_str = relative_path.to_string_lossy().replace('\\', "/");
        let filename = relative_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("");

        self.compiled_patterns
            .iter()
            .any(|pattern| pattern.matches(&path_str) || pattern.matches(filename))
    }
}
