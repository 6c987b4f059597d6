//! Analysis options

use crate::error::{ErrorContext, ReposcopeError, ReposcopeResult};
use crate::{config_error, validation_error};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// VCS metadata, dependency caches and build output; pruned before descent
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".bzr",
    "node_modules",
    "target",
    "build",
    "dist",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".pytest_cache",
    ".mypy_cache",
    "vendor",
];

/// Compiled artifacts that are never worth counting
pub const DEFAULT_EXCLUDED_FILES: &[&str] = &[
    "*.pyc", "*.pyo", "*.pyd", "*.so", "*.dll", "*.exe", "*.obj", "*.o", "*.class",
];

pub const DEFAULT_TOP_N_FILES: usize = 10;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

fn default_top_n_files() -> usize {
    DEFAULT_TOP_N_FILES
}

fn default_excluded_dirs() -> Vec<String> {
    DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect()
}

fn default_excluded_files() -> Vec<String> {
    DEFAULT_EXCLUDED_FILES.iter().map(|f| f.to_string()).collect()
}

fn default_use_gitignore() -> bool {
    true
}

fn default_max_file_size() -> Option<u64> {
    Some(DEFAULT_MAX_FILE_SIZE)
}

fn default_max_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Options bundle accepted by `analyze`.
///
/// `top_n_churn` has no default on purpose: the caller decides how many churn entries it
/// wants, and a TOML file without it is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Number of churn entries to keep (must be positive)
    pub top_n_churn: usize,
    /// Number of entries in the largest-files and most-code rankings
    #[serde(default = "default_top_n_files")]
    pub top_n_files: usize,
    /// Additional glob patterns beyond the VCS ignore rules
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Directory names pruned wherever they appear
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
    /// File globs skipped wherever they appear
    #[serde(default = "default_excluded_files")]
    pub excluded_files: Vec<String>,
    /// Whether `.gitignore` and friends are honoured
    #[serde(default = "default_use_gitignore")]
    pub use_gitignore: bool,
    /// Deadline for each side of the analysis, in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Files above this many bytes are counted but not line-scanned
    #[serde(default = "default_max_file_size")]
    pub max_file_size: Option<u64>,
    /// Worker pool size for file scanning
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl AnalysisOptions {
    pub fn new(top_n_churn: usize) -> Self {
        Self {
            top_n_churn,
            top_n_files: default_top_n_files(),
            ignore_patterns: Vec::new(),
            excluded_dirs: default_excluded_dirs(),
            excluded_files: default_excluded_files(),
            use_gitignore: default_use_gitignore(),
            timeout_ms: None,
            max_file_size: default_max_file_size(),
            max_concurrency: default_max_concurrency(),
        }
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: Option<u64>) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Load options from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ReposcopeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReposcopeError::Config {
            message: format!("Failed to read options file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the options file exists and is readable"),
        })?;

        let options: AnalysisOptions =
            toml::from_str(&content).map_err(|e| ReposcopeError::Config {
                message: format!("Failed to parse options: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config")
                    .with_operation("parse_toml")
                    .with_suggestion("Check TOML syntax in options file")
                    .with_suggestion("top_n_churn must always be set"),
            })?;

        options.validate()?;
        Ok(options)
    }

    /// Save options to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ReposcopeResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            config_error!(format!("Failed to serialize options: {}", e), "config", e)
        })?;

        std::fs::write(path, content).map_err(|e| ReposcopeError::Config {
            message: format!("Failed to write options file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> ReposcopeResult<()> {
        if self.top_n_churn == 0 {
            return Err(validation_error!(
                "top_n_churn must be a positive integer",
                "top_n_churn",
                "config"
            ));
        }

        if self.max_concurrency == 0 {
            return Err(validation_error!(
                "max_concurrency must be greater than 0",
                "max_concurrency",
                "config"
            ));
        }

        if self.timeout_ms == Some(0) {
            return Err(validation_error!(
                "timeout_ms must be greater than 0 when set",
                "timeout_ms",
                "config"
            ));
        }

        for pattern in self.ignore_patterns.iter().chain(&self.excluded_files) {
            if let Err(e) = glob::Pattern::new(pattern) {
                return Err(config_error!(
                    format!("Invalid glob pattern '{}': {}", pattern, e),
                    "config",
                    e
                ));
            }
        }

        Ok(())
    }
}
