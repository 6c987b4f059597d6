//! Error taxonomy
//!
//! The structural side of an
//! analysis never raises these for individual files; per-file problems become
//! [`FileWarning`](crate::types::FileWarning) records instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, warn};

pub type ReposcopeResult<T> = Result<T, ReposcopeError>;

/// Where and when an error was raised, plus hints for the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Random v4 id, logged alongside the error so reports can be correlated
    pub error_id: String,
    pub timestamp: DateTime<Utc>,
    /// Engine part that raised the error, e.g. `git_cli` or `walker`
    pub component: String,
    pub operation: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: BTreeMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Errors that abort an analysis, or one side of it
#[derive(Error, Debug)]
pub enum ReposcopeError {
    #[error("Not a git repository: {path}")]
    NotAGitRepository { path: String, context: ErrorContext },

    #[error("Git backend error: {message}")]
    GitBackend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation} exceeded {duration_ms}ms")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Operation cancelled: {operation}")]
    Cancelled {
        operation: String,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl ReposcopeError {
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ReposcopeError::NotAGitRepository { context, .. }
            | ReposcopeError::GitBackend { context, .. }
            | ReposcopeError::Timeout { context, .. }
            | ReposcopeError::Cancelled { context, .. }
            | ReposcopeError::NotFound { context, .. }
            | ReposcopeError::Config { context, .. }
            | ReposcopeError::Validation { context, .. }
            | ReposcopeError::Internal { context, .. } => Some(context),
            ReposcopeError::Io(_) | ReposcopeError::Serialization(_) => None,
        }
    }

    /// Errors that only abort the historical side of an analysis
    pub fn is_history_only(&self) -> bool {
        matches!(
            self,
            ReposcopeError::NotAGitRepository { .. } | ReposcopeError::GitBackend { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReposcopeError::Cancelled { .. })
    }

    /// Emit the error as a tracing event; history-side failures are warnings
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            ReposcopeError::NotAGitRepository { .. } | ReposcopeError::Cancelled { .. } => {
                warn!(error_id = ?error_id, error = %self, "Analysis side stopped");
            }
            ReposcopeError::Timeout { .. } | ReposcopeError::GitBackend { .. } => {
                warn!(
                    error_id = ?error_id,
                    error = %self,
                    "Backend or timeout error (structural results are kept)"
                );
            }
            ReposcopeError::Config { .. } | ReposcopeError::Validation { .. } => {
                error!(error_id = ?error_id, error = %self, "Configuration or validation error");
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Error occurred");
            }
        }
    }
}

#[macro_export]
macro_rules! git_backend_error {
    ($msg:expr, $component:expr) => {
        $crate::ReposcopeError::GitBackend {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::ReposcopeError::GitBackend {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Ensure git is installed and accessible"),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::ReposcopeError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your analysis options file"),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::ReposcopeError::Config {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your analysis options file"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::ReposcopeError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::ReposcopeError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Verify the repository path")
                .with_suggestion("Check if the directory exists and is accessible"),
        }
    };
}
