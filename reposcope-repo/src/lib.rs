//! Reposcope Repository - Repository analysis engine
//!
//! Walks a working tree, classifies and counts every file, mines the git history and
//! merges both into one [`AnalysisReport`](reposcope_core::AnalysisReport).

pub mod aggregator;
pub mod analyzer;
pub mod classifier;
pub mod counter;
pub mod filter;
pub mod git_cli;
pub mod history;
pub mod scanner;
pub mod walker;

pub use aggregator::*;
pub use analyzer::*;
pub use classifier::*;
pub use counter::*;
pub use filter::*;
pub use git_cli::*;
pub use history::*;
pub use scanner::*;
pub use walker::*;
