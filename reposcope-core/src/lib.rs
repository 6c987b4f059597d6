//! Reposcope Core - Report model, error taxonomy and shared infrastructure
//!
//! This crate defines the data structures produced by a repository analysis along with
//! the configuration, logging and async plumbing shared by the engine.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod language;
pub mod logging;
pub mod traits;
pub mod types;

pub use async_utils::*;
pub use config::*;
pub use error::*;
pub use language::*;
pub use logging::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;
