//! Async utilities and patterns
//!
//! Timeouts, bounded concurrency and cooperative cancellation

use crate::error::{ErrorContext, ReposcopeError, ReposcopeResult};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Fail with `Timeout` if `future` does not finish within `timeout_ms`
pub async fn with_timeout<F, T>(
    future: F,
    timeout_ms: u64,
    operation_name: &str,
) -> ReposcopeResult<T>
where
    F: std::future::Future<Output = T>,
{
    match timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => Ok(result),
        Err(_) => Err(ReposcopeError::Timeout {
            operation: operation_name.to_string(),
            duration_ms: timeout_ms,
            context: ErrorContext::new("async_utils")
                .with_operation("timeout")
                .with_metadata("timeout_ms", &timeout_ms.to_string())
                .with_suggestion("Increase timeout_ms in the analysis options"),
        }),
    }
}

/// Run a fallible future under an optional deadline
pub async fn with_optional_timeout<F, T>(
    future: F,
    timeout_ms: Option<u64>,
    operation_name: &str,
) -> ReposcopeResult<T>
where
    F: std::future::Future<Output = ReposcopeResult<T>>,
{
    match timeout_ms {
        Some(ms) => with_timeout(future, ms, operation_name).await?,
        None => future.await,
    }
}

/// Concurrent processing with controlled parallelism.
///
/// Results come back in completion order; callers that need determinism sort them.
pub async fn process_concurrently<T, R, F, Fut>(
    items: Vec<T>,
    max_concurrent: usize,
    processor: F,
) -> Vec<ReposcopeResult<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + Clone + 'static,
    Fut: std::future::Future<Output = ReposcopeResult<R>> + Send + 'static,
{
    use futures::stream::{self, StreamExt};

    stream::iter(items)
        .map(|item| {
            let processor = processor.clone();
            tokio::spawn(async move { processor(item).await })
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .map(|join_result| match join_result {
            Ok(result) => result,
            Err(join_error) => Err(ReposcopeError::Internal {
                message: format!("Task join error: {}", join_error),
                source: Some(Box::new(join_error)),
                context: ErrorContext::new("async_utils")
                    .with_operation("process_concurrently")
                    .with_suggestion("Check for panics in concurrent tasks"),
            }),
        })
        .collect()
}

/// Cloneable stop signal shared by the walk and the history miner
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationSignal {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Request early termination; idempotent
    pub fn cancel(&self) {
        debug!("Cancellation requested");
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as `self`, so `changed` cannot fail here
        while !*receiver.borrow_and_update() {
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Fail with `Cancelled` when a stop has been requested
    pub fn check(&self, operation: &str) -> ReposcopeResult<()> {
        if self.is_cancelled() {
            return Err(ReposcopeError::Cancelled {
                operation: operation.to_string(),
                context: ErrorContext::new("cancellation").with_operation(operation),
            });
        }
        Ok(())
    }
}
