//! Tracing setup for hosts embedding the engine
//!
//! The engine only emits `tracing` events; installing a subscriber is left to the caller.
//! [`init_logging`] is a ready-made one with the formats used during development.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level, overridden by `RUST_LOG` when set
    pub level: String,
    pub format: LogFormat,
    /// Source file and line of each event
    pub include_location: bool,
    pub include_thread: bool,
    /// Append to this file instead of writing to stderr
    pub log_file: Option<PathBuf>,
    /// Emit a close event with busy/idle time for every span, including the
    /// `structural_scan` and `history_mining` phases
    pub span_timings: bool,
    /// Extra directives such as `reposcope_repo::walker=trace`
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            include_thread: false,
            log_file: None,
            span_timings: false,
            filter_directives: Vec::new(),
        }
    }
}

impl LoggingConfig {
    /// Everything from both engine crates at debug, other targets at the base level
    pub fn verbose() -> Self {
        Self {
            format: LogFormat::Pretty,
            include_location: true,
            span_timings: true,
            filter_directives: vec![
                "reposcope_core=debug".to_string(),
                "reposcope_repo=debug".to_string(),
            ],
            ..Self::default()
        }
    }

    pub fn env_filter(&self) -> Result<EnvFilter, Box<dyn std::error::Error + Send + Sync>> {
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        for directive in &self.filter_directives {
            filter = filter.add_directive(directive.parse()?);
        }

        Ok(filter)
    }
}

fn format_layer<S, W>(
    config: &LoggingConfig,
    writer: W,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let span_events = if config.span_timings {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = fmt::layer()
        .with_writer(writer)
        .with_span_events(span_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread)
        .with_thread_names(config.include_thread);

    match config.format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

/// Install the global subscriber. Fails if the log file cannot be opened or a subscriber
/// is already installed.
pub fn init_logging(config: &LoggingConfig) -> InitResult {
    let registry = tracing_subscriber::registry().with(config.env_filter()?);

    match &config.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            registry
                .with(format_layer(config, std::sync::Mutex::new(file)))
                .try_init()?;
        }
        None => registry.with(format_layer(config, io::stderr)).try_init()?,
    }

    Ok(())
}

/// Phase timing
pub mod performance {
    use std::time::{Duration, Instant};
    use tracing::{info_span, Instrument};

    /// Phases slower than this are reported at info instead of debug
    pub const SLOW_PHASE: Duration = Duration::from_secs(5);

    fn report(phase: &str, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        if elapsed >= SLOW_PHASE {
            tracing::info!(target: "performance", phase, elapsed_ms, "Slow phase");
        } else {
            tracing::debug!(target: "performance", phase, elapsed_ms, "Phase finished");
        }
    }

    /// Run `future` inside a `phase` span and report how long it took
    pub async fn measure_async<F, T>(phase: &str, future: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let start = Instant::now();
        let result = future.instrument(info_span!("phase", phase)).await;
        report(phase, start.elapsed());
        result
    }

    /// Blocking counterpart of [`measure_async`], for work already on a blocking thread
    pub fn measure_sync<F, T>(phase: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let result = info_span!("phase", phase).in_scope(f);
        report(phase, start.elapsed());
        result
    }
}

/// `info` event marking the start of an engine operation, with optional extra fields
#[macro_export]
macro_rules! log_operation_start {
    ($operation:expr) => {
        tracing::info!(operation = $operation, "started")
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::info!(operation = $operation, $($field)*, "started")
    };
}

#[macro_export]
macro_rules! log_operation_success {
    ($operation:expr) => {
        tracing::info!(operation = $operation, "finished")
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::info!(operation = $operation, $($field)*, "finished")
    };
}

/// `error` event carrying the failure's display text as the `error` field
#[macro_export]
macro_rules! log_operation_error {
    ($operation:expr, $error:expr) => {
        tracing::error!(operation = $operation, error = %$error, "failed")
    };
    ($operation:expr, $error:expr, $($field:tt)*) => {
        tracing::error!(operation = $operation, error = %$error, $($field)*, "failed")
    };
}
