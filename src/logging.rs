/// Structured logging for the ocean stress monitoring service
///
/// Every event carries a data-source tag and, where it applies, the sample
/// point id, so a failing upstream can be traced to one grid cell. Output goes
/// to stderr or is appended to a log file for daemon operation.

use std::fmt;
use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::model::SourceKind;

// ---------------------------------------------------------------------------
// Data Source Tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Marine,
    Weather,
    Current,
    Uv,
    Engine,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Marine => write!(f, "MARINE"),
            DataSource::Weather => write!(f, "WEATHER"),
            DataSource::Current => write!(f, "CURRENT"),
            DataSource::Uv => write!(f, "UV"),
            DataSource::Engine => write!(f, "ENGINE"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

impl From<SourceKind> for DataSource {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Waves => DataSource::Marine,
            SourceKind::Weather => DataSource::Weather,
            SourceKind::Currents => DataSource::Current,
            SourceKind::Uv => DataSource::Uv,
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - e.g. a land cell the marine model has no data for
    Expected,
    /// Unexpected failure - indicates service degradation or an API change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classify a point failure from its error text.
pub fn classify_failure(error_message: &str) -> FailureType {
    if error_message.contains("HTTP error") || error_message.contains("Transport error") {
        FailureType::Unexpected
    } else if error_message.contains("Parse error") {
        // Envelope changed shape: most likely an upstream API change
        FailureType::Unexpected
    } else if error_message.contains("Missing field") {
        FailureType::Expected
    } else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

/// Install the global subscriber.
///
/// `level` is an `EnvFilter` directive ("info", "oceanmon_service=debug"...);
/// `RUST_LOG` overrides it when set. Calling this twice is a no-op.
pub fn init_logger(level: &str, log_file: Option<&str>, console_timestamps: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Some(f),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path, e);
                None
            }
        }
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let result = match (file, console_timestamps) {
        (Some(f), true) => builder.with_ansi(false).with_writer(Mutex::new(f)).try_init(),
        (Some(f), false) => builder
            .with_ansi(false)
            .without_time()
            .with_writer(Mutex::new(f))
            .try_init(),
        (None, true) => builder.with_writer(std::io::stderr).try_init(),
        (None, false) => builder.without_time().with_writer(std::io::stderr).try_init(),
    };
    let _ = result;
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a point failure with automatic classification
pub fn log_point_failure(source: DataSource, point_id: &str, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_failure(&error_msg);
    let source = source.to_string();

    match failure_type {
        FailureType::Expected => {
            debug!(source = %source, point = point_id, "{} failed [{}]: {}", operation, failure_type, error_msg)
        }
        FailureType::Unexpected => {
            error!(source = %source, point = point_id, "{} failed [{}]: {}", operation, failure_type, error_msg)
        }
        FailureType::Unknown => {
            warn!(source = %source, point = point_id, "{} failed [{}]: {}", operation, failure_type, error_msg)
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle Summary Logging
// ---------------------------------------------------------------------------

/// Log how many of a source's points answered this cycle
pub fn log_cycle_summary(source: DataSource, total: usize, successful: usize) {
    let failed = total - successful.min(total);
    let source = source.to_string();
    let message = format!("Fetch complete: {}/{} points ok, {} failed", successful, total, failed);

    if failed == 0 {
        info!(source = %source, "{}", message);
    } else if successful == 0 {
        error!(source = %source, "{}", message);
    } else {
        warn!(source = %source, "{}", message);
    }
}
